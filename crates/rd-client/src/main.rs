//! rdesk client CLI
//!
//! Operator commands against a broker plus an offline run of the remote
//! input gatekeeper.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rd_client::access_key::AccessKeyDisplay;
use rd_client::input::{Disposition, DryRunExecutor, InputPipeline};
use rd_client::{AuditLog, BrokerClient};
use rd_core::config::{self, ClientConfig};

#[derive(Parser)]
#[command(name = "rd-client")]
#[command(author, version, about = "rdesk remote desktop client")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify credentials against the broker
    Login(Credentials),

    /// Generate a one-time access key for cross-domain callers
    AccessKey {
        #[command(flatten)]
        credentials: Credentials,

        /// Seconds to keep the key on screen (overrides config)
        #[arg(long)]
        display_secs: Option<u64>,
    },

    /// Run remote input commands from stdin through the gatekeeper
    Gate {
        /// Audit log file (overrides config)
        #[arg(long)]
        audit_log: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Credentials {
    /// Identity to log in as (overrides config)
    #[arg(short, long)]
    identity: Option<String>,

    /// Credential secret
    #[arg(long, env = "RDESK_SECRET", hide_env_values = true)]
    secret: String,

    /// Broker address (overrides config)
    #[arg(short, long)]
    broker: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Login(credentials) => {
            let (_, identity) = connect(&config, &credentials).await?;
            println!("Logged in as {}", identity);
        }

        Commands::AccessKey {
            credentials,
            display_secs,
        } => {
            let window = display_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or(config.access_key_display);
            access_key(&config, &credentials, window).await?;
        }

        Commands::Gate { audit_log } => {
            let path = audit_log.unwrap_or_else(|| config.audit_log_path.clone());
            gate(&config, &path).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    if let Some(path) = path {
        return config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = config::default_client_config_path();
    if default_path.exists() {
        Ok(config::load_config(&default_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
            ClientConfig::default()
        }))
    } else {
        Ok(ClientConfig::default())
    }
}

async fn connect(
    config: &ClientConfig,
    credentials: &Credentials,
) -> Result<(BrokerClient, rd_core::Identity)> {
    let identity = credentials
        .identity
        .clone()
        .or_else(|| config.identity.clone())
        .context("No identity given; pass --identity or set one in the config")?;
    let broker = credentials
        .broker
        .as_deref()
        .unwrap_or(&config.broker_address);

    let mut client = BrokerClient::connect(broker)
        .await
        .with_context(|| format!("Failed to connect to broker at {}", broker))?;
    let identity = client
        .login(&identity, &credentials.secret)
        .await
        .context("Login failed")?;

    Ok((client, identity))
}

async fn access_key(
    config: &ClientConfig,
    credentials: &Credentials,
    window: std::time::Duration,
) -> Result<()> {
    let (mut client, identity) = connect(config, credentials).await?;
    let key = client
        .generate_access_key()
        .await
        .context("Failed to generate access key")?;

    let mut display = AccessKeyDisplay::new(window);
    display.show(key);
    if let Some(key) = display.visible() {
        println!("Access key for {}: {}", identity, key);
        println!("Shown for {}s. It stays valid until used or replaced.", window.as_secs());
    }

    // The key lives as long as this login; keep the connection open
    tokio::select! {
        _ = tokio::time::sleep(window) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    display.clear();
    println!("Access key hidden");

    Ok(())
}

async fn gate(config: &ClientConfig, audit_path: &std::path::Path) -> Result<()> {
    let audit = AuditLog::open(audit_path)
        .with_context(|| format!("Failed to open audit log {:?}", audit_path))?;
    audit.record("--- Application Started ---");

    let mut pipeline = InputPipeline::new(DryRunExecutor::new(config.screen), audit.clone());
    pipeline.enable();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match pipeline.process_raw(line) {
            Disposition::Executed => {
                for description in pipeline.executor_mut().drain() {
                    println!("allow {}", description);
                }
            }
            Disposition::Blocked(rule) => println!("block {}", rule.description),
            Disposition::Malformed => println!("malformed"),
            Disposition::Failed => println!("failed"),
            Disposition::Ignored => println!("ignored"),
        }
    }

    audit.record("--- Application Closed ---");
    Ok(())
}
