//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;

/// Configuration for the rdesk client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Broker address to connect to
    pub broker_address: String,

    /// Identity to log in as
    pub identity: Option<String>,

    /// How long a generated access key stays visible
    #[serde(with = "duration_secs")]
    pub access_key_display: Duration,

    /// Session audit log file
    pub audit_log_path: PathBuf,

    /// Local screen, used to map normalized pointer coordinates
    pub screen: ScreenGeometry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broker_address: "127.0.0.1:3001".to_string(),
            identity: None,
            access_key_display: Duration::from_secs(120),
            audit_log_path: super::default_config_dir().join("session_log.txt"),
            screen: ScreenGeometry::default(),
        }
    }
}

/// Pixel dimensions of the controlled screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl ScreenGeometry {
    /// Map normalized `[0, 1]` coordinates to pixel coordinates.
    ///
    /// Out-of-range input is clamped to the screen edges.
    pub fn to_pixels(&self, x: f64, y: f64) -> (u32, u32) {
        (scale(x, self.width), scale(y, self.height))
    }
}

fn scale(value: f64, extent: u32) -> u32 {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    (value * f64::from(extent)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.broker_address, "127.0.0.1:3001");
        assert_eq!(config.access_key_display, Duration::from_secs(120));
        assert!(config.audit_log_path.ends_with("session_log.txt"));
    }

    #[test]
    fn test_toml_overrides() {
        let text = r#"
            identity = "user2@institution.com"
            access_key_display = 30

            [screen]
            width = 2560
            height = 1440
        "#;
        let config: ClientConfig = toml::from_str(text).unwrap();
        assert_eq!(config.identity.as_deref(), Some("user2@institution.com"));
        assert_eq!(config.access_key_display, Duration::from_secs(30));
        assert_eq!(config.screen.width, 2560);
    }

    #[test]
    fn test_to_pixels() {
        let screen = ScreenGeometry::default();
        assert_eq!(screen.to_pixels(0.5, 0.5), (960, 540));
        assert_eq!(screen.to_pixels(0.0, 1.0), (0, 1080));
        assert_eq!(screen.to_pixels(0.3333, 0.25), (640, 270));
    }

    #[test]
    fn test_to_pixels_clamps() {
        let screen = ScreenGeometry {
            width: 100,
            height: 100,
        };
        assert_eq!(screen.to_pixels(-0.5, 1.5), (0, 100));
        assert_eq!(screen.to_pixels(f64::NAN, 0.5), (0, 50));
    }
}
