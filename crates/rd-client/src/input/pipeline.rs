//! Inbound input pipeline
//!
//! Every command received over the input channel goes through here:
//! parse, evaluate against the gatekeeper, write the audit trail, then hand
//! allowed commands to the executor. Blocked commands are dropped without
//! any reply to the controller.

use rd_core::traits::InputExecutor;
use rd_protocol::{InputCommand, Modifier};

use super::gatekeeper::{DenyRule, Gatekeeper, Verdict};
use crate::audit::AuditLog;

/// What the pipeline did with one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forwarded to the executor
    Executed,
    /// Matched a denylist rule and was discarded
    Blocked(&'static DenyRule),
    /// Input is disabled (no active session)
    Ignored,
    /// Could not be parsed
    Malformed,
    /// Allowed, but the executor failed
    Failed,
}

/// Gatekeeper plus audit plus executor
pub struct InputPipeline<E: InputExecutor> {
    gatekeeper: Gatekeeper,
    executor: E,
    audit: AuditLog,
    enabled: bool,
}

impl<E: InputExecutor> InputPipeline<E> {
    /// Create a disabled pipeline
    pub fn new(executor: E, audit: AuditLog) -> Self {
        Self {
            gatekeeper: Gatekeeper::new(),
            executor,
            audit,
            enabled: false,
        }
    }

    /// Start accepting commands (session became active)
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop accepting commands (session ended)
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Audit log the pipeline writes to
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Borrow the executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Process one raw JSON message from the input channel
    pub fn process_raw(&mut self, raw: &str) -> Disposition {
        if !self.enabled {
            return Disposition::Ignored;
        }

        match InputCommand::from_json(raw) {
            Ok(command) => self.process(command),
            Err(e) => {
                tracing::warn!("Discarding malformed input command: {}", e);
                Disposition::Malformed
            }
        }
    }

    /// Process one parsed command
    pub fn process(&mut self, command: InputCommand) -> Disposition {
        if !self.enabled {
            tracing::debug!("Input disabled, ignoring {}", command.kind());
            return Disposition::Ignored;
        }

        if let Verdict::Block(rule) = self.gatekeeper.evaluate(&command) {
            self.audit.record(format_args!(
                "BLOCKED dangerous key combination: {} {} (rule {})",
                command.kind(),
                combination(&command),
                rule.description
            ));
            return Disposition::Blocked(rule);
        }

        self.audit_allowed(&command);

        match self.executor.execute(&command) {
            Ok(()) => Disposition::Executed,
            Err(e) => {
                tracing::warn!("Failed to execute {}: {}", command.kind(), e);
                Disposition::Failed
            }
        }
    }

    fn audit_allowed(&self, command: &InputCommand) {
        match command {
            InputCommand::PointerMove { x, y } => {
                self.audit
                    .trace(format_args!("Mouse move to ({:.2}, {:.2})", x, y));
            }
            InputCommand::PointerDown { .. } => {
                self.audit.record(pointer_line("Mouse down", command));
            }
            InputCommand::PointerUp { .. } => {
                self.audit.record(pointer_line("Mouse up", command));
            }
            InputCommand::KeyDown { key, modifiers } => {
                self.audit.record(format_args!(
                    "Key down: {} with modifiers: [{}]",
                    key,
                    join_modifiers(modifiers)
                ));
            }
            InputCommand::KeyUp { key, modifiers } => {
                self.audit.record(format_args!(
                    "Key up: {} with modifiers: [{}]",
                    key,
                    join_modifiers(modifiers)
                ));
            }
        }
    }
}

fn pointer_line(action: &str, command: &InputCommand) -> String {
    match command.position() {
        Some((x, y)) => format!("{} at ({:.2}, {:.2})", action, x, y),
        None => action.to_string(),
    }
}

/// Modifiers as sent followed by the key, e.g. `meta+l`
fn combination(command: &InputCommand) -> String {
    let Some((key, modifiers)) = command.key_event() else {
        return String::new();
    };

    let mut parts: Vec<&str> = modifiers.iter().map(|m| m.as_str()).collect();
    parts.push(key);
    parts.join("+")
}

fn join_modifiers(modifiers: &[Modifier]) -> String {
    modifiers
        .iter()
        .map(Modifier::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
