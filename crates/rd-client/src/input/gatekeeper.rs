//! Dangerous key combination filter
//!
//! Key events whose modifier set and key exactly match a denylist entry are
//! blocked, on both the down and the up edge. `meta` counts as `command`.
//! Pointer events always pass.

use std::collections::BTreeSet;

use rd_protocol::{InputCommand, Modifier};

/// A blocked (modifier set, key) combination
#[derive(Debug, PartialEq, Eq)]
pub struct DenyRule {
    /// Required modifiers, already normalized
    pub modifiers: &'static [Modifier],
    /// Lowercase key symbol
    pub key: &'static str,
    /// Human-readable form used in the audit log
    pub description: &'static str,
}

impl DenyRule {
    fn matches(&self, modifiers: &BTreeSet<Modifier>, key: &str) -> bool {
        key.eq_ignore_ascii_case(self.key)
            && modifiers.len() == self.modifiers.len()
            && self.modifiers.iter().all(|m| modifiers.contains(m))
    }
}

/// Combinations that are never forwarded to the local machine
pub static DENYLIST: &[DenyRule] = &[
    DenyRule {
        modifiers: &[Modifier::Control, Modifier::Alt],
        key: "delete",
        description: "control+alt+delete",
    },
    DenyRule {
        modifiers: &[Modifier::Command],
        key: "l",
        description: "command+l",
    },
    DenyRule {
        modifiers: &[Modifier::Alt],
        key: "f4",
        description: "alt+f4",
    },
];

/// Gatekeeper decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block(&'static DenyRule),
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Block(_))
    }
}

/// Evaluates inbound commands against the denylist
#[derive(Debug, Clone, Copy)]
pub struct Gatekeeper {
    rules: &'static [DenyRule],
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Self { rules: DENYLIST }
    }
}

impl Gatekeeper {
    /// Gatekeeper over the built-in denylist
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `command` may be executed
    pub fn evaluate(&self, command: &InputCommand) -> Verdict {
        let Some((key, modifiers)) = command.key_event() else {
            return Verdict::Allow;
        };

        let normalized = normalize(modifiers);
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized, key))
            .map_or(Verdict::Allow, Verdict::Block)
    }
}

/// Collapse `meta` into `command` and drop duplicates
pub fn normalize(modifiers: &[Modifier]) -> BTreeSet<Modifier> {
    modifiers
        .iter()
        .map(|m| match m {
            Modifier::Meta => Modifier::Command,
            other => *other,
        })
        .collect()
}
