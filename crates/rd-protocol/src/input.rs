//! Remote-input commands
//!
//! Sent by the controlling side over the peer transport's input channel,
//! one JSON object per message:
//!
//! ```json
//! {"type": "KeyDown", "key": "l", "modifiers": ["command"]}
//! {"type": "PointerMove", "x": 0.25, "y": 0.5}
//! ```
//!
//! Pointer coordinates are normalized to `[0, 1]` relative to the remote
//! view. The lowercase names used by early controllers (`mousemove`,
//! `keydown`, ...) are accepted as aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyboard modifier flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    #[serde(alias = "ctrl")]
    Control,
    Alt,
    Shift,
    Command,
    /// Platform meta key; equivalent to `Command` for filtering
    Meta,
}

impl Modifier {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Control => "control",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Command => "command",
            Modifier::Meta => "meta",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single remote-control command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputCommand {
    #[serde(alias = "mousemove")]
    PointerMove { x: f64, y: f64 },

    #[serde(alias = "mousedown")]
    PointerDown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },

    #[serde(alias = "mouseup")]
    PointerUp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },

    #[serde(alias = "keydown")]
    KeyDown {
        key: String,
        #[serde(default)]
        modifiers: Vec<Modifier>,
    },

    #[serde(alias = "keyup")]
    KeyUp {
        key: String,
        #[serde(default)]
        modifiers: Vec<Modifier>,
    },
}

impl InputCommand {
    /// Canonical type name
    pub fn kind(&self) -> &'static str {
        match self {
            InputCommand::PointerMove { .. } => "PointerMove",
            InputCommand::PointerDown { .. } => "PointerDown",
            InputCommand::PointerUp { .. } => "PointerUp",
            InputCommand::KeyDown { .. } => "KeyDown",
            InputCommand::KeyUp { .. } => "KeyUp",
        }
    }

    /// Key symbol and modifiers, for key events only
    pub fn key_event(&self) -> Option<(&str, &[Modifier])> {
        match self {
            InputCommand::KeyDown { key, modifiers } | InputCommand::KeyUp { key, modifiers } => {
                Some((key.as_str(), modifiers.as_slice()))
            }
            _ => None,
        }
    }

    /// Normalized coordinates, when the command carries them
    pub fn position(&self) -> Option<(f64, f64)> {
        match *self {
            InputCommand::PointerMove { x, y } => Some((x, y)),
            InputCommand::PointerDown {
                x: Some(x),
                y: Some(y),
            }
            | InputCommand::PointerUp {
                x: Some(x),
                y: Some(y),
            } => Some((x, y)),
            _ => None,
        }
    }

    /// Parse a command from a raw JSON message
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_parse() {
        let cmd =
            InputCommand::from_json(r#"{"type":"KeyDown","key":"delete","modifiers":["control","alt"]}"#)
                .unwrap();
        assert_eq!(
            cmd,
            InputCommand::KeyDown {
                key: "delete".to_string(),
                modifiers: vec![Modifier::Control, Modifier::Alt],
            }
        );
    }

    #[test]
    fn test_legacy_aliases() {
        let cmd = InputCommand::from_json(r#"{"type":"keyup","key":"a","modifiers":["meta"]}"#)
            .unwrap();
        assert_eq!(cmd.kind(), "KeyUp");
        assert_eq!(cmd.key_event(), Some(("a", &[Modifier::Meta][..])));

        let cmd = InputCommand::from_json(r#"{"type":"mousemove","x":0.5,"y":0.25}"#).unwrap();
        assert_eq!(cmd.position(), Some((0.5, 0.25)));
    }

    #[test]
    fn test_missing_modifiers_default_empty() {
        let cmd = InputCommand::from_json(r#"{"type":"KeyDown","key":"f4"}"#).unwrap();
        assert_eq!(cmd.key_event(), Some(("f4", &[][..])));
    }

    #[test]
    fn test_pointer_click_without_coordinates() {
        let cmd = InputCommand::from_json(r#"{"type":"PointerDown"}"#).unwrap();
        assert_eq!(cmd, InputCommand::PointerDown { x: None, y: None });
        assert_eq!(cmd.position(), None);
        assert_eq!(serde_json::to_string(&cmd).unwrap(), r#"{"type":"PointerDown"}"#);
    }

    #[test]
    fn test_unknown_modifier_rejected() {
        let result =
            InputCommand::from_json(r#"{"type":"KeyDown","key":"a","modifiers":["hyper"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_ctrl_alias() {
        let cmd =
            InputCommand::from_json(r#"{"type":"KeyDown","key":"c","modifiers":["ctrl"]}"#).unwrap();
        assert_eq!(cmd.key_event(), Some(("c", &[Modifier::Control][..])));
    }
}
