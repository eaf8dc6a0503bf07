//! Controller-side key and pointer translation
//!
//! Turns local UI key names and pointer positions into [`InputCommand`]s for
//! the remote side. Named keys map to the gatekeeper's vocabulary; any other
//! key is sent lowercased.

use rd_protocol::{InputCommand, Modifier};

const NAMED_KEYS: &[(&str, &str)] = &[
    ("ArrowUp", "up"),
    ("ArrowDown", "down"),
    ("ArrowLeft", "left"),
    ("ArrowRight", "right"),
    ("Enter", "enter"),
    ("Backspace", "backspace"),
    ("Tab", "tab"),
    ("Escape", "escape"),
    ("Shift", "shift"),
    ("Control", "control"),
    ("Alt", "alt"),
    ("Meta", "command"),
    (" ", "space"),
];

/// Translate a UI key name to the symbol sent over the wire
pub fn translate_key(name: &str) -> String {
    NAMED_KEYS
        .iter()
        .find(|(ui, _)| *ui == name)
        .map(|(_, wire)| (*wire).to_string())
        .unwrap_or_else(|| name.to_lowercase())
}

/// Modifier keys held during a key event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierFlags {
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ModifierFlags {
    /// Modifier list in wire order
    pub fn to_modifiers(self) -> Vec<Modifier> {
        let mut modifiers = Vec::with_capacity(4);
        if self.control {
            modifiers.push(Modifier::Control);
        }
        if self.shift {
            modifiers.push(Modifier::Shift);
        }
        if self.alt {
            modifiers.push(Modifier::Alt);
        }
        if self.meta {
            modifiers.push(Modifier::Command);
        }
        modifiers
    }
}

pub fn key_down(name: &str, flags: ModifierFlags) -> InputCommand {
    InputCommand::KeyDown {
        key: translate_key(name),
        modifiers: flags.to_modifiers(),
    }
}

pub fn key_up(name: &str, flags: ModifierFlags) -> InputCommand {
    InputCommand::KeyUp {
        key: translate_key(name),
        modifiers: flags.to_modifiers(),
    }
}

/// Normalize a position inside a view of `width` x `height` to `[0, 1]`.
///
/// Returns `None` for an empty view.
pub fn normalize_pointer(offset_x: f64, offset_y: f64, width: f64, height: f64) -> Option<(f64, f64)> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((
        (offset_x / width).clamp(0.0, 1.0),
        (offset_y / height).clamp(0.0, 1.0),
    ))
}

/// Pointer move command for a position inside the view
pub fn pointer_move(offset_x: f64, offset_y: f64, width: f64, height: f64) -> Option<InputCommand> {
    normalize_pointer(offset_x, offset_y, width, height).map(|(x, y)| InputCommand::PointerMove { x, y })
}
