//! Executor that describes commands instead of injecting them

use rd_core::config::ScreenGeometry;
use rd_core::error::InputError;
use rd_core::traits::InputExecutor;
use rd_protocol::InputCommand;

/// Records what would have been injected, with pointer positions mapped to
/// screen pixels
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    screen: ScreenGeometry,
    executed: Vec<String>,
}

impl DryRunExecutor {
    pub fn new(screen: ScreenGeometry) -> Self {
        Self {
            screen,
            executed: Vec::new(),
        }
    }

    /// Descriptions of executed commands, oldest first
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Remove and return the recorded descriptions
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.executed)
    }

    fn describe(&self, command: &InputCommand) -> String {
        if let Some((key, modifiers)) = command.key_event() {
            let mods: Vec<&str> = modifiers.iter().map(|m| m.as_str()).collect();
            return format!("{} {} [{}]", command.kind(), key, mods.join(", "));
        }

        match command.position() {
            Some((x, y)) => {
                let (px, py) = self.screen.to_pixels(x, y);
                format!("{} {},{}", command.kind(), px, py)
            }
            None => command.kind().to_string(),
        }
    }
}

impl InputExecutor for DryRunExecutor {
    fn execute(&mut self, command: &InputCommand) -> Result<(), InputError> {
        let description = self.describe(command);
        tracing::debug!("dry run: {}", description);
        self.executed.push(description);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_protocol::Modifier;

    #[test]
    fn test_descriptions() {
        let mut exec = DryRunExecutor::new(ScreenGeometry {
            width: 1000,
            height: 500,
        });

        exec.execute(&InputCommand::PointerMove { x: 0.5, y: 0.5 }).unwrap();
        exec.execute(&InputCommand::PointerDown { x: None, y: None }).unwrap();
        exec.execute(&InputCommand::KeyDown {
            key: "a".to_string(),
            modifiers: vec![Modifier::Shift],
        })
        .unwrap();

        assert_eq!(
            exec.drain(),
            vec!["PointerMove 500,250", "PointerDown", "KeyDown a [shift]"]
        );
        assert!(exec.executed().is_empty());
    }
}
