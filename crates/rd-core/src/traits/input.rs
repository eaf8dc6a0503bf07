//! Input injection trait

use rd_protocol::InputCommand;

use crate::error::InputError;

/// Executes remote-input commands on the local machine.
///
/// Only commands the gatekeeper allowed reach an executor.
pub trait InputExecutor: Send {
    /// Inject one command
    fn execute(&mut self, command: &InputCommand) -> Result<(), InputError>;
}

impl<E: InputExecutor + ?Sized> InputExecutor for Box<E> {
    fn execute(&mut self, command: &InputCommand) -> Result<(), InputError> {
        (**self).execute(command)
    }
}
