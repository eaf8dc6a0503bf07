//! Remote input handling
//!
//! - [`gatekeeper`]: decides whether a command may run
//! - [`pipeline`]: parse, evaluate, audit, execute
//! - [`keymap`]: controller-side translation of local key events
//! - [`dry_run`]: executor that only describes what it would inject

pub mod dry_run;
pub mod gatekeeper;
pub mod keymap;
pub mod pipeline;

pub use dry_run::DryRunExecutor;
pub use gatekeeper::{DenyRule, Gatekeeper, Verdict, DENYLIST};
pub use pipeline::{Disposition, InputPipeline};
