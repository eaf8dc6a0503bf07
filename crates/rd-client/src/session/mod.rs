//! Client side of a call

mod lifecycle;
mod plan;

pub use lifecycle::{Affordances, LifecycleEvent, SessionLifecycle, SessionState};
pub use plan::{plan_call, CallPlan};
