//! Call planning
//!
//! Checks a call request before anything is sent to the broker, so the UI
//! can ask for an access key up front instead of waiting for a rejection.

use rd_core::error::SessionError;
use rd_core::trust::TrustPolicy;
use rd_core::types::Identity;

/// A validated call request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPlan {
    pub target: Identity,
    pub access_key: Option<String>,
}

/// Validate a request from `local` to `target`.
///
/// Empty targets and calls to oneself are rejected. An untrusted target
/// without a key yields [`SessionError::AccessKeyRequired`]. A key supplied
/// for a trusted target is dropped since the broker ignores it.
pub fn plan_call(
    policy: &dyn TrustPolicy,
    local: &Identity,
    target: &str,
    access_key: Option<&str>,
) -> Result<CallPlan, SessionError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(SessionError::InvalidTarget("target is empty".to_string()));
    }
    if target == local.as_str() {
        return Err(SessionError::InvalidTarget("cannot call yourself".to_string()));
    }

    let target = Identity::new(target);
    let access_key = access_key.map(str::trim).filter(|k| !k.is_empty());

    if policy.is_trusted(local, &target) {
        return Ok(CallPlan {
            target,
            access_key: None,
        });
    }

    match access_key {
        Some(key) => Ok(CallPlan {
            target,
            access_key: Some(key.to_string()),
        }),
        None => Err(SessionError::AccessKeyRequired(target.to_string())),
    }
}
