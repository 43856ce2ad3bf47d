//! Endpoint permission policy
//!
//! Listing document types requires the caller to hold a permission scope in
//! its `permissions` claim. This runs before any project lookup, so a caller
//! without the scope never learns whether a project exists.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::CallerIdentity;

/// Claim that carries permission scopes
pub const PERMISSIONS_CLAIM: &str = "permissions";

/// Scope required to read a project's document types
pub const DOCUMENT_READ_PERMISSION: &str = "proj:document:read";

/// Result of checking the endpoint policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyOutcome {
    Granted,
    /// No verified identity; the transport answers 401
    Unauthenticated,
    /// Verified identity without the scope; the transport answers 403
    MissingPermission,
}

impl fmt::Display for PolicyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyOutcome::Granted => write!(f, "granted"),
            PolicyOutcome::Unauthenticated => write!(f, "unauthenticated"),
            PolicyOutcome::MissingPermission => write!(f, "missing_permission"),
        }
    }
}

/// Whether `identity` carries `permission` (scope comparison ignores case)
pub fn has_permission(identity: &CallerIdentity, permission: &str) -> bool {
    identity
        .claim_values(PERMISSIONS_CLAIM)
        .flat_map(|raw| raw.split([' ', ',', ';']))
        .filter(|scope| !scope.is_empty())
        .any(|scope| scope.eq_ignore_ascii_case(permission))
}

/// Check the endpoint policy. `None` disables the scope requirement but still
/// demands an authenticated caller.
pub fn check_policy(identity: &CallerIdentity, required: Option<&str>) -> PolicyOutcome {
    if !identity.is_authenticated() {
        return PolicyOutcome::Unauthenticated;
    }

    match required {
        Some(permission) if !has_permission(identity, permission) => {
            PolicyOutcome::MissingPermission
        }
        _ => PolicyOutcome::Granted,
    }
}
