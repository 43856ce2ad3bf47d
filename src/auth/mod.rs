//! Authentication and authorization
//!
//! Provides:
//! - Caller identity with named, possibly multi-valued claims
//! - Project access evaluation from project / organization claims
//! - JWT bearer token verification
//! - Endpoint permission policy

pub mod access;
pub mod identity;
pub mod jwt;
pub mod permissions;

pub use access::{evaluate, has_access, AccessDecision, ORG_CLAIM_ALIASES, PROJECT_CLAIM_ALIASES};
pub use identity::{CallerIdentity, ClaimValue};
pub use jwt::{extract_token_from_header, JwtValidator};
pub use permissions::{check_policy, has_permission, PolicyOutcome, DOCUMENT_READ_PERMISSION};
