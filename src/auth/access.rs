//! Project access evaluation from caller claims
//!
//! A caller may see a project's catalog when it carries the project id under
//! one of the project claim aliases, or the owning organization id under one
//! of the organization claim aliases. Claim values are delimiter-separated
//! lists; tokens that do not parse as UUIDs are discarded (permissive parse,
//! strict match).
//!
//! Everything here is pure: no I/O, no clock, no shared state.

use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::identity::CallerIdentity;

/// Claim names that carry authorized project ids
pub const PROJECT_CLAIM_ALIASES: &[&str] = &[
    "project_id",
    "project",
    "projects",
    "project_ids",
    "projectIds",
];

/// Claim names that carry authorized organization ids
pub const ORG_CLAIM_ALIASES: &[&str] = &[
    "org_id",
    "organisation_id",
    "organization_id",
    "org",
    "orgs",
    "org_ids",
    "organization",
    "organization_ids",
];

/// Separators accepted inside a single claim value
pub const CLAIM_DELIMITERS: &[char] = &[',', ';', ' '];

/// Outcome of parsing one claim token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimToken<'a> {
    Id(Uuid),
    Malformed(&'a str),
}

impl<'a> ClaimToken<'a> {
    pub fn parse(token: &'a str) -> Self {
        match Uuid::parse_str(token) {
            Ok(id) => ClaimToken::Id(id),
            Err(_) => ClaimToken::Malformed(token),
        }
    }

    pub fn id(self) -> Option<Uuid> {
        match self {
            ClaimToken::Id(id) => Some(id),
            ClaimToken::Malformed(_) => None,
        }
    }
}

/// Why access was granted or refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Project id found under a project claim alias
    ProjectGrant,
    /// Owning organization id found under an organization claim alias
    OrganizationGrant,
    Unauthenticated,
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        matches!(
            self,
            AccessDecision::ProjectGrant | AccessDecision::OrganizationGrant
        )
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::ProjectGrant => write!(f, "project_grant"),
            AccessDecision::OrganizationGrant => write!(f, "organization_grant"),
            AccessDecision::Unauthenticated => write!(f, "unauthenticated"),
            AccessDecision::Denied => write!(f, "denied"),
        }
    }
}

/// Split a raw claim value into non-empty, trimmed tokens
pub fn split_claim_value(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(CLAIM_DELIMITERS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Collect every identifier carried under any of `aliases`
pub fn collect_ids(identity: &CallerIdentity, aliases: &[&str]) -> HashSet<Uuid> {
    aliases
        .iter()
        .flat_map(|alias| identity.claim_values(alias))
        .flat_map(split_claim_value)
        .filter_map(|token| ClaimToken::parse(token).id())
        .collect()
}

/// Decide whether `identity` may read the catalog of `project_id`.
///
/// `organization_id` is `None` when the project lookup could not supply one;
/// in that case only a direct project grant can succeed.
pub fn evaluate(
    identity: Option<&CallerIdentity>,
    project_id: Uuid,
    organization_id: Option<Uuid>,
) -> AccessDecision {
    let identity = match identity {
        Some(identity) if identity.is_authenticated() => identity,
        _ => return AccessDecision::Unauthenticated,
    };

    if collect_ids(identity, PROJECT_CLAIM_ALIASES).contains(&project_id) {
        return AccessDecision::ProjectGrant;
    }

    let Some(organization_id) = organization_id else {
        return AccessDecision::Denied;
    };

    if collect_ids(identity, ORG_CLAIM_ALIASES).contains(&organization_id) {
        AccessDecision::OrganizationGrant
    } else {
        AccessDecision::Denied
    }
}

/// Boolean form of [`evaluate`]
pub fn has_access(
    identity: Option<&CallerIdentity>,
    project_id: Uuid,
    organization_id: Option<Uuid>,
) -> bool {
    evaluate(identity, project_id, organization_id).is_allowed()
}
