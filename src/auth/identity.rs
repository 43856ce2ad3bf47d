//! Caller identity as seen by the access evaluator
//!
//! The identity is produced by the token layer (see [`crate::auth::jwt`]) and
//! never changes during a request. Claims are kept as plain strings; parsing
//! into identifiers happens in [`crate::auth::access`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A claim carrying one or many string values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    One(String),
    Many(Vec<String>),
}

impl ClaimValue {
    /// Iterate over every raw value of the claim
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            ClaimValue::One(value) => std::slice::from_ref(value),
            ClaimValue::Many(values) => values,
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::One(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::One(value)
    }
}

impl From<Vec<String>> for ClaimValue {
    fn from(values: Vec<String>) -> Self {
        ClaimValue::Many(values)
    }
}

/// Authenticated (or anonymous) caller with its named claims
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    authenticated: bool,
    claims: BTreeMap<String, ClaimValue>,
}

impl CallerIdentity {
    /// Identity for a caller that presented no valid credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity for a verified caller
    pub fn authenticated(claims: BTreeMap<String, ClaimValue>) -> Self {
        Self {
            authenticated: true,
            claims,
        }
    }

    /// Add a claim (builder style, mostly for tests and token decoding)
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Raw values of a claim; empty when the claim is absent.
    /// Claim names are matched exactly.
    pub fn claim_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims.get(name).into_iter().flat_map(ClaimValue::iter)
    }

    /// Caller subject (`sub` claim), used only for log context
    pub fn subject(&self) -> Option<&str> {
        self.claim_values("sub").next()
    }

    pub fn claims(&self) -> &BTreeMap<String, ClaimValue> {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_claims() {
        let identity = CallerIdentity::anonymous();
        assert!(!identity.is_authenticated());
        assert!(identity.claims().is_empty());
        assert_eq!(identity.subject(), None);
    }

    #[test]
    fn test_claim_values_single_and_many() {
        let identity = CallerIdentity::authenticated(BTreeMap::new())
            .with_claim("sub", "user-1")
            .with_claim("orgs", vec!["a".to_string(), "b".to_string()]);

        assert_eq!(identity.subject(), Some("user-1"));
        let orgs: Vec<&str> = identity.claim_values("orgs").collect();
        assert_eq!(orgs, vec!["a", "b"]);
        assert_eq!(identity.claim_values("missing").count(), 0);
    }

    #[test]
    fn test_claim_names_are_case_sensitive() {
        let identity = CallerIdentity::authenticated(BTreeMap::new()).with_claim("Projects", "x");
        assert_eq!(identity.claim_values("projects").count(), 0);
        assert_eq!(identity.claim_values("Projects").count(), 1);
    }

    #[test]
    fn test_claim_value_deserializes_untagged() {
        let one: ClaimValue = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(one, ClaimValue::One("abc".into()));
        let many: ClaimValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(many, ClaimValue::Many(vec!["a".into(), "b".into()]));
    }
}
