//! Bearer token verification
//!
//! Tokens are HS256 JWTs. Verification yields a [`CallerIdentity`] whose
//! claims are every string or string-array claim of the token; other claim
//! types (numbers, objects) are not identity assertions and are dropped.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::identity::{CallerIdentity, ClaimValue};
use crate::types::GateError;

/// Secret used when the gateway runs in development mode without JWT_SECRET
pub const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// HS256 token validator
#[derive(Clone)]
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Create a validator; `audience` and `issuer` are enforced when set
    pub fn new(
        secret: &str,
        audience: Option<&str>,
        issuer: Option<&str>,
    ) -> Result<Self, GateError> {
        if secret.is_empty() {
            return Err(GateError::Config("JWT secret must not be empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validator for development mode
    pub fn new_dev() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(DEV_JWT_SECRET.as_bytes()),
            validation,
        }
    }

    /// Verify a token and convert its claims into an authenticated identity
    pub fn verify(&self, token: &str) -> Result<CallerIdentity, GateError> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| GateError::Auth(format!("Invalid token: {e}")))?;

        Ok(CallerIdentity::authenticated(claims_from_json(data.claims)))
    }

    /// Resolve the caller identity from an optional Authorization header.
    /// Missing or invalid credentials yield an anonymous identity.
    pub fn identify(&self, auth_header: Option<&str>) -> CallerIdentity {
        let Some(token) = extract_token_from_header(auth_header) else {
            return CallerIdentity::anonymous();
        };

        match self.verify(token) {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                CallerIdentity::anonymous()
            }
        }
    }
}

/// Keep string and string-array claims
fn claims_from_json(claims: Map<String, Value>) -> BTreeMap<String, ClaimValue> {
    claims
        .into_iter()
        .filter_map(|(name, value)| {
            let value = match value {
                Value::String(s) => ClaimValue::One(s),
                Value::Array(items) => ClaimValue::Many(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                ),
                _ => return None,
            };
            Some((name, value))
        })
        .collect()
}
