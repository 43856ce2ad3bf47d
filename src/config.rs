//! Configuration for the document type gateway
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::{JwtValidator, DOCUMENT_READ_PERMISSION};
use crate::types::GateError;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// doctype-gate - project-scoped document type catalog
#[derive(Parser, Debug, Clone)]
#[command(name = "doctype-gate")]
#[command(about = "Lists the document types a caller may use in a project")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// SQLite catalog database (created if missing)
    #[arg(long, env = "DATABASE_PATH", default_value = "document-types.db")]
    pub database_path: PathBuf,

    /// HS256 secret for bearer tokens (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Expected `aud` claim; not checked when unset
    #[arg(long, env = "JWT_AUDIENCE")]
    pub jwt_audience: Option<String>,

    /// Expected `iss` claim; not checked when unset
    #[arg(long, env = "JWT_ISSUER")]
    pub jwt_issuer: Option<String>,

    /// Permission scope required to list document types
    #[arg(long, env = "REQUIRED_PERMISSION", default_value = DOCUMENT_READ_PERMISSION)]
    pub required_permission: String,

    /// Enable development mode (dev JWT secret, no permission scope check)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Args {
    /// Build the token validator (dev secret when in dev mode without JWT_SECRET)
    pub fn jwt_validator(&self) -> Result<JwtValidator, GateError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(
                secret,
                self.jwt_audience.as_deref(),
                self.jwt_issuer.as_deref(),
            ),
            (None, true) => Ok(JwtValidator::new_dev()),
            (None, false) => Err(GateError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Scope enforced on the listing endpoint; dev mode and a blank value disable it
    pub fn required_permission(&self) -> Option<&str> {
        let permission = self.required_permission.trim();
        if self.dev_mode || permission.is_empty() {
            None
        } else {
            Some(permission)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(secret) if secret.trim().is_empty() => {
                    return Err("JWT_SECRET must not be empty".to_string())
                }
                Some(_) => {}
            }
        }

        if self.database_path.as_os_str().is_empty() {
            return Err("DATABASE_PATH must not be empty".to_string());
        }

        Ok(())
    }
}
