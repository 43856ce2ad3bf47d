//! doctype-gate - project-scoped document type catalog
//!
//! Lists the document types a caller may use inside a project. Access is
//! granted by a project claim naming the project, or by an organization
//! claim naming the project's owning organization.
//!
//! ## Modules
//!
//! - **auth**: caller identity, access evaluation, JWT verification, permission policy
//! - **catalog**: catalog model, store traits, search folding and display sanitizing
//! - **db**: SQLite project lookup and catalog queries
//! - **services**: the listing pipeline
//! - **routes** / **server**: HTTP transport

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GateError, Result};
