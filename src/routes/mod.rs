//! HTTP routes for the document type gateway

pub mod document_types;
pub mod health;
pub mod response;

pub use document_types::{handle_document_types, match_document_types_route};
pub use health::{health_check, readiness_check, version_info};
pub use response::{not_found_response, preflight_response};
