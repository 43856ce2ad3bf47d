//! Services layer
//!
//! Business logic that sits between the HTTP routes and the catalog stores.
//!
//! ## Services
//!
//! - **DocumentTypes**: project-scoped document type listing with claim-based
//!   access control

pub mod document_types;

pub use document_types::{
    DocumentTypeItem, DocumentTypesPayload, DocumentTypesService, ListingRequest, ListingResult,
    NormalizedListing, ServiceError, FORBIDDEN_MESSAGE, NOT_FOUND_MESSAGE,
};
