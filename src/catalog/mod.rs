//! Document type catalog model and read interfaces
//!
//! The catalog is read-only from the gateway's point of view. Two interfaces
//! are consumed:
//!
//! - [`ProjectOrgLookup`] resolves a project to its owning organization and is
//!   the single source of truth for project existence.
//! - [`CatalogStore`] returns a filtered, ordered, capped page of entries plus
//!   the uncapped match count. It trusts the organization id it is given.

pub mod sanitize;
pub mod search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Result;

pub use sanitize::{clean, MAX_DISPLAY_CHARS};
pub use search::{fold, folded_contains};

/// Default page size when the caller gives none (or a non-positive one)
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest page size a caller may request
pub const MAX_LIMIT: u32 = 500;

/// Scope value that marks an entry as project-visible
pub const PROJECT_SCOPE: &str = "project";

/// Clamp a raw limit: absent or non-positive becomes [`DEFAULT_LIMIT`], then
/// the value is bounded to `1..=MAX_LIMIT`.
pub fn normalize_limit(raw: Option<i64>) -> u32 {
    let limit = match raw {
        Some(value) if value > 0 => value,
        _ => i64::from(DEFAULT_LIMIT),
    };
    // Bounded to 1..=500 so the cast cannot truncate
    limit.clamp(1, i64::from(MAX_LIMIT)) as u32
}

/// Trim a raw search term; blank becomes `None`
pub fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
}

/// A document type as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    /// Effective display order; entries without one report 0
    pub order: i64,
}

/// Normalized query parameters for one catalog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    /// Already trimmed; `None` disables the search predicate
    pub search: Option<String>,
    pub active_only: bool,
    pub limit: u32,
}

impl CatalogFilter {
    pub fn new(project_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            project_id,
            organization_id,
            search: None,
            active_only: true,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = normalize_search(search);
        self
    }

    pub fn with_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }
}

/// One page of catalog entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogEntry>,
    /// Count of all entries passing the filter, ignoring the limit
    pub total: u64,
}

/// Project → owning organization lookup
#[async_trait]
pub trait ProjectOrgLookup: Send + Sync {
    /// `Ok(None)` means the project does not exist
    async fn org_for_project(&self, project_id: Uuid) -> Result<Option<Uuid>>;
}

/// Filtered catalog reads
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn query(&self, filter: &CatalogFilter) -> Result<CatalogPage>;
}
