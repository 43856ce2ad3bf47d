//! Document type listing pipeline
//!
//! resolve organization → evaluate access → query catalog → sanitize.
//! Not-found and forbidden are ordinary results; store failures propagate as
//! [`GateError`] and are never folded into those outcomes.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{self, CallerIdentity};
use crate::catalog::{
    clean, normalize_limit, normalize_search, CatalogEntry, CatalogFilter, CatalogStore,
    ProjectOrgLookup,
};
use crate::logging::{ListingObserver, RequestContext, TracingObserver};
use crate::types::{GateError, Result};

pub const NOT_FOUND_CODE: &str = "not_found";
pub const FORBIDDEN_CODE: &str = "forbidden";
pub const NOT_FOUND_MESSAGE: &str = "Project not found.";
pub const FORBIDDEN_MESSAGE: &str = "You don't have access to this project.";

/// One listing call as received from the transport
#[derive(Debug, Clone)]
pub struct ListingRequest {
    pub project_id: Uuid,
    pub identity: CallerIdentity,
    pub search: Option<String>,
    pub active_only: bool,
    pub limit: Option<i64>,
}

impl ListingRequest {
    pub fn new(project_id: Uuid, identity: CallerIdentity) -> Self {
        Self {
            project_id,
            identity,
            search: None,
            active_only: true,
            limit: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Trimmed search term and clamped limit
    pub fn normalize(&self) -> NormalizedListing {
        NormalizedListing {
            search: normalize_search(self.search.as_deref()),
            active_only: self.active_only,
            limit: normalize_limit(self.limit),
        }
    }
}

/// Request parameters after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedListing {
    pub search: Option<String>,
    pub active_only: bool,
    pub limit: u32,
}

/// Sanitized item as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTypeItem {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub order: i64,
}

impl From<CatalogEntry> for DocumentTypeItem {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            code: clean(Some(&entry.code)),
            name: clean(Some(&entry.name)),
            is_active: entry.is_active,
            order: entry.order,
        }
    }
}

/// Success payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTypesPayload {
    pub items: Vec<DocumentTypeItem>,
    pub total: u64,
}

/// Machine-readable rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    pub error: &'static str,
    pub message: &'static str,
}

/// Outcome of a listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingResult {
    Success(DocumentTypesPayload),
    NotFound(ServiceError),
    Forbidden(ServiceError),
}

impl ListingResult {
    fn not_found() -> Self {
        ListingResult::NotFound(ServiceError {
            error: NOT_FOUND_CODE,
            message: NOT_FOUND_MESSAGE,
        })
    }

    fn forbidden() -> Self {
        ListingResult::Forbidden(ServiceError {
            error: FORBIDDEN_CODE,
            message: FORBIDDEN_MESSAGE,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ListingResult::Success(_))
    }
}

/// Lists the document types visible to a caller for a project
#[derive(Clone)]
pub struct DocumentTypesService {
    projects: Arc<dyn ProjectOrgLookup>,
    catalog: Arc<dyn CatalogStore>,
    observer: Arc<dyn ListingObserver>,
}

impl DocumentTypesService {
    pub fn new(projects: Arc<dyn ProjectOrgLookup>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            projects,
            catalog,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ListingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run the listing pipeline for one request
    pub async fn list(&self, request: &ListingRequest, ctx: &RequestContext) -> Result<ListingResult> {
        let params = request.normalize();
        let project_id = request.project_id;

        let organization_id = match self.projects.org_for_project(project_id).await {
            Ok(Some(org)) => org,
            Ok(None) => {
                self.observer.project_not_found(ctx, project_id);
                return Ok(ListingResult::not_found());
            }
            Err(e) => return Err(self.report_failure(ctx, project_id, e)),
        };

        if !auth::has_access(Some(&request.identity), project_id, Some(organization_id)) {
            self.observer.access_denied(ctx, project_id);
            return Ok(ListingResult::forbidden());
        }

        let filter = CatalogFilter {
            project_id,
            organization_id,
            search: params.search,
            active_only: params.active_only,
            limit: params.limit,
        };

        let page = match self.catalog.query(&filter).await {
            Ok(page) => page,
            Err(e) => return Err(self.report_failure(ctx, project_id, e)),
        };

        let items: Vec<DocumentTypeItem> =
            page.items.into_iter().map(DocumentTypeItem::from).collect();

        self.observer.listed(ctx, project_id, items.len(), page.total);

        Ok(ListingResult::Success(DocumentTypesPayload {
            items,
            total: page.total,
        }))
    }

    fn report_failure(&self, ctx: &RequestContext, project_id: Uuid, error: GateError) -> GateError {
        self.observer
            .retrieval_failed(ctx, project_id, &error.to_string());
        error
    }
}
