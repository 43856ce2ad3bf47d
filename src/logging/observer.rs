//! Request-scoped listing events
//!
//! The orchestrator reports outcomes to an injected [`ListingObserver`]
//! together with an explicit [`RequestContext`]. Nothing here is ambient:
//! context travels with the call.

use hyper::HeaderMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Headers that may carry a caller-supplied request id, in priority order
pub const REQUEST_ID_HEADERS: &[&str] = &["x-request-id", "x-correlation-id"];

/// First non-blank value among [`REQUEST_ID_HEADERS`]
pub fn request_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    REQUEST_ID_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Endpoint label for document type listings
pub const LIST_DOCUMENT_TYPES_ENDPOINT: &str = "GET /document-types";

/// Correlation data attached to listing events
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    /// Caller subject, if known
    pub user_id: Option<String>,
    pub endpoint: &'static str,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, endpoint: &'static str) -> Self {
        Self {
            request_id: request_id.into(),
            user_id: None,
            endpoint,
        }
    }

    /// Context keyed by the request's correlation header, else a fresh id
    pub fn from_headers(headers: &HeaderMap, endpoint: &'static str) -> Self {
        match request_id_from_headers(headers) {
            Some(id) => Self::new(id, endpoint),
            None => Self::generated(endpoint),
        }
    }

    /// Context with a freshly generated request id
    pub fn generated(endpoint: &'static str) -> Self {
        Self::new(Uuid::new_v4().to_string(), endpoint)
    }

    pub fn with_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    /// Subject for log lines
    pub fn user_label(&self) -> &str {
        self.user_id.as_deref().unwrap_or("unknown")
    }
}

/// Receives the outcome of each listing request
pub trait ListingObserver: Send + Sync {
    fn project_not_found(&self, _ctx: &RequestContext, _project_id: Uuid) {}

    fn access_denied(&self, _ctx: &RequestContext, _project_id: Uuid) {}

    fn listed(&self, _ctx: &RequestContext, _project_id: Uuid, _returned: usize, _total: u64) {}

    fn retrieval_failed(&self, _ctx: &RequestContext, _project_id: Uuid, _error: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ListingObserver for NoopObserver {}

/// Observer that writes structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ListingObserver for TracingObserver {
    fn project_not_found(&self, ctx: &RequestContext, project_id: Uuid) {
        warn!(
            request_id = %ctx.request_id,
            endpoint = ctx.endpoint,
            user_id = ctx.user_label(),
            %project_id,
            "Project not found when listing document types"
        );
    }

    fn access_denied(&self, ctx: &RequestContext, project_id: Uuid) {
        warn!(
            request_id = %ctx.request_id,
            endpoint = ctx.endpoint,
            user_id = ctx.user_label(),
            %project_id,
            "User denied access to project"
        );
    }

    fn listed(&self, ctx: &RequestContext, project_id: Uuid, returned: usize, total: u64) {
        info!(
            request_id = %ctx.request_id,
            endpoint = ctx.endpoint,
            user_id = ctx.user_label(),
            %project_id,
            returned,
            total,
            "Returned document types"
        );
    }

    fn retrieval_failed(&self, ctx: &RequestContext, project_id: Uuid, error: &str) {
        warn!(
            request_id = %ctx.request_id,
            endpoint = ctx.endpoint,
            user_id = ctx.user_label(),
            %project_id,
            error,
            "Catalog retrieval failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_user_label() {
        let ctx = RequestContext::new("req-1", LIST_DOCUMENT_TYPES_ENDPOINT);
        assert_eq!(ctx.user_label(), "unknown");
        let ctx = ctx.with_user(Some("alice"));
        assert_eq!(ctx.user_label(), "alice");
    }

    #[test]
    fn test_request_id_header_priority() {
        use hyper::header::HeaderValue;

        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", HeaderValue::from_static("corr-1"));
        assert_eq!(request_id_from_headers(&headers), Some("corr-1"));

        headers.insert("x-request-id", HeaderValue::from_static("req-1"));
        assert_eq!(request_id_from_headers(&headers), Some("req-1"));

        // Blank values are skipped, not echoed
        headers.insert("x-request-id", HeaderValue::from_static("  "));
        assert_eq!(request_id_from_headers(&headers), Some("corr-1"));

        let ctx = RequestContext::from_headers(&HeaderMap::new(), LIST_DOCUMENT_TYPES_ENDPOINT);
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }

    #[test]
    fn test_noop_observer_accepts_events() {
        let observer: &dyn ListingObserver = &NoopObserver;
        let ctx = RequestContext::new("req-1", LIST_DOCUMENT_TYPES_ENDPOINT);
        observer.project_not_found(&ctx, Uuid::nil());
        observer.listed(&ctx, Uuid::nil(), 0, 0);
    }

    #[test]
    fn test_generated_request_id_is_uuid() {
        let ctx = RequestContext::generated(LIST_DOCUMENT_TYPES_ENDPOINT);
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }
}
