//! Document type listing route
//!
//! ## Routes
//!
//! - `GET /api/v1/projects/{projectId}/document-types` - document types the
//!   caller may use in a project
//!
//! ## Query parameters
//!
//! - `q` - case- and accent-insensitive substring of code or name
//! - `activeOnly` - `true` (default) or `false`
//! - `limit` - page size, default 100, clamped to 500
//!
//! Authentication and the permission policy are checked before the project
//! is looked up.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, AUTHORIZATION};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::response::{error_response, json_response, REQUEST_ID_HEADER};
use crate::auth::{check_policy, PolicyOutcome};
use crate::logging::{RequestContext, LIST_DOCUMENT_TYPES_ENDPOINT};
use crate::server::AppState;
use crate::services::{ListingRequest, ListingResult};

const ROUTE_PREFIX: &str = "/api/v1/projects/";
const ROUTE_SUFFIX: &str = "/document-types";

/// Match `/api/v1/projects/{projectId}/document-types`; the id must be a UUID
pub fn match_document_types_route(path: &str) -> Option<Uuid> {
    let rest = path.strip_prefix(ROUTE_PREFIX)?;
    let raw_id = rest
        .strip_suffix(ROUTE_SUFFIX)
        .or_else(|| rest.strip_suffix("/document-types/"))?;
    if raw_id.contains('/') {
        return None;
    }
    Uuid::parse_str(raw_id).ok()
}

/// Raw query string values before validation
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParams {
    q: Option<String>,
    active_only: Option<String>,
    limit: Option<String>,
}

/// Validated query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingParams {
    pub search: Option<String>,
    pub active_only: bool,
    pub limit: Option<i64>,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            search: None,
            active_only: true,
            limit: None,
        }
    }
}

/// Parse the query string. Unknown keys are ignored.
pub fn parse_listing_params(query: Option<&str>) -> Result<ListingParams, String> {
    let raw: RawParams = match query {
        Some(q) if !q.is_empty() => {
            serde_urlencoded::from_str(q).map_err(|e| format!("Malformed query string: {e}"))?
        }
        _ => RawParams::default(),
    };

    let active_only = match raw.active_only.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => true,
        Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => false,
        Some(value) => return Err(format!("activeOnly must be true or false, got '{value}'")),
    };

    let limit = match raw.limit.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(
            value
                .parse::<i64>()
                .map_err(|_| format!("limit must be an integer, got '{value}'"))?,
        ),
    };

    Ok(ListingParams {
        search: raw.q,
        active_only,
        limit,
    })
}

/// Handle GET /api/v1/projects/{projectId}/document-types
pub async fn handle_document_types(
    state: Arc<AppState>,
    project_id: Uuid,
    query: Option<&str>,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let ctx = RequestContext::from_headers(headers, LIST_DOCUMENT_TYPES_ENDPOINT);

    let params = match parse_listing_params(query) {
        Ok(params) => params,
        Err(message) => {
            debug!(request_id = %ctx.request_id, "Rejected listing parameters: {}", message);
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_parameter",
                &message,
                Some(ctx.request_id.as_str()),
            );
        }
    };

    let auth_header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    let identity = state.jwt.identify(auth_header);
    let ctx = ctx.with_user(identity.subject());

    match check_policy(&identity, state.args.required_permission()) {
        PolicyOutcome::Granted => {}
        PolicyOutcome::Unauthenticated => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required.",
                Some(ctx.request_id.as_str()),
            );
        }
        PolicyOutcome::MissingPermission => {
            debug!(
                request_id = %ctx.request_id,
                user_id = ctx.user_label(),
                "Caller lacks required permission"
            );
            return error_response(
                StatusCode::FORBIDDEN,
                "forbidden",
                "You don't have permission to list document types.",
                Some(ctx.request_id.as_str()),
            );
        }
    }

    let request = ListingRequest {
        project_id,
        identity,
        search: params.search,
        active_only: params.active_only,
        limit: params.limit,
    };

    match state.service.list(&request, &ctx).await {
        Ok(ListingResult::Success(payload)) => {
            let mut response = json_response(StatusCode::OK, &payload);
            if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        }
        Ok(ListingResult::NotFound(err)) => error_response(
            StatusCode::NOT_FOUND,
            err.error,
            err.message,
            Some(ctx.request_id.as_str()),
        ),
        Ok(ListingResult::Forbidden(err)) => error_response(
            StatusCode::FORBIDDEN,
            err.error,
            err.message,
            Some(ctx.request_id.as_str()),
        ),
        Err(e) => {
            error!(
                request_id = %ctx.request_id,
                %project_id,
                retrieval = e.is_retrieval_failure(),
                error = %e,
                "Document type listing failed"
            );
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An unexpected error occurred.",
                Some(ctx.request_id.as_str()),
            )
        }
    }
}
