//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each connection is
//! served on its own task; each request runs inside a span carrying its
//! request id. A client that disconnects drops the request future, which
//! cancels any catalog query still in flight.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::header::HeaderValue;
use hyper::{HeaderMap, Method, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::{CatalogDb, SqliteCatalog};
use crate::logging::{request_id_from_headers, REQUEST_ID_HEADERS};
use crate::routes;
use crate::services::DocumentTypesService;
use crate::types::GateError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Catalog database (readiness pings)
    pub db: Arc<CatalogDb>,
    pub service: DocumentTypesService,
    pub jwt: JwtValidator,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the listing service to the SQLite catalog
    pub fn new(args: Args, db: Arc<CatalogDb>) -> Result<Self, GateError> {
        let jwt = args.jwt_validator()?;
        let catalog = Arc::new(SqliteCatalog::new(Arc::clone(&db)));
        let service = DocumentTypesService::new(catalog.clone(), catalog);

        Ok(Self {
            args,
            db,
            service,
            jwt,
            started_at: Instant::now(),
        })
    }

    /// Replace the listing service (custom stores or observers)
    pub fn with_service(mut self, service: DocumentTypesService) -> Self {
        self.service = service;
        self
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GateError> {
    let listener = TcpListener::bind(state.args.listen).await?;
    serve(listener, state).await
}

/// Accept connections on an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), GateError> {
    info!("doctype-gate listening on {}", listener.local_addr()?);

    if state.args.dev_mode {
        warn!("Development mode enabled - dev JWT secret, permission policy disabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Correlation id for a request, generated and stored in the headers when absent
///
/// The request span and the route handler both read the id from the headers,
/// so they always log the same value.
pub fn ensure_request_id(headers: &mut HeaderMap) -> String {
    if let Some(id) = request_id_from_headers(headers) {
        return id.to_string();
    }
    let id = uuid::Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        headers.insert(REQUEST_ID_HEADERS[0], value);
    }
    id
}

/// Route incoming HTTP requests
pub async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let (mut parts, _body) = req.into_parts();
    let request_id = ensure_request_id(&mut parts.headers);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path()
    );

    async move {
        info!("[{}] {} {}", addr, parts.method, parts.uri.path());
        Ok(to_boxed(route(state, &parts.method, &parts.uri, &parts.headers).await))
    }
    .instrument(span)
    .await
}

/// Dispatch on method and path
pub async fn route(
    state: Arc<AppState>,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let path = uri.path();

    match (method, path) {
        // Liveness probe
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe - pings the catalog database
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state)).await
        }

        (&Method::GET, "/version") => routes::version_info(),

        (&Method::OPTIONS, _) => routes::preflight_response(),

        (&Method::GET, p) => match routes::match_document_types_route(p) {
            Some(project_id) => {
                routes::handle_document_types(state, project_id, uri.query(), headers).await
            }
            None => routes::not_found_response(p),
        },

        (_, p) => routes::not_found_response(p),
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{NoopObserver, RequestContext, LIST_DOCUMENT_TYPES_ENDPOINT};
    use clap::Parser;
    use hyper::StatusCode;

    fn state() -> Arc<AppState> {
        let args = Args::try_parse_from(["doctype-gate", "--jwt-secret", "test-secret"]).unwrap();
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());
        Arc::new(AppState::new(args, db).unwrap())
    }

    async fn send(method: Method, uri: &str) -> Response<Full<Bytes>> {
        let uri: Uri = uri.parse().unwrap();
        route(state(), &method, &uri, &HeaderMap::new()).await
    }

    #[tokio::test]
    async fn test_route_health_endpoints() {
        for path in ["/health", "/healthz", "/ready", "/readyz", "/version"] {
            let resp = send(Method::GET, path).await;
            assert_eq!(resp.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn test_route_preflight() {
        let resp = send(Method::OPTIONS, "/api/v1/projects/x/document-types").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_route_non_uuid_project_is_not_found() {
        let resp = send(Method::GET, "/api/v1/projects/abc/document-types").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_requires_authentication() {
        let uri = format!("/api/v1/projects/{}/document-types", uuid::Uuid::new_v4());
        let resp = send(Method::GET, &uri).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_blank_request_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static(" "));

        let id = ensure_request_id(&mut headers);
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        // The route handler sees the same id the span logged
        let ctx = RequestContext::from_headers(&headers, LIST_DOCUMENT_TYPES_ENDPOINT);
        assert_eq!(ctx.request_id, id);
        assert_eq!(ensure_request_id(&mut headers), id);
    }

    #[test]
    fn test_existing_request_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", HeaderValue::from_static(" corr-7 "));
        assert_eq!(ensure_request_id(&mut headers), "corr-7");
        assert!(headers.get("x-request-id").is_none());
    }

    #[tokio::test]
    async fn test_route_with_replaced_service() {
        let args = Args::try_parse_from(["doctype-gate", "--dev-mode"]).unwrap();
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());
        let catalog = Arc::new(SqliteCatalog::new(db.clone()));
        let service = DocumentTypesService::new(catalog.clone(), catalog)
            .with_observer(Arc::new(NoopObserver));
        let state = Arc::new(AppState::new(args, db).unwrap().with_service(service));

        let uri: Uri = format!("/api/v1/projects/{}/document-types", uuid::Uuid::new_v4())
            .parse()
            .unwrap();
        let resp = route(state, &Method::GET, &uri, &HeaderMap::new()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_route_wrong_method() {
        let uri = format!("/api/v1/projects/{}/document-types", uuid::Uuid::new_v4());
        let resp = send(Method::POST, &uri).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
