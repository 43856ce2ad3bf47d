//! Logging infrastructure
//!
//! Subscriber setup for the binary and the request-scoped listing observer.

pub mod observer;

pub use observer::{
    request_id_from_headers, ListingObserver, NoopObserver, RequestContext, TracingObserver,
    LIST_DOCUMENT_TYPES_ENDPOINT, REQUEST_ID_HEADERS,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `doctype_gate=<level>,info`.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("doctype_gate={},info", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
