//! Client configuration and policy hooks.
//!
//! A [`ClientConfig`] is assembled by [`ClientBuilder`](crate::ClientBuilder)
//! and frozen when the client is built. The two policy hooks,
//! [`ErrorClassifier`] and [`ErrorBodyHandler`], decide what counts as a failed
//! response and how its body becomes an [`ApiError`].

use crate::{error::BoxError, ApiError, Codec};
use http::{HeaderMap, HeaderName, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Value of the `Accept` header sent with every request.
///
/// The header is fixed and does not follow the configured codec.
pub const ACCEPT_HEADER_VALUE: &str = "application/json; charset=utf-8";

/// Default maximum number of idle pooled connections kept per host.
pub const DEFAULT_MAX_IDLE_CONNS_PER_HOST: usize = 100;

/// TCP connect timeout of the underlying transport.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP keep-alive interval of the underlying transport.
pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// How long an idle pooled connection is kept before being closed.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Decides whether a response represents a failure.
///
/// A configured classifier fully replaces [`DefaultClassifier`]. Closures of
/// the right shape implement this trait.
///
/// # Examples
///
/// ```
/// use wirecall::{ErrorClassifier, DefaultClassifier};
/// use http::{HeaderMap, StatusCode};
///
/// // Treat only 5xx as failures.
/// let only_server_errors = |status: StatusCode, _: &HeaderMap| status.is_server_error();
///
/// let headers = HeaderMap::new();
/// assert!(!only_server_errors.is_error(StatusCode::NOT_FOUND, &headers));
/// assert!(DefaultClassifier.is_error(StatusCode::NOT_FOUND, &headers));
/// ```
pub trait ErrorClassifier: Send + Sync {
    /// Returns `true` if the response should be reported as an error.
    fn is_error(&self, status: StatusCode, headers: &HeaderMap) -> bool;
}

impl<F> ErrorClassifier for F
where
    F: Fn(StatusCode, &HeaderMap) -> bool + Send + Sync,
{
    fn is_error(&self, status: StatusCode, headers: &HeaderMap) -> bool {
        self(status, headers)
    }
}

/// Reports a response as an error when its status is below 200 or at least 400.
///
/// Informational 1xx statuses therefore count as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl ErrorClassifier for DefaultClassifier {
    fn is_error(&self, status: StatusCode, _headers: &HeaderMap) -> bool {
        status.as_u16() < 200 || status.as_u16() >= 400
    }
}

/// Turns the body of an error response into an [`ApiError`].
///
/// Without a handler, the client decodes the body with the call's decoder.
/// Closures of the right shape implement this trait.
pub trait ErrorBodyHandler: Send + Sync {
    /// Builds the application error for an error response.
    ///
    /// # Errors
    ///
    /// Returning an error makes the call fail with
    /// [`Error::ErrorBodyDecode`](crate::Error::ErrorBodyDecode).
    fn handle(&self, status: StatusCode, body: &[u8]) -> Result<ApiError, BoxError>;
}

impl<F> ErrorBodyHandler for F
where
    F: Fn(StatusCode, &[u8]) -> Result<ApiError, BoxError> + Send + Sync,
{
    fn handle(&self, status: StatusCode, body: &[u8]) -> Result<ApiError, BoxError> {
        self(status, body)
    }
}

/// Settings and hooks shared by every call made through a client.
///
/// Immutable once the client is built.
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix for every request URL. Paths are appended verbatim.
    pub base_url: String,

    /// Headers sent with every request. Per-call headers override them.
    pub default_headers: HeaderMap,

    /// Total timeout for a call, from dispatch to the last body byte.
    pub timeout: Option<Duration>,

    /// Maximum idle pooled connections per host.
    pub max_idle_conns_per_host: usize,

    /// Default request payload encoder.
    pub encoder: Codec,

    /// Default response body decoder.
    pub decoder: Codec,

    /// Replaces [`DefaultClassifier`] when set.
    pub error_classifier: Option<Arc<dyn ErrorClassifier>>,

    /// Replaces decoding error bodies into [`ApiError`] when set.
    pub error_body_handler: Option<Arc<dyn ErrorBodyHandler>>,

    /// Context key whose value is forwarded as the request id header.
    pub request_id_context_key: Option<String>,

    /// Header that carries the request id.
    pub request_id_header_name: Option<HeaderName>,

    /// Capture curl equivalents and timings for error reports.
    pub debug_mode: bool,
}

impl ClientConfig {
    pub(crate) fn new(base_url: String) -> Self {
        Self {
            base_url,
            default_headers: HeaderMap::new(),
            timeout: None,
            max_idle_conns_per_host: DEFAULT_MAX_IDLE_CONNS_PER_HOST,
            encoder: Codec::Json,
            decoder: Codec::Json,
            error_classifier: None,
            error_body_handler: None,
            request_id_context_key: None,
            request_id_header_name: None,
            debug_mode: false,
        }
    }

    /// Applies the configured classifier, or [`DefaultClassifier`].
    pub fn is_error(&self, status: StatusCode, headers: &HeaderMap) -> bool {
        match &self.error_classifier {
            Some(classifier) => classifier.is_error(status, headers),
            None => DefaultClassifier.is_error(status, headers),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .field("max_idle_conns_per_host", &self.max_idle_conns_per_host)
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .field("error_classifier", &self.error_classifier.is_some())
            .field("error_body_handler", &self.error_body_handler.is_some())
            .field("request_id_context_key", &self.request_id_context_key)
            .field("request_id_header_name", &self.request_id_header_name)
            .field("debug_mode", &self.debug_mode)
            .finish()
    }
}
