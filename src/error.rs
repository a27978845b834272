//! Error types for HTTP calls.
//!
//! Every failure of a call is reported as one [`Error`] value. The variant tells
//! which phase of the call failed (encoding, transport, classification,
//! decoding); the wrapped `source` chain carries the root cause. When the
//! client runs in debug mode, failures that happen after the request was built
//! also carry [`Diagnostics`]: the curl equivalent of the request and the time
//! spent on the round trip.

use crate::{codec::CodecError, ApiError};
use bytes::Bytes;
use http::StatusCode;
use std::time::Duration;

/// Boxed error type returned by custom error body handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Debug-mode context attached to failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    /// The outgoing request rendered as a curl command.
    pub curl: String,
    /// Time between dispatch and the failure being observed.
    pub elapsed: Duration,
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "request took {} microseconds; curl: {}",
            self.elapsed.as_micros(),
            self.curl
        )
    }
}

/// Why the transport failed to produce a response.
#[derive(thiserror::Error, Debug)]
pub enum TransportCause {
    /// Connection, DNS, TLS, or client-timeout failure reported by `reqwest`.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The call's cancellation token fired before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The call's context deadline passed before a response arrived.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// The main error type for HTTP calls.
///
/// # Examples
///
/// ```no_run
/// use wirecall::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().base_url("https://api.example.com").build()?;
///
/// match client.get::<serde_json::Value>("/endpoint").await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(Error::Application { status, error, .. }) => {
///         eprintln!("Server said {} (code {}): {}", status, error.code, error.message);
///     }
///     Err(e) if e.is_timeout() => eprintln!("Timed out: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request payload could not be encoded. No request was sent.
    #[error("request payload encoder: {source}")]
    Encode {
        /// The codec failure.
        #[source]
        source: CodecError,
    },

    /// The request could not be completed: connection failure, cancellation,
    /// or timeout.
    #[error("do http request: {cause}{}", diag_suffix(.diagnostics))]
    Transport {
        /// What went wrong.
        #[source]
        cause: TransportCause,
        /// Debug-mode context.
        diagnostics: Option<Diagnostics>,
    },

    /// The server answered with a response the classifier marked as an error.
    #[error("http status code={status}: {error}{}", diag_suffix(.diagnostics))]
    Application {
        /// The HTTP status code.
        status: StatusCode,
        /// The application error decoded from the body.
        #[source]
        error: ApiError,
        /// The raw error response body.
        raw_response: Bytes,
        /// Debug-mode context.
        diagnostics: Option<Diagnostics>,
    },

    /// The server answered with an error response whose body could not be
    /// turned into an [`ApiError`].
    #[error("http status code={status}: decode error body: {source}{}", diag_suffix(.diagnostics))]
    ErrorBodyDecode {
        /// The HTTP status code.
        status: StatusCode,
        /// The handler or decoder failure.
        #[source]
        source: BoxError,
        /// The raw error response body.
        raw_response: Bytes,
        /// Debug-mode context.
        diagnostics: Option<Diagnostics>,
    },

    /// A successful response body could not be decoded into the target type.
    #[error("decode response body (status {status}): {source}{}", diag_suffix(.diagnostics))]
    Decode {
        /// The HTTP status code.
        status: StatusCode,
        /// The codec failure.
        #[source]
        source: CodecError,
        /// The raw response body that failed to decode.
        raw_response: Bytes,
        /// Debug-mode context.
        diagnostics: Option<Diagnostics>,
    },

    /// Invalid configuration was provided, such as a bad header name.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The concatenation of base URL and path is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn diag_suffix(diagnostics: &Option<Diagnostics>) -> String {
    match diagnostics {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

impl Error {
    /// Returns the HTTP status code if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Application { status, .. }
            | Error::ErrorBodyDecode { status, .. }
            | Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if a response was received.
    pub fn raw_response(&self) -> Option<&Bytes> {
        match self {
            Error::Application { raw_response, .. }
            | Error::ErrorBodyDecode { raw_response, .. }
            | Error::Decode { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the application error for [`Error::Application`].
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Application { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns `true` if this is an application error carrying `code`.
    ///
    /// This is how callers compare application failures: two failures are of
    /// the same kind when their codes match.
    ///
    /// ```
    /// use wirecall::{ApiError, Error};
    /// use http::StatusCode;
    ///
    /// let err = Error::Application {
    ///     status: StatusCode::BAD_REQUEST,
    ///     error: ApiError::new(2, "222"),
    ///     raw_response: Default::default(),
    ///     diagnostics: None,
    /// };
    /// assert!(err.has_code(2));
    /// assert!(!err.has_code(3));
    /// ```
    pub fn has_code(&self, code: i64) -> bool {
        self.api_error().is_some_and(|e| e.has_code(code))
    }

    /// Returns the debug-mode diagnostics, if any were captured.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Error::Transport { diagnostics, .. }
            | Error::Application { diagnostics, .. }
            | Error::ErrorBodyDecode { diagnostics, .. }
            | Error::Decode { diagnostics, .. } => diagnostics.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` for transport failures of any kind.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Returns `true` if the call timed out, either through the client timeout
    /// or the context deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport {
                cause: TransportCause::DeadlineExceeded,
                ..
            } => true,
            Error::Transport {
                cause: TransportCause::Request(e),
                ..
            } => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the call was cancelled through its context.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Transport {
                cause: TransportCause::Cancelled,
                ..
            }
        )
    }
}

/// A specialized `Result` type for HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;
