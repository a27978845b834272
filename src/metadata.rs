//! Per-call request description and the exchange views handed to callbacks.

use crate::{Codec, RequestContext};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::collections::HashMap;
use url::Url;

/// Observer invoked with the sent request and the received response, before
/// the response body is decoded.
pub type AfterCallback<'a> = Box<dyn FnOnce(&SentRequest, &ReceivedResponse) + Send + 'a>;

/// Everything needed to perform a single HTTP call.
///
/// `P` is the payload type. A spec starts out without a payload
/// (`RequestSpec<'_, ()>`); [`with_payload`](Self::with_payload) attaches one
/// and changes the type parameter accordingly.
///
/// # Examples
///
/// ```
/// use wirecall::{Codec, RequestSpec};
/// use http::Method;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Search { query: String }
///
/// let search = Search { query: "rust".to_string() };
/// let spec = RequestSpec::new(Method::POST, "/search")
///     .with_header("X-Trace", "on")?
///     .with_query_param("page", "2")
///     .with_codec(Codec::MsgPack)
///     .with_payload(&search);
///
/// assert_eq!(spec.path, "/search");
/// assert_eq!(spec.query_params.get("page").map(String::as_str), Some("2"));
/// # Ok::<(), wirecall::Error>(())
/// ```
pub struct RequestSpec<'a, P: ?Sized = ()> {
    /// Cancellation, deadline, and request-scoped values for this call.
    pub context: RequestContext,

    /// The HTTP method.
    pub method: Method,

    /// The request path, appended verbatim to the client's base URL.
    pub path: String,

    /// Headers for this call. They override client default headers.
    pub headers: HeaderMap,

    /// The payload to encode as the request body.
    pub payload: Option<&'a P>,

    /// Query parameters appended to the URL.
    pub query_params: HashMap<String, String>,

    /// Encoder override for this call.
    pub encoder: Option<Codec>,

    /// Decoder override for this call.
    pub decoder: Option<Codec>,

    /// Observer run on the success path before the response is decoded.
    pub after_callback: Option<AfterCallback<'a>>,
}

impl<'a> RequestSpec<'a, ()> {
    /// Creates a spec with the given method and path and no payload.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            context: RequestContext::background(),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            payload: None,
            query_params: HashMap::new(),
            encoder: None,
            decoder: None,
            after_callback: None,
        }
    }
}

impl<'a, P: ?Sized> RequestSpec<'a, P> {
    /// Attaches a payload, replacing any previous one.
    pub fn with_payload<Q: ?Sized>(self, payload: &'a Q) -> RequestSpec<'a, Q> {
        RequestSpec {
            context: self.context,
            method: self.method,
            path: self.path,
            headers: self.headers,
            payload: Some(payload),
            query_params: self.query_params,
            encoder: self.encoder,
            decoder: self.decoder,
            after_callback: self.after_callback,
        }
    }

    /// Sets the call context.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds several headers at once.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Overrides the client's encoder for this call.
    pub fn with_encoder(mut self, codec: Codec) -> Self {
        self.encoder = Some(codec);
        self
    }

    /// Overrides the client's decoder for this call.
    pub fn with_decoder(mut self, codec: Codec) -> Self {
        self.decoder = Some(codec);
        self
    }

    /// Overrides both encoder and decoder for this call.
    pub fn with_codec(self, codec: Codec) -> Self {
        self.with_encoder(codec.clone()).with_decoder(codec)
    }

    /// Registers an observer for the request/response pair.
    ///
    /// The callback only runs when the response is classified as a success and
    /// is about to be decoded. It does not run for error responses or for
    /// [`Client::call_raw`](crate::Client::call_raw).
    pub fn with_after_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&SentRequest, &ReceivedResponse) + Send + 'a,
    {
        self.after_callback = Some(Box::new(callback));
        self
    }
}

impl<P: ?Sized> std::fmt::Debug for RequestSpec<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSpec")
            .field("context", &self.context)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("has_payload", &self.payload.is_some())
            .field("query_params", &self.query_params)
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .field("has_after_callback", &self.after_callback.is_some())
            .finish()
    }
}

/// The request as it was put on the wire.
#[derive(Debug, Clone)]
pub struct SentRequest {
    /// The HTTP method.
    pub method: Method,
    /// The full URL including the query string.
    pub url: Url,
    /// All headers that were sent.
    pub headers: HeaderMap,
    /// The encoded body. Empty when no payload was given.
    pub body: Bytes,
}

impl SentRequest {
    /// Returns the body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The response as it was received, before decoding.
#[derive(Debug, Clone)]
pub struct ReceivedResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The full response body.
    pub body: Bytes,
}

impl ReceivedResponse {
    /// Returns the body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
