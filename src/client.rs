//! HTTP client with pluggable codecs and uniform error classification.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::{
        ClientConfig, ErrorBodyHandler, ErrorClassifier, ACCEPT_HEADER_VALUE, CONNECT_TIMEOUT,
        POOL_IDLE_TIMEOUT, TCP_KEEPALIVE,
    },
    curl,
    error::{BoxError, Diagnostics, TransportCause},
    metadata::{AfterCallback, ReceivedResponse, RequestSpec, SentRequest},
    ApiError, Codec, Error, RequestContext, Response, Result,
};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// An HTTP client that performs exactly one round trip per call.
///
/// The client is designed to be reused across multiple requests and shared
/// between tasks. It owns a connection pool and a configuration that is
/// frozen at construction.
///
/// # Examples
///
/// ```no_run
/// use wirecall::{Client, Response};
/// use std::time::Duration;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
///     email: String,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
///     email: String,
/// }
///
/// # async fn example() -> Result<(), wirecall::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .timeout(Duration::from_secs(30))
///     .request_id("request-id", "X-Request-Id")?
///     .build()?;
///
/// // GET request
/// let user: Response<User> = client.get("/users/123").await?;
/// println!("User: {}", user.data.name);
///
/// // POST request
/// let new_user = CreateUser {
///     name: "Alice".to_string(),
///     email: "alice@example.com".to_string(),
/// };
/// let created: Response<User> = client.post("/users", &new_user).await?;
/// println!("Created user with ID: {}", created.data.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
}

/// A completed round trip whose response was classified as a success.
struct Exchange {
    request: SentRequest,
    response: ReceivedResponse,
    decoder: Codec,
    started: Instant,
    latency: Duration,
    curl: Option<String>,
}

impl Exchange {
    fn diagnostics(&self) -> Option<Diagnostics> {
        diagnostics(&self.curl, self.started)
    }
}

fn diagnostics(curl: &Option<String>, started: Instant) -> Option<Diagnostics> {
    curl.as_ref().map(|curl| Diagnostics {
        curl: curl.clone(),
        elapsed: started.elapsed(),
    })
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wirecall::Client;
    ///
    /// # fn example() -> Result<(), wirecall::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://api.example.com")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Performs a call and decodes the response body into `Res`.
    ///
    /// The payload is encoded with the call's encoder (or the client default),
    /// the request is sent, and the response is classified. Error responses
    /// become [`Error::Application`]. Successful responses are shown to the
    /// request's after-callback, if any, and then decoded with the call's decoder
    /// (or the client default).
    ///
    /// # Type Parameters
    ///
    /// * `Req` - The payload type (must implement `Serialize`)
    /// * `Res` - The response body type (must implement `DeserializeOwned`)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wirecall::{Client, RequestContext, RequestSpec};
    /// use http::Method;
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize)]
    /// struct Request { query: String }
    ///
    /// #[derive(Deserialize)]
    /// struct ApiResponse { results: Vec<String> }
    ///
    /// # async fn example() -> Result<(), wirecall::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://api.example.com")
    ///     .build()?;
    ///
    /// let request = Request { query: "rust".to_string() };
    /// let spec = RequestSpec::new(Method::POST, "/search")
    ///     .with_context(RequestContext::background().with_value("request-id", "abc"))
    ///     .with_payload(&request)
    ///     .with_after_callback(|sent, received| {
    ///         println!("{} -> {}", sent.body_text(), received.body_text());
    ///     });
    ///
    /// let response = client.call::<_, ApiResponse>(spec).await?;
    /// println!("Found {} results", response.data.results.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<Req, Res>(&self, spec: RequestSpec<'_, Req>) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let (exchange, after_callback) = self.execute(spec).await?;

        if let Some(callback) = after_callback {
            callback(&exchange.request, &exchange.response);
        }

        let decoded = exchange.decoder.decode::<Res>(&exchange.response.body);
        match decoded {
            Ok(data) => {
                let ReceivedResponse {
                    status,
                    headers,
                    body,
                } = exchange.response;
                Ok(Response::new(data, body, status, headers, exchange.latency))
            }
            Err(source) => {
                tracing::error!(
                    error = %source,
                    status = exchange.response.status.as_u16(),
                    url = %exchange.request.url,
                    "Failed to decode response"
                );

                let diagnostics = exchange.diagnostics();
                Err(Error::Decode {
                    status: exchange.response.status,
                    source,
                    raw_response: exchange.response.body,
                    diagnostics,
                })
            }
        }
    }

    /// Performs a call without decoding the response body.
    ///
    /// Error classification still applies. The request's after-callback is
    /// not invoked.
    pub async fn call_raw<Req>(&self, spec: RequestSpec<'_, Req>) -> Result<Response<()>>
    where
        Req: Serialize + ?Sized,
    {
        let (exchange, _) = self.execute(spec).await?;
        let ReceivedResponse {
            status,
            headers,
            body,
        } = exchange.response;
        Ok(Response::new((), body, status, headers, exchange.latency))
    }

    /// Encodes, sends, and classifies one request.
    async fn execute<'a, Req>(
        &self,
        spec: RequestSpec<'a, Req>,
    ) -> Result<(Exchange, Option<AfterCallback<'a>>)>
    where
        Req: Serialize + ?Sized,
    {
        let config = &self.inner.config;
        let RequestSpec {
            context,
            method,
            path,
            headers,
            payload,
            query_params,
            encoder,
            decoder,
            after_callback,
        } = spec;

        let encoder = encoder.unwrap_or_else(|| config.encoder.clone());
        let decoder = decoder.unwrap_or_else(|| config.decoder.clone());

        let body = encoder
            .encode(payload)
            .map_err(|source| Error::Encode { source })?;

        let mut url = Url::parse(&format!("{}{}", config.base_url, path))?;
        if !query_params.is_empty() {
            let mut params: Vec<_> = query_params.iter().collect();
            params.sort();
            url.query_pairs_mut().extend_pairs(params);
        }

        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(ACCEPT_HEADER_VALUE),
        );
        if let Some((name, value)) = self.request_id_header(&context)? {
            request_headers.insert(name, value);
        }
        merge_headers(&mut request_headers, &config.default_headers);
        merge_headers(&mut request_headers, &headers);

        let sent_body = body.clone().unwrap_or_default();
        let curl = config
            .debug_mode
            .then(|| curl::render(&method, &url, &request_headers, &sent_body));

        tracing::debug!(method = %method, url = %url, "Executing HTTP request");
        if let Some(curl) = &curl {
            tracing::debug!(curl = %curl, "Request as curl");
        }

        let mut request = self
            .inner
            .http_client
            .request(method.clone(), url.clone())
            .headers(request_headers.clone());
        if let Some(body) = body {
            request = request.body(body);
        }

        let started = Instant::now();
        let round_trip = async move {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(ReceivedResponse {
                status,
                headers,
                body,
            })
        };

        let outcome = tokio::select! {
            biased;
            _ = context.cancelled() => Err(TransportCause::Cancelled),
            _ = context.deadline_elapsed() => Err(TransportCause::DeadlineExceeded),
            result = round_trip => result.map_err(TransportCause::Request),
        };

        let response = match outcome {
            Ok(response) => response,
            Err(cause) => {
                tracing::warn!(
                    error = %cause,
                    method = %method,
                    url = %url,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Request failed"
                );
                return Err(Error::Transport {
                    cause,
                    diagnostics: diagnostics(&curl, started),
                });
            }
        };
        let latency = started.elapsed();

        tracing::info!(
            status = response.status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if config.is_error(response.status, &response.headers) {
            let diagnostics = diagnostics(&curl, started);
            return Err(self.classified_error(decoder, response, diagnostics));
        }

        let exchange = Exchange {
            request: SentRequest {
                method,
                url,
                headers: request_headers,
                body: sent_body,
            },
            response,
            decoder,
            started,
            latency,
            curl,
        };
        Ok((exchange, after_callback))
    }

    /// Builds the error for a response the classifier rejected.
    fn classified_error(
        &self,
        decoder: Codec,
        response: ReceivedResponse,
        diagnostics: Option<Diagnostics>,
    ) -> Error {
        let status = response.status;
        let parsed = match &self.inner.config.error_body_handler {
            Some(handler) => handler.handle(status, &response.body),
            None => decoder
                .decode::<ApiError>(&response.body)
                .map_err(BoxError::from),
        };

        match parsed {
            Ok(error) => {
                if status.is_server_error() {
                    tracing::warn!(
                        status = status.as_u16(),
                        code = error.code,
                        message = %error.message,
                        "Server error"
                    );
                } else {
                    tracing::warn!(
                        status = status.as_u16(),
                        code = error.code,
                        message = %error.message,
                        "Request rejected"
                    );
                }
                Error::Application {
                    status,
                    error,
                    raw_response: response.body,
                    diagnostics,
                }
            }
            Err(source) => {
                tracing::error!(
                    status = status.as_u16(),
                    error = %source,
                    response = %String::from_utf8_lossy(&response.body),
                    "Failed to decode error response"
                );
                Error::ErrorBodyDecode {
                    status,
                    source,
                    raw_response: response.body,
                    diagnostics,
                }
            }
        }
    }

    fn request_id_header(
        &self,
        context: &RequestContext,
    ) -> Result<Option<(HeaderName, HeaderValue)>> {
        let config = &self.inner.config;
        let (Some(key), Some(name)) = (
            config.request_id_context_key.as_deref(),
            config.request_id_header_name.as_ref(),
        ) else {
            return Ok(None);
        };
        let Some(request_id) = context.value(key) else {
            return Ok(None);
        };

        let value = HeaderValue::try_from(request_id)
            .map_err(|e| Error::Configuration(format!("Invalid request id: {}", e)))?;
        Ok(Some((name.clone(), value)))
    }

    /// Performs a call described by its parts, with a caller-supplied context.
    ///
    /// ```no_run
    /// use wirecall::{Client, RequestContext};
    /// use http::{HeaderMap, Method};
    ///
    /// # async fn example(client: Client) -> Result<(), wirecall::Error> {
    /// let ctx = RequestContext::background().with_value("request-id", "req-123");
    /// let items: wirecall::Response<Vec<String>> = client
    ///     .do_request::<(), _>(ctx, Method::GET, "/items", HeaderMap::new(), None)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn do_request<Req, Res>(
        &self,
        context: RequestContext,
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
        payload: Option<&Req>,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let spec = RequestSpec::new(method, path)
            .with_context(context)
            .with_headers(headers);
        match payload {
            Some(payload) => self.call(spec.with_payload(payload)).await,
            None => self.call(spec).await,
        }
    }

    /// Makes a GET request to the specified path.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wirecall::Client;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct User { name: String }
    ///
    /// # async fn example() -> Result<(), wirecall::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://api.example.com")
    ///     .build()?;
    ///
    /// let user: wirecall::Response<User> = client.get("/users/123").await?;
    /// println!("User: {}", user.data.name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::GET, path)).await
    }

    /// Makes a POST request to the specified path with an encoded body.
    pub async fn post<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::POST, path).with_payload(body))
            .await
    }

    /// Makes a PUT request to the specified path with an encoded body.
    pub async fn put<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::PUT, path).with_payload(body))
            .await
    }

    /// Makes a PATCH request to the specified path with an encoded body.
    pub async fn patch<Req, Res>(
        &self,
        path: impl Into<String>,
        body: &Req,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::PATCH, path).with_payload(body))
            .await
    }

    /// Makes a DELETE request to the specified path.
    pub async fn delete<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::DELETE, path)).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Replaces every header named in `src`, keeping all of its values.
fn merge_headers(dst: &mut HeaderMap, src: &HeaderMap) {
    for name in src.keys() {
        dst.remove(name);
    }
    for (name, value) in src {
        dst.append(name.clone(), value.clone());
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use wirecall::{ApiError, BoxError, ClientBuilder, Codec};
/// use http::StatusCode;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), wirecall::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .codec(Codec::MsgPack)
///     .error_body_handler(|status: StatusCode, body: &[u8]| -> Result<ApiError, BoxError> {
///         Ok(ApiError::new(status.as_u16().into(), String::from_utf8_lossy(body)))
///     })
///     .debug_mode(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<String>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            config: ClientConfig::new(String::new()),
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// Request paths are appended to it verbatim, so it normally has no
    /// trailing slash.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.config.default_headers.insert(name, value);
        Ok(self)
    }

    /// Adds several default headers at once.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        merge_headers(&mut self.config.default_headers, &headers);
        self
    }

    /// Sets the total timeout for each call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Sets the maximum number of idle pooled connections per host.
    ///
    /// Zero falls back to the default of 100.
    pub fn max_idle_conns_per_host(mut self, max: usize) -> Self {
        self.config.max_idle_conns_per_host = if max == 0 {
            crate::config::DEFAULT_MAX_IDLE_CONNS_PER_HOST
        } else {
            max
        };
        self
    }

    /// Sets the default payload encoder.
    pub fn encoder(mut self, codec: Codec) -> Self {
        self.config.encoder = codec;
        self
    }

    /// Sets the default response decoder.
    pub fn decoder(mut self, codec: Codec) -> Self {
        self.config.decoder = codec;
        self
    }

    /// Sets both the default encoder and decoder.
    pub fn codec(self, codec: Codec) -> Self {
        self.encoder(codec.clone()).decoder(codec)
    }

    /// Replaces the default error classification.
    pub fn error_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.config.error_classifier = Some(Arc::new(classifier));
        self
    }

    /// Replaces decoding of error response bodies.
    pub fn error_body_handler(mut self, handler: impl ErrorBodyHandler + 'static) -> Self {
        self.config.error_body_handler = Some(Arc::new(handler));
        self
    }

    /// Forwards the context value stored under `context_key` as the
    /// `header_name` request header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name is invalid.
    pub fn request_id(
        mut self,
        context_key: impl Into<String>,
        header_name: impl AsRef<str>,
    ) -> Result<Self> {
        let name = HeaderName::try_from(header_name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        self.config.request_id_context_key = Some(context_key.into());
        self.config.request_id_header_name = Some(name);
        Ok(self)
    }

    /// Enables curl capture and timing in error reports.
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.debug_mode = enabled;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or if the transport
    /// cannot be initialized.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Configuration("Base URL is required".to_string()))?;
        let config = ClientConfig {
            base_url,
            ..self.config
        };

        let mut http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_idle_conns_per_host)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE);
        if let Some(timeout) = config.timeout {
            http_client = http_client.timeout(timeout);
        }
        let http_client = http_client.build().map_err(|e| {
            Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        tracing::debug!(config = ?config, "Built HTTP client");

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                config,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
