//! # wirecall - an HTTP client wrapper with pluggable codecs
//!
//! wirecall performs exactly one HTTP round trip per call on top of `reqwest`.
//! It encodes the payload with a swappable codec, injects default and
//! per-call headers, forwards a request id from the call context, classifies
//! the response, and decodes the result. Every failure comes back as one
//! [`Error`] that says which phase failed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wirecall::Client;
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wirecall::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")
//!         .timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     let user = client.get::<User>("/users/123").await?;
//!     println!("User: {}", user.data.name);
//!     println!("Request took {:?}", user.latency);
//!
//!     let new_user = CreateUser {
//!         name: "Alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!     };
//!     let created = client.post::<_, User>("/users", &new_user).await?;
//!     println!("Created user with ID: {}", created.data.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Pluggable codecs** - JSON, MessagePack or your own, per client or per call
//! - **Request ids** - a context value forwarded as a configurable header
//! - **Uniform errors** - encode, transport, application and decode failures in one type
//! - **Application error codes** - server errors decoded into [`ApiError`], compared by code
//! - **Cancellation and deadlines** - per call through [`RequestContext`], plus a client timeout
//! - **Debug mode** - failures carry the curl equivalent of the request and its timing
//! - **After-callback** - observe the exact bytes sent and received before decoding
//! - **Automatic logging** - structured logging with `tracing`
//!
//! ## Error Handling
//!
//! ```no_run
//! use wirecall::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://api.example.com").build()?;
//! match client.get::<serde_json::Value>("/endpoint").await {
//!     Ok(response) => {
//!         println!("Success: {:?}", response.data);
//!     }
//!     Err(Error::Application { status, error, .. }) => {
//!         eprintln!("HTTP {} with application code {}: {}", status, error.code, error);
//!     }
//!     Err(Error::Decode { raw_response, source, status, .. }) => {
//!         eprintln!("Failed to decode (status {}): {}", status, source);
//!         eprintln!("  Raw response: {:?}", raw_response);
//!     }
//!     Err(e) if e.is_transport() => {
//!         eprintln!("Transport failure: {}", e);
//!     }
//!     Err(e) => {
//!         eprintln!("Other error: {}", e);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod api_error;
mod client;
mod codec;
pub mod config;
mod context;
pub mod curl;
mod error;
pub mod metadata;
mod response;

pub use api_error::ApiError;
pub use client::{Client, ClientBuilder};
pub use codec::{BodyCodec, Codec, CodecError};
pub use config::{ClientConfig, DefaultClassifier, ErrorBodyHandler, ErrorClassifier};
pub use context::RequestContext;
pub use error::{BoxError, Diagnostics, Error, Result, TransportCause};
pub use metadata::{ReceivedResponse, RequestSpec, SentRequest};
pub use response::Response;
