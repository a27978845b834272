//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Tell encode, transport, application and decode failures apart
//! - Compare application errors by code
//! - Read debug-mode diagnostics (curl equivalent and timing)
//! - Cancel a call through its context
//!
//! Run with: `cargo run --example error_handling`

use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wirecall::{ApiError, BoxError, Client, Error, RequestContext, RequestSpec};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("wirecall=info")
        .init();

    // jsonplaceholder answers 404 with `{}`, which is not an ApiError, so
    // build one from the status instead.
    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")
        .debug_mode(true)
        .error_body_handler(
            |status: http::StatusCode, body: &[u8]| -> Result<ApiError, BoxError> {
                Ok(ApiError::new(status.as_u16().into(), String::from_utf8_lossy(body)))
            },
        )
        .build()?;

    println!("=== Example 1: Application Errors ===");
    match client.get::<Post>("/posts/999999").await {
        Ok(response) => println!("Success: {:?}", response.data),
        Err(Error::Application {
            status,
            error,
            diagnostics,
            ..
        }) => {
            println!("Application error!");
            println!("  Status: {}", status);
            println!("  Code: {}", error.code);
            println!("  Same kind as 404: {}", error == ApiError::new(404, ""));
            if let Some(diagnostics) = diagnostics {
                println!("  Took: {:?}", diagnostics.elapsed);
                println!("  Reproduce with: {}", diagnostics.curl);
            }
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Decode Errors ===");
    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct WrongSchema {
        nonexistent_field: String,
    }

    match client.get::<WrongSchema>("/posts/1").await {
        Ok(_) => println!("Unexpected success"),
        Err(Error::Decode {
            raw_response,
            source,
            status,
            ..
        }) => {
            println!("Decode failed!");
            println!("  Status: {}", status);
            println!("  Codec error: {}", source);
            println!(
                "  Raw response (first 200 chars): {}",
                String::from_utf8_lossy(&raw_response)
                    .chars()
                    .take(200)
                    .collect::<String>()
            );
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 3: Transport Errors ===");
    let bad_client = Client::builder()
        .base_url("https://this-domain-does-not-exist-12345.com")
        .build()?;

    match bad_client.get::<serde_json::Value>("/").await {
        Ok(_) => println!("Unexpected success"),
        Err(e) if e.is_transport() => {
            println!("Transport error!");
            println!("  Error: {}", e);
            println!("  Is timeout: {}", e.is_timeout());
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 4: Cancellation ===");
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        canceller.cancel();
    });

    let spec = RequestSpec::new(http::Method::GET, "/posts")
        .with_context(RequestContext::background().with_cancellation(token));
    match client.call_raw(spec).await {
        Ok(response) => println!("Finished before cancellation: {}", response.status),
        Err(e) if e.is_cancelled() => println!("Cancelled: {}", e),
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}
