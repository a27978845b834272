//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create a client with basic configuration
//! - Make GET requests to fetch data
//! - Make POST requests with a request id and an after-callback
//! - Access response data and metadata
//!
//! Run with: `cargo run --example basic_call`

use http::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wirecall::{Client, Error, RequestContext, RequestSpec};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("wirecall=debug,basic_call=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")
        .timeout(Duration::from_secs(10))
        .request_id("request-id", "X-Request-Id")?
        .build()?;

    println!("=== GET Request Example ===");
    let response = client.get::<Post>("/posts/1").await?;

    println!("Post ID: {}", response.data.id);
    println!("Title: {}", response.data.title);
    println!("Body: {}", response.data.body);
    println!("Request latency: {:?}", response.latency);
    println!("Status code: {}", response.status);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let spec = RequestSpec::new(Method::POST, "/posts")
        .with_context(RequestContext::background().with_value("request-id", "demo-1"))
        .with_payload(&new_post)
        .with_after_callback(|sent, received| {
            println!("Sent {} bytes to {}", sent.body.len(), sent.url);
            println!("Received {} bytes ({})", received.body.len(), received.status);
        });
    let response = client.call::<_, Post>(spec).await?;

    println!("Created post ID: {}", response.data.id);
    println!("Title: {}", response.data.title);
    println!("Request latency: {:?}", response.latency);
    println!();

    println!("=== Accessing Response Metadata ===");
    println!("Raw response length: {} bytes", response.raw_body.len());
    println!("Content-Type: {:?}", response.header("content-type"));

    Ok(())
}
