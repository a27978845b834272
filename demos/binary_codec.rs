//! Example showing per-client and per-call codec selection.
//!
//! The payload is encoded with MessagePack locally, to show the size
//! difference against JSON, then sent with a per-call codec override.
//!
//! Run with: `cargo run --example binary_codec`

use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wirecall::{Client, Codec, RequestSpec};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Reading {
    sensor: String,
    samples: Vec<f64>,
    labels: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("wirecall=debug")
        .init();

    let mut labels = BTreeMap::new();
    labels.insert("site".to_string(), "north".to_string());
    let reading = Reading {
        sensor: "t-01".to_string(),
        samples: vec![20.5, 20.75, 21.0],
        labels,
    };

    for codec in [Codec::Json, Codec::MsgPack] {
        let body = codec.encode(Some(&reading))?.unwrap_or_default();
        println!("{} body: {} bytes", codec, body.len());

        let back: Reading = codec.decode(&body)?;
        assert_eq!(back, reading);
    }

    // httpbin echoes what it receives; only the status matters here.
    let client = Client::builder().base_url("https://httpbin.org").build()?;
    let response = client
        .call_raw(
            RequestSpec::new(Method::POST, "/anything")
                .with_encoder(Codec::MsgPack)
                .with_header("Content-Type", Codec::MsgPack.content_type())?
                .with_payload(&reading),
        )
        .await?;
    println!("Server answered {} in {:?}", response.status, response.latency);

    Ok(())
}
