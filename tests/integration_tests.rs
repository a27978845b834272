//! Integration tests using wiremock to simulate HTTP servers.

use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wirecall::{
    ApiError, BodyCodec, BoxError, Client, Codec, Error, RequestContext, RequestSpec,
    TransportCause,
};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Payload {
    data: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

fn client_for(server: &MockServer) -> Client {
    Client::builder().base_url(server.uri()).build().unwrap()
}

#[tokio::test]
async fn test_post_with_after_callback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe"))
        .and(header("Header1", "Value-of-header1"))
        .and(header("Header2", "Value-of-header2"))
        .and(body_json(serde_json::json!({"data": "text1"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":"text2"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let payload = Payload {
        data: "text1".to_string(),
    };

    let mut observed = None;
    let spec = RequestSpec::new(Method::POST, "/qwe")
        .with_header("Header1", "Value-of-header1")
        .unwrap()
        .with_header("Header2", "Value-of-header2")
        .unwrap()
        .with_payload(&payload)
        .with_after_callback(|sent, received| {
            observed = Some((sent.body_text(), received.body_text(), received.status));
        });

    let response = client.call::<_, Payload>(spec).await.unwrap();

    assert_eq!(
        response.data,
        Payload {
            data: "text2".to_string()
        }
    );
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        observed,
        Some((
            r#"{"data":"text1"}"#.to_string(),
            r#"{"data":"text2"}"#.to_string(),
            StatusCode::OK
        ))
    );
}

#[tokio::test]
async fn test_msgpack_round_trip() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Request {
        data: String,
        tags: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Reply {
        data2: String,
        counts: BTreeMap<String, u64>,
    }

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe2"))
        .respond_with(|req: &wiremock::Request| {
            let request: Request = Codec::MsgPack.decode(&req.body).unwrap();
            let mut counts = BTreeMap::new();
            counts.insert(request.data, request.tags.len() as u64);
            let reply = Reply {
                data2: "text2".to_string(),
                counts,
            };
            let body = Codec::MsgPack.encode(Some(&reply)).unwrap().unwrap();
            ResponseTemplate::new(200).set_body_bytes(body.to_vec())
        })
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = Request {
        data: "text1".to_string(),
        tags: vec!["a".to_string(), "b".to_string()],
    };

    let response = client
        .call::<_, Reply>(
            RequestSpec::new(Method::POST, "/qwe2")
                .with_codec(Codec::MsgPack)
                .with_payload(&request),
        )
        .await
        .unwrap();

    assert_eq!(response.data.data2, "text2");
    assert_eq!(response.data.counts.get("text1"), Some(&2));

    // The Accept header stays JSON even with a binary codec.
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(
        received[0].headers.get("accept").unwrap(),
        "application/json; charset=utf-8"
    );
}

#[tokio::test]
async fn test_client_default_codec() {
    let mock_server = MockServer::start().await;

    let body = Codec::MsgPack
        .encode(Some(&TestData {
            id: 3,
            name: "bin".to_string(),
        }))
        .unwrap()
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .codec(Codec::MsgPack)
        .build()
        .unwrap();

    let response = client.get::<TestData>("/test").await.unwrap();
    assert_eq!(response.data.id, 3);
    assert_eq!(response.data.name, "bin");
}

#[tokio::test]
async fn test_msgpack_application_error() {
    let mock_server = MockServer::start().await;

    let plain = Codec::MsgPack
        .encode(Some(&ApiError::new(2, "222")))
        .unwrap()
        .unwrap();
    let with_meta = Codec::MsgPack
        .encode(Some(
            &ApiError::new(7, "quota").with_meta(serde_json::json!({"limit": 10})),
        ))
        .unwrap()
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(400).set_body_bytes(plain.to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(429).set_body_bytes(with_meta.to_vec()))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .codec(Codec::MsgPack)
        .build()
        .unwrap();

    let err = client.get::<TestData>("/plain").await.unwrap_err();
    match &err {
        Error::Application { status, error, .. } => {
            assert_eq!(*status, StatusCode::BAD_REQUEST);
            assert_eq!(error.code, 2);
            assert_eq!(error.message, "222");
            assert!(error.meta.is_none());
        }
        other => panic!("Expected Application error, got {:?}", other),
    }

    let err = client.get::<TestData>("/meta").await.unwrap_err();
    match &err {
        Error::Application { status, error, .. } => {
            assert_eq!(*status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(error.code, 7);
            assert_eq!(error.meta, Some(serde_json::json!({"limit": 10})));
        }
        other => panic!("Expected Application error, got {:?}", other),
    }
}

/// Plain-text `key=value` lines, one per top-level field.
struct KeyValueCodec;

impl BodyCodec for KeyValueCodec {
    fn name(&self) -> &'static str {
        "key-value"
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, BoxError> {
        let fields = value.as_object().ok_or("expected an object")?;
        let lines: Vec<String> = fields
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{}={}", key, s),
                other => format!("{}={}", key, other),
            })
            .collect();
        Ok(lines.join("\n").into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, BoxError> {
        let text = std::str::from_utf8(bytes)?;
        let mut fields = serde_json::Map::new();
        for line in text.lines().filter(|line| !line.is_empty()) {
            let (key, raw) = line.split_once('=').ok_or("missing '='")?;
            let value = raw
                .parse::<u64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::from(raw));
            fields.insert(key.to_string(), value);
        }
        Ok(serde_json::Value::Object(fields))
    }
}

#[tokio::test]
async fn test_user_defined_codec() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kv"))
        .and(wiremock::matchers::body_string("data=text1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id=9\nname=kv"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kv-error"))
        .respond_with(ResponseTemplate::new(404).set_body_string("code=4\nmessage=missing"))
        .mount(&mock_server)
        .await;

    let codec = Codec::custom(KeyValueCodec);
    let client = client_for(&mock_server);

    let response = client
        .call::<_, TestData>(
            RequestSpec::new(Method::POST, "/kv")
                .with_codec(codec.clone())
                .with_payload(&Payload {
                    data: "text1".to_string(),
                }),
        )
        .await
        .unwrap();
    assert_eq!(
        response.data,
        TestData {
            id: 9,
            name: "kv".to_string()
        }
    );

    let client = Client::builder()
        .base_url(mock_server.uri())
        .codec(codec)
        .build()
        .unwrap();
    let err = client.get::<TestData>("/kv-error").await.unwrap_err();
    assert!(err.has_code(4), "got {:?}", err);
    assert_eq!(err.api_error().map(|e| e.message.as_str()), Some("missing"));
}

#[tokio::test]
async fn test_per_call_header_wins() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .and(header("H", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestData {
            id: 1,
            name: "Test".to_string(),
        }))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .default_header("H", "a")
        .unwrap()
        .default_header("X-Default", "kept")
        .unwrap()
        .build()
        .unwrap();

    let spec = RequestSpec::new(Method::GET, "/test")
        .with_header("H", "b")
        .unwrap();
    client.call::<_, TestData>(spec).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let values: Vec<_> = received[0].headers.get_all("h").iter().collect();
    assert_eq!(values, vec!["b"]);
    assert_eq!(received[0].headers.get("x-default").unwrap(), "kept");
}

#[tokio::test]
async fn test_request_id_propagation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .request_id("request-id", "X-Request-Id")
        .unwrap()
        .build()
        .unwrap();

    let with_id = RequestSpec::new(Method::GET, "/test")
        .with_context(RequestContext::background().with_value("request-id", "req-123"));
    client.call::<_, ()>(with_id).await.unwrap();

    let without_id = RequestSpec::new(Method::GET, "/test")
        .with_context(RequestContext::background().with_value("other", "value"));
    client.call::<_, ()>(without_id).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].headers.get("x-request-id").unwrap(), "req-123");
    assert!(received[1].headers.get("x-request-id").is_none());
}

#[tokio::test]
async fn test_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .and(query_param("page", "1"))
        .and(query_param("q", "a b&c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestData {
            id: 1,
            name: "Test".to_string(),
        }))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let spec = RequestSpec::new(Method::GET, "/test")
        .with_query_param("page", "1")
        .with_query_param("q", "a b&c");

    let response = client.call::<_, TestData>(spec).await.unwrap();
    assert_eq!(response.data.id, 1);
}

#[tokio::test]
async fn test_no_payload_sends_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .call_raw(RequestSpec::new(Method::POST, "/empty"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.raw_body.is_empty());

    let received = mock_server.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn test_application_error_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"code":2,"message":"222"}"#))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client
        .post::<_, serde_json::Value>("/qwe", &Payload {
            data: "x".to_string(),
        })
        .await;

    let err = result.unwrap_err();
    match &err {
        Error::Application { status, error, .. } => {
            assert_eq!(*status, StatusCode::BAD_REQUEST);
            assert_eq!(error.code, 2);
            assert_eq!(error.message, "222");
            assert_eq!(*error, ApiError::new(2, "any message"));
        }
        other => panic!("Expected Application error, got {:?}", other),
    }
    assert!(err.has_code(2));
    assert!(!err.has_code(3));
    assert!(err.diagnostics().is_none());
}

#[tokio::test]
async fn test_after_callback_skipped_on_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"code":1,"message":"boom"}"#))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let calls = AtomicUsize::new(0);
    let spec = RequestSpec::new(Method::GET, "/test").with_after_callback(|_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
    });

    let result = client.call::<_, serde_json::Value>(spec).await;
    assert!(matches!(result, Err(Error::Application { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_custom_error_body_handler() {
    #[derive(Debug, thiserror::Error)]
    #[error("some error")]
    struct SomeError;

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"code":2,"message":"222"}"#))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .error_body_handler(|_: StatusCode, _: &[u8]| -> Result<ApiError, BoxError> {
            Err(Box::new(SomeError))
        })
        .build()
        .unwrap();

    let result = client.call_raw(RequestSpec::new(Method::POST, "/qwe")).await;

    match result {
        Err(Error::ErrorBodyDecode { status, source, .. }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(source.downcast_ref::<SomeError>().is_some());
        }
        _ => panic!("Expected ErrorBodyDecode, got {:?}", result),
    }
}

#[tokio::test]
async fn test_error_body_handler_builds_application_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .error_body_handler(|status: StatusCode, body: &[u8]| -> Result<ApiError, BoxError> {
            Ok(ApiError::new(
                status.as_u16().into(),
                String::from_utf8_lossy(body),
            ))
        })
        .build()
        .unwrap();

    let err = client.get::<TestData>("/test").await.unwrap_err();
    assert!(err.has_code(503));
    assert_eq!(err.api_error().unwrap().message, "down for maintenance");
    assert_eq!(err.raw_response().unwrap().as_ref(), b"down for maintenance");
}

#[tokio::test]
async fn test_undecodable_error_body_is_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get::<TestData>("/notfound404").await;

    match result {
        Err(Error::ErrorBodyDecode {
            status,
            raw_response,
            ..
        }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(raw_response.as_ref(), b"Not found");
        }
        _ => panic!("Expected ErrorBodyDecode, got {:?}", result),
    }
}

#[tokio::test]
async fn test_custom_classifier_replaces_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"id":0,"name":""}"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flagged"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-app-error", "1")
                .set_body_string(r#"{"code":42,"message":"flagged"}"#),
        )
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .error_classifier(|status: StatusCode, headers: &HeaderMap| {
            status.is_server_error() || headers.contains_key("x-app-error")
        })
        .build()
        .unwrap();

    let missing = client.get::<TestData>("/missing").await.unwrap();
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let flagged = client.get::<TestData>("/flagged").await.unwrap_err();
    assert!(flagged.has_code(42));
    assert_eq!(flagged.status(), Some(StatusCode::OK));
}

#[tokio::test]
async fn test_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get::<TestData>("/test").await.unwrap_err();

    match &err {
        Error::Decode {
            raw_response,
            status,
            diagnostics,
            ..
        } => {
            assert_eq!(*status, StatusCode::OK);
            assert_eq!(raw_response.as_ref(), b"invalid json");
            assert!(diagnostics.is_none());
        }
        other => panic!("Expected Decode error, got {:?}", other),
    }

    // The cause chain ends at the serde_json error.
    let mut source = std::error::Error::source(&err);
    let mut root = None;
    while let Some(cause) = source {
        root = Some(cause);
        source = cause.source();
    }
    assert!(root
        .and_then(|cause| cause.downcast_ref::<serde_json::Error>())
        .is_some());
}

#[tokio::test]
async fn test_raw_call_skips_decoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let calls = AtomicUsize::new(0);
    let spec = RequestSpec::new(Method::GET, "/text").with_after_callback(|_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
    });

    let response = client.call_raw(spec).await.unwrap();
    assert_eq!(response.text(), "not json at all");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_context_cancellation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let result = client
        .call_raw(
            RequestSpec::new(Method::POST, "/qwe")
                .with_context(RequestContext::background().with_cancellation(token)),
        )
        .await;
    let elapsed = start.elapsed();

    let err = result.unwrap_err();
    assert!(
        matches!(
            err,
            Error::Transport {
                cause: TransportCause::Cancelled,
                ..
            }
        ),
        "got {:?}",
        err
    );
    assert!(err.is_cancelled());
    assert!(elapsed >= Duration::from_millis(90), "took {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(1), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_context_deadline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wait1s"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(1)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let start = Instant::now();
    let result = client
        .call_raw(
            RequestSpec::new(Method::GET, "/wait1s")
                .with_context(RequestContext::background().with_timeout(Duration::from_millis(1))),
        )
        .await;

    let err = result.unwrap_err();
    assert!(err.is_transport());
    assert!(err.is_timeout());
    assert!(start.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn test_client_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_secs(1))
        .build()
        .unwrap();

    let start = Instant::now();
    let err = client
        .call_raw(RequestSpec::new(Method::POST, "/qwe"))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(
        matches!(
            err,
            Error::Transport {
                cause: TransportCause::Request(_),
                ..
            }
        ),
        "got {:?}",
        err
    );
    assert!(err.is_timeout());
    assert!(elapsed >= Duration::from_millis(900), "took {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_debug_mode_diagnostics() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/qwe"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"code":7,"message":"boom"}"#))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .debug_mode(true)
        .build()
        .unwrap();

    let payload = Payload {
        data: "text1".to_string(),
    };
    let err = client
        .post::<_, serde_json::Value>("/qwe", &payload)
        .await
        .unwrap_err();

    assert!(err.has_code(7));
    let diagnostics = err.diagnostics().expect("debug mode captures diagnostics");
    assert!(diagnostics.curl.starts_with("curl -X 'POST' -d '{\"data\":\"text1\"}'"));
    assert!(diagnostics.curl.contains("-H 'accept: application/json; charset=utf-8'"));
    assert!(diagnostics
        .curl
        .ends_with(&format!("'{}/qwe'", mock_server.uri())));
    assert!(err.to_string().contains("request took"));
}

#[tokio::test]
async fn test_debug_mode_transport_failure() {
    // Bind and drop a listener to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = Client::builder()
        .base_url(format!("http://127.0.0.1:{}", port))
        .debug_mode(true)
        .build()
        .unwrap();

    let err = client.get::<TestData>("/nothing").await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_timeout());
    let diagnostics = err.diagnostics().unwrap();
    assert!(diagnostics.curl.contains("/nothing"));
}

#[tokio::test]
async fn test_do_request_with_context() {
    let mock_server = MockServer::start().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .and(header("x-request-id", "abc"))
        .and(header("x-extra", "1"))
        .respond_with(move |req: &wiremock::Request| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_bytes(req.body.clone())
        })
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .request_id("rid", "X-Request-Id")
        .unwrap()
        .build()
        .unwrap();

    let mut headers = HeaderMap::new();
    headers.insert("x-extra", "1".parse().unwrap());
    let item = TestData {
        id: 1,
        name: "echo".to_string(),
    };

    let response = client
        .do_request::<_, TestData>(
            RequestContext::background().with_value("rid", "abc"),
            Method::PUT,
            "/items/1",
            headers,
            Some(&item),
        )
        .await
        .unwrap();

    assert_eq!(response.data, item);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_http_methods() {
    let mock_server = MockServer::start().await;

    let response_data = TestData {
        id: 1,
        name: "Test".to_string(),
    };

    for verb in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
        Mock::given(method(verb))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_data))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server);

    client.get::<TestData>("/test").await.unwrap();
    client
        .post::<_, TestData>("/test", &response_data)
        .await
        .unwrap();
    client
        .put::<_, TestData>("/test", &response_data)
        .await
        .unwrap();
    client
        .patch::<_, TestData>("/test", &response_data)
        .await
        .unwrap();
    client.delete::<TestData>("/test").await.unwrap();
}
