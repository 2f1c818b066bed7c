//! End-to-end tests driving the HTTP router

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use retrieval_gateway::backend::MemoryBackend;
use retrieval_gateway::ingestion::TextChunker;
use retrieval_gateway::providers::HashEmbedder;
use retrieval_gateway::types::{DeleteMode, ResolvedQuery};
use retrieval_gateway::{Backend, Document, Error, Gateway, GatewayConfig, GatewayServer, QueryResult};

const TOKEN: &str = "test-token";
const BOUNDARY: &str = "gateway-test-boundary";

fn config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.bearer_token = Some(TOKEN.to_string());
    config
}

fn router() -> Router {
    let backend = Arc::new(MemoryBackend::new(
        Arc::new(HashEmbedder::new(128)),
        TextChunker::default(),
    ));
    GatewayServer::new(config(), Gateway::new(backend)).router()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn multipart_request(filename: &str, content: &str, metadata: Option<&str>) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n"
    );
    if let Some(metadata) = metadata {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{metadata}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(Method::POST)
        .uri("/upsert-file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_does_not_require_token() {
    let router = router();
    let response = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_or_wrong_token_is_unauthorized() {
    let router = router();
    let body = json!({"queries": [{"query": "hello"}]});

    let (status, json) = send(&router, json_request(Method::POST, "/query", None, body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["detail"], "Invalid or missing token");

    let (status, _) = send(
        &router,
        json_request(Method::POST, "/query", Some("nope"), body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        json_request(Method::DELETE, "/delete", None, json!({"delete_all": true})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upsert_then_query_returns_the_document() {
    let router = router();

    let (status, json) = send(
        &router,
        json_request(
            Method::POST,
            "/upsert",
            Some(TOKEN),
            json!({"documents": [{"id": "doc1", "text": "hello world"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"ids": ["doc1"]}));

    for path in ["/query", "/sub/query"] {
        let (status, json) = send(
            &router,
            json_request(
                Method::POST,
                path,
                Some(TOKEN),
                json!({"queries": [{"query": "hello world", "top_k": 1}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let result = &json["results"][0];
        assert_eq!(result["query"], "hello world");
        assert_eq!(result["results"].as_array().unwrap().len(), 1);
        assert_eq!(result["results"][0]["id"], "doc1_0");
        assert_eq!(result["results"][0]["text"], "hello world");
        assert_eq!(result["results"][0]["metadata"]["document_id"], "doc1");
        assert!(result["results"][0].get("embedding").is_none());
    }
}

#[tokio::test]
async fn upsert_without_id_generates_one_then_query_finds_it() {
    let router = router();

    let (status, json) = send(
        &router,
        json_request(
            Method::POST,
            "/upsert",
            Some(TOKEN),
            json!({"documents": [{"text": "hello world", "metadata": {"source": "file"}}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids = json["ids"].as_array().unwrap();
    assert_eq!(ids.len(), 1);
    let id = ids[0].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let (status, json) = send(
        &router,
        json_request(
            Method::POST,
            "/query",
            Some(TOKEN),
            json!({"queries": [{"query": "hello", "top_k": 1}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let hits = json["results"][0]["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0]["text"].as_str().unwrap().contains("hello world"));
    assert_eq!(hits[0]["metadata"]["document_id"], id);
    assert_eq!(hits[0]["metadata"]["source"], "file");
}

#[tokio::test]
async fn invalid_document_is_bad_request() {
    let router = router();
    let (status, json) = send(
        &router,
        json_request(
            Method::POST,
            "/upsert",
            Some(TOKEN),
            json!({"documents": [{"id": "ok", "text": "fine text"}, {"text": ""}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("document 1"));
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() {
    let router = router();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::from("{\"queries\": ["))
        .unwrap();

    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn upsert_file_with_malformed_metadata_uses_file_source() {
    let router = router();

    let (status, json) = send(
        &router,
        multipart_request("notes.txt", "Quarterly planning notes for the team", Some("{oops")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = json["ids"][0].as_str().unwrap().to_string();

    let (status, json) = send(
        &router,
        json_request(
            Method::POST,
            "/query",
            Some(TOKEN),
            json!({"queries": [{"query": "planning", "filter": {"source": "file"}}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hit = &json["results"][0]["results"][0];
    assert_eq!(hit["metadata"]["document_id"], id.as_str());
    assert_eq!(hit["metadata"]["source"], "file");
}

#[tokio::test]
async fn upsert_file_without_file_field_is_bad_request() {
    let router = router();
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{{}}\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upsert-file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_requires_exactly_one_mode() {
    let router = router();

    let (status, json) = send(
        &router,
        json_request(Method::DELETE, "/delete", Some(TOKEN), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("One of ids, filter, or delete_all is required"));

    let (status, _) = send(
        &router,
        json_request(
            Method::DELETE,
            "/delete",
            Some(TOKEN),
            json!({"ids": ["a"], "delete_all": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_all_empties_the_store() {
    let router = router();
    send(
        &router,
        json_request(
            Method::POST,
            "/upsert",
            Some(TOKEN),
            json!({"documents": [{"text": "first stored text"}, {"text": "second stored text"}]}),
        ),
    )
    .await;

    let (status, json) = send(
        &router,
        json_request(Method::DELETE, "/delete", Some(TOKEN), json!({"delete_all": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true}));

    let (_, json) = send(
        &router,
        json_request(
            Method::POST,
            "/query",
            Some(TOKEN),
            json!({"queries": [{"query": "stored text"}]}),
        ),
    )
    .await;
    assert_eq!(json["results"][0]["results"], json!([]));
}

/// Backend whose every operation fails
struct BrokenBackend;

#[async_trait]
impl Backend for BrokenBackend {
    async fn upsert(&self, _documents: &[Document]) -> retrieval_gateway::Result<Vec<String>> {
        Err(Error::backend("broken", "disk full at /var/lib/secret"))
    }

    async fn query(&self, _queries: &[ResolvedQuery]) -> retrieval_gateway::Result<Vec<QueryResult>> {
        Err(Error::backend("broken", "connection refused"))
    }

    async fn delete(&self, _mode: &DeleteMode) -> retrieval_gateway::Result<bool> {
        Err(Error::backend("broken", "connection refused"))
    }

    async fn len(&self) -> retrieval_gateway::Result<usize> {
        Ok(0)
    }

    async fn health_check(&self) -> retrieval_gateway::Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn backend_failure_is_generic_internal_error() {
    let router = GatewayServer::new(config(), Gateway::new(Arc::new(BrokenBackend))).router();

    let (status, json) = send(
        &router,
        json_request(
            Method::POST,
            "/upsert",
            Some(TOKEN),
            json!({"documents": [{"text": "some text"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({"detail": "Internal Service Error"}));

    let response = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
