//! Agent transport tests: envelopes in, envelopes out, via `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use kratos_core::{RawSchema, Record};
use kratos_graph::{GraphError, GraphStore};
use kratos_llm::{LanguageModel, LlmError};
use kratos_pipeline::{Pipeline, PipelineOptions};

use kratos_agent::{create_router, AppState};

struct PeopleGraph;

#[async_trait]
impl GraphStore for PeopleGraph {
    async fn introspect_schema(&self) -> Result<RawSchema, GraphError> {
        Ok(RawSchema {
            labels: vec!["Person".to_string()],
            relationship_types: vec!["KNOWS".to_string()],
            node_properties: vec![("Person".to_string(), "name".to_string())],
        })
    }

    async fn run_read_query(
        &self,
        _text: &str,
        _timeout: Duration,
    ) -> Result<Vec<Record>, GraphError> {
        let mut row = Record::new();
        row.insert("name".to_string(), json!("Rahul"));
        Ok(vec![row])
    }
}

/// Returns `cypher` for query-synthesis prompts and a fixed answer otherwise.
struct FixedModel {
    cypher: &'static str,
}

#[async_trait]
impl LanguageModel for FixedModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.starts_with("Classify") {
            Ok("generic".to_string())
        } else if prompt.starts_with("You are a Neo4j Cypher expert") {
            Ok(self.cypher.to_string())
        } else {
            Ok("Rahul exists.".to_string())
        }
    }
}

fn app(cypher: &'static str) -> axum::Router {
    let options = PipelineOptions {
        intent_categories: vec!["lineage".to_string(), "impact".to_string()],
        ..Default::default()
    };
    let pipeline = Pipeline::new(Arc::new(PeopleGraph), Arc::new(FixedModel { cypher }), options);
    create_router(AppState {
        pipeline: Arc::new(pipeline),
        agent_id: "kratos-graphrag".to_string(),
        protocol: "A2A-v1.2".to_string(),
    })
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_message(envelope: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/protocol/v1/message")
        .header("content-type", "application/json")
        .body(Body::from(envelope.to_string()))
        .unwrap()
}

fn request_envelope(content: Value) -> Value {
    json!({
        "sender": "planner-agent",
        "receiver": "kratos-graphrag",
        "performative": "REQUEST",
        "content": content,
        "conversation_id": "conv-42"
    })
}

#[tokio::test]
async fn question_is_answered_with_inform() {
    let (status, body) = send(
        app("MATCH (n:Person) WHERE n.name = 'Rahul' RETURN n.name"),
        post_message(request_envelope(json!({"query": "Find person Rahul"}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["performative"], "INFORM");
    assert_eq!(body["sender"], "kratos-graphrag");
    assert_eq!(body["receiver"], "planner-agent");
    assert_eq!(body["conversation_id"], "conv-42");
    assert_eq!(body["content"], json!({"data": "Rahul exists.", "status": "SUCCESS"}));
}

#[tokio::test]
async fn camel_case_conversation_id_is_accepted() {
    let envelope = json!({
        "sender": "planner-agent",
        "receiver": "kratos-graphrag",
        "performative": "REQUEST",
        "content": {"query": "Find person Rahul"},
        "conversationId": "conv-7"
    });
    let (status, body) = send(
        app("MATCH (n:Person) RETURN n.name"),
        post_message(envelope),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation_id"], "conv-7");
}

#[tokio::test]
async fn rejected_query_replies_failure_with_kind() {
    let (status, body) = send(
        app("MATCH (n:Person) DETACH DELETE n"),
        post_message(request_envelope(json!({"query": "Wipe the graph"}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["performative"], "FAILURE");
    assert_eq!(body["content"]["status"], "ERROR");
    assert_eq!(body["content"]["error_kind"], "write_operation_forbidden");
    assert!(body["content"]["data"].as_str().unwrap().contains("delete"));
}

#[tokio::test]
async fn envelope_without_query_is_not_understood() {
    let (status, body) = send(
        app("MATCH (n:Person) RETURN n"),
        post_message(request_envelope(json!({"question": "Find person Rahul"}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["performative"], "NOT_UNDERSTOOD");
    assert_eq!(body["receiver"], "planner-agent");
}

#[tokio::test]
async fn manifest_advertises_intent_categories() {
    let request = Request::builder()
        .uri("/protocol/v1/manifest")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app("MATCH (n) RETURN n"), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "agent_id": "kratos-graphrag",
            "capabilities": ["lineage", "impact"],
            "protocol": "A2A-v1.2"
        })
    );
}

#[tokio::test]
async fn health_is_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app("MATCH (n) RETURN n"), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn malformed_envelope_is_client_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/protocol/v1/message")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"sender": "planner-agent"}"#))
        .unwrap();
    let response = app("MATCH (n) RETURN n").oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}
