//! HTTP behaviour of the status, chat and health routes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use kgchat_backend::{BackendLifecycle, BackendSettings};
use kgchat_config::loader::load_with_env;
use kgchat_server::{AppState, build_backend, router};
use kgchat_test::{EchoToolConnector, MockModelRuntime, setup_test_logging, test_config_file};
use serde_json::{Value, json};
use tower::ServiceExt;

fn backend(runtime: &MockModelRuntime, connector: &EchoToolConnector) -> Arc<BackendLifecycle> {
    Arc::new(BackendLifecycle::new(
        Arc::new(runtime.clone()),
        Arc::new(connector.clone()),
        BackendSettings::default(),
    ))
}

fn app(backend: &Arc<BackendLifecycle>) -> Router {
    router(AppState::new(Arc::clone(backend)), true)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

type Prompts = Arc<Mutex<Vec<Value>>>;

/// Completions endpoint that replays `replies` in order, repeating the last.
async fn spawn_model(replies: Vec<&'static str>) -> (String, Prompts) {
    let prompts: Prompts = Arc::default();
    let seen = Arc::clone(&prompts);
    let turn = Arc::new(AtomicUsize::new(0));

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let seen = Arc::clone(&seen);
            let turn = Arc::clone(&turn);
            let replies = replies.clone();
            async move {
                seen.lock().unwrap().push(body);
                let index = turn.fetch_add(1, Ordering::SeqCst).min(replies.len().saturating_sub(1));
                Json(json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": replies[index]},
                        "finish_reason": "stop"
                    }]
                }))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), prompts)
}

const READ_GRAPH: &str = " I should read the graph.\nAction: read_graph\nAction Input: {}";
const ANSWER: &str = " I now know the final answer\nFinal Answer: Alice works at Contoso.";

#[tokio::test]
async fn test_status_before_initialization() {
    let backend = backend(&MockModelRuntime::new(), &EchoToolConnector::new());
    let (status, body) = send(app(&backend), get("/api/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "isInitialized": false,
            "isInitializing": false,
            "error": null,
            "modelInfo": null,
            "hasAgent": false,
            "hasLLM": false
        })
    );
}

#[tokio::test]
async fn test_status_after_failed_initialization() {
    let runtime = MockModelRuntime::new().failing_load("disk full");
    let backend = backend(&runtime, &EchoToolConnector::new());
    let _ = backend.initialize().await;

    let (status, body) = send(app(&backend), get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isInitialized"], false);
    assert!(body["error"].as_str().unwrap().contains("disk full"));
}

#[tokio::test]
async fn test_health_is_independent_of_backend() {
    let backend = backend(&MockModelRuntime::new(), &EchoToolConnector::new());
    let (status, body) = send(app(&backend), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_chat_requires_a_message() {
    let runtime = MockModelRuntime::new();
    let backend = backend(&runtime, &EchoToolConnector::new());
    backend.initialize().await.unwrap();

    for body in [r"{}", r#"{"message": ""}"#, r#"{"message": null}"#, "not json"] {
        let (status, reply) = send(app(&backend), post_json("/api/chat", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(reply["error"], "Message is required");
    }
    assert!(backend.status().is_initialized);
}

#[tokio::test]
async fn test_chat_validates_before_readiness() {
    let backend = backend(&MockModelRuntime::new(), &EchoToolConnector::new());
    let (status, _) = send(app(&backend), post_json("/api/chat", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_before_initialization_is_not_ready() {
    let runtime = MockModelRuntime::new();
    let connector = EchoToolConnector::new();
    let backend = backend(&runtime, &connector);

    let (status, body) = send(
        app(&backend),
        post_json("/api/chat", r#"{"message": "who is Alice?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "AI service not initialized");
    assert_eq!(connector.calls(), 0);
    assert_eq!(runtime.loads(), 0);
    assert!(!backend.status().is_initialized);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chat_reads_graph_then_answers() {
    setup_test_logging("kgchat_agent=debug,kgchat_server=debug");
    let (endpoint, prompts) = spawn_model(vec![READ_GRAPH, ANSWER]).await;
    let runtime = MockModelRuntime::new().with_endpoint(endpoint);
    let connector = EchoToolConnector::new();
    let backend = backend(&runtime, &connector);
    backend.initialize().await.unwrap();

    let (status, body) = send(
        app(&backend),
        post_json("/api/chat", r#"{"message": "tell me about Alice"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "Alice works at Contoso."}));
    assert_eq!(connector.calls(), 1);
    assert_eq!(connector.closes(), 1);

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0]["temperature"], 0.0);
    assert_eq!(prompts[0]["stop"], json!(["\nObservation:"]));
    let first = prompts[0]["messages"][0]["content"].as_str().unwrap();
    assert!(first.contains("Question: Use the read_graph tool and then tell me about Alice."));
    let second = prompts[1]["messages"][0]["content"].as_str().unwrap();
    assert!(second.contains("Observation: read_graph:{}"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chat_budget_exhaustion_is_a_failure_response() {
    let (endpoint, prompts) = spawn_model(vec![READ_GRAPH]).await;
    let runtime = MockModelRuntime::new().with_endpoint(endpoint);
    let backend = backend(&runtime, &EchoToolConnector::new());
    backend.initialize().await.unwrap();

    let (status, body) = send(
        app(&backend),
        post_json("/api/chat", r#"{"message": "loop forever"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("iteration limit"));
    assert_eq!(prompts.lock().unwrap().len(), 3);
    assert!(backend.status().is_initialized);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chat_tool_failure_is_a_failure_response() {
    let (endpoint, _) = spawn_model(vec![READ_GRAPH, ANSWER]).await;
    let runtime = MockModelRuntime::new().with_endpoint(endpoint);
    let backend = backend(&runtime, &EchoToolConnector::unreachable());
    backend.initialize().await.unwrap();

    let (status, body) = send(
        app(&backend),
        post_json("/api/chat", r#"{"message": "who is Alice?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));

    let (status, _) = send(app(&backend), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let backend = backend(&MockModelRuntime::new(), &EchoToolConnector::new());
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();

    let response = app(&backend).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_config_file_drives_backend_settings() {
    let file = test_config_file(
        "[agent]\nmax_iterations = 1\n\n[mcp]\ngraph_tool = \"graph.read\"\n",
    );
    let config = load_with_env(Some(file.path()), &HashMap::new()).unwrap();
    let backend = build_backend(&config);

    assert_eq!(backend.settings().agent.max_iterations, 1);
    assert_eq!(backend.settings().graph_tool, "graph.read");
    assert_eq!(backend.settings().agent.max_execution.as_secs(), 30);

    let (status, body) = send(app(&backend), get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isInitialized"], false);
}
