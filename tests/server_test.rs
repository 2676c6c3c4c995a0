// Integration tests for the HTTP surface
//
// Routes are driven in-process with `tower::ServiceExt::oneshot`; backends are
// stubs injected through `AppState`.

use anyhow::{bail, Result};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use objeto_readability::chat::{Role, Turn};
use objeto_readability::llms::{ModelHandle, ModelLoader, LLM};
use objeto_readability::server::{create_router, AppState};

/// Replies from a script and records every turn list it receives
struct ScriptedLlm {
    replies: Mutex<Vec<Result<String, String>>>,
    seen: Mutex<Vec<Vec<Turn>>>,
    released: AtomicUsize,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .rev()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            seen: Mutex::new(Vec::new()),
            released: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LLM for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, turns: &[Turn]) -> Result<String> {
        self.seen.lock().unwrap().push(turns.to_vec());
        match self.replies.lock().unwrap().pop() {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => bail!(e),
            None => bail!("script exhausted"),
        }
    }

    fn release_resources(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Echoes every human message it has been given, joined by newlines
struct HistoryEcho;

#[async_trait::async_trait]
impl LLM for HistoryEcho {
    fn name(&self) -> &str {
        "history-echo"
    }

    async fn generate(&self, turns: &[Turn]) -> Result<String> {
        Ok(turns
            .iter()
            .filter(|t| t.role == Role::Human)
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Loader that hands out a fixed backend, or fails
struct StubLoader {
    llm: Option<Arc<dyn LLM>>,
    loads: AtomicUsize,
}

impl StubLoader {
    fn ok(llm: Arc<dyn LLM>) -> Arc<Self> {
        Arc::new(Self {
            llm: Some(llm),
            loads: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            llm: None,
            loads: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ModelLoader for StubLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn LLM>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.llm {
            Some(llm) => Ok(Arc::clone(llm)),
            None => bail!("repository {} not found", model_id),
        }
    }
}

fn local_app(loader: Arc<StubLoader>) -> (Router, ModelHandle) {
    let handle = ModelHandle::new();
    let state = AppState::local(handle.clone(), loader);
    (create_router(Arc::new(state)), handle)
}

fn hosted_app(llm: Arc<dyn LLM>) -> Router {
    create_router(Arc::new(AppState::hosted(llm)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(&body.to_string())).await
}

#[tokio::test]
async fn test_index_and_status() {
    let app = hosted_app(ScriptedLlm::new(vec![]));

    let (code, body) = send(&app, "GET", "/", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"message": "Object Readability Service", "status": 0}));

    let (code, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"message": "success", "status": 0}));
}

#[tokio::test]
async fn test_missing_objeto_is_rejected_before_any_backend_call() {
    let llm = ScriptedLlm::new(vec![Ok("alta"), Ok("ok")]);
    let hosted = hosted_app(llm.clone());
    let (local, _) = local_app(StubLoader::ok(llm.clone()));

    for app in [&hosted, &local] {
        for body in [json!({}), json!({"objeto": ""}), json!({"other": "x"})] {
            let (code, resp) = post_json(app, "/object_analysis", body).await;
            assert_eq!(code, StatusCode::BAD_REQUEST);
            assert_eq!(
                resp,
                json!({"message": "Missing or empty parameter: \"objeto\"", "status": 1})
            );
        }
    }

    assert_eq!(llm.calls(), 0);
    assert_eq!(llm.released(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = hosted_app(ScriptedLlm::new(vec![]));
    let (code, resp) = send(&app, "POST", "/object_analysis", Some("{not json")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(resp["status"], 1);
}

#[tokio::test]
async fn test_successful_analysis_returns_both_fields() {
    let llm = ScriptedLlm::new(vec![Ok("alta"), Ok("Texto claro.")]);
    let app = hosted_app(llm.clone());

    let (code, resp) = post_json(&app, "/object_analysis", json!({"objeto": "Aquisição de papel A4"})).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        resp,
        json!({
            "message": "success",
            "status": 0,
            "output": {"clf_legibilidade": "alta", "justificativa": "Texto claro."}
        })
    );
    assert_eq!(llm.calls(), 2);
    assert_eq!(llm.released(), 1);
}

#[tokio::test]
async fn test_turns_share_conversation_context() {
    let app = hosted_app(Arc::new(HistoryEcho));

    let (code, resp) = post_json(&app, "/object_analysis", json!({"objeto": "Compra de cadeiras"})).await;
    assert_eq!(code, StatusCode::OK);

    let classification = resp["output"]["clf_legibilidade"].as_str().unwrap();
    let justification = resp["output"]["justificativa"].as_str().unwrap();

    assert!(classification.contains("Compra de cadeiras"));
    // Turn 2 saw turn 1's human message followed by the justification request
    assert!(justification.starts_with(classification));
    assert!(justification.contains("Forneça uma justificativa"));
}

#[tokio::test]
async fn test_context_does_not_leak_between_requests() {
    let llm = ScriptedLlm::new(vec![Ok("alta"), Ok("a"), Ok("baixa"), Ok("b")]);
    let app = hosted_app(llm.clone());

    post_json(&app, "/object_analysis", json!({"objeto": "primeiro"})).await;
    post_json(&app, "/object_analysis", json!({"objeto": "segundo"})).await;

    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    // Third call opens a fresh exchange: system + one human turn
    assert_eq!(seen[2].len(), 2);
    assert!(seen[2].iter().all(|t| !t.content.contains("primeiro")));
}

#[tokio::test]
async fn test_backend_failure_is_generic_and_releases_once() {
    let llm = ScriptedLlm::new(vec![Err("CUDA out of memory")]);
    let app = hosted_app(llm.clone());

    let (code, resp) = post_json(&app, "/object_analysis", json!({"objeto": "x"})).await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"message": "Error processing object", "status": 1}));
    assert!(!resp.to_string().contains("CUDA"));
    assert_eq!(llm.released(), 1);
}

#[tokio::test]
async fn test_justification_failure_discards_classification() {
    let llm = ScriptedLlm::new(vec![Ok("média"), Err("rate limited")]);
    let app = hosted_app(llm.clone());

    let (code, resp) = post_json(&app, "/object_analysis", json!({"objeto": "x"})).await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.get("output").is_none());
    assert_eq!(llm.released(), 1);
}

#[tokio::test]
async fn test_analysis_is_repeatable() {
    let llm = ScriptedLlm::new(vec![Ok("alta"), Ok("ok"), Ok("alta"), Ok("ok")]);
    let app = hosted_app(llm.clone());

    let first = post_json(&app, "/object_analysis", json!({"objeto": "mesmo texto"})).await;
    let second = post_json(&app, "/object_analysis", json!({"objeto": "mesmo texto"})).await;

    assert_eq!(first, second);
    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen[0], seen[2]);
}

#[tokio::test]
async fn test_load_route_absent_for_hosted_backend() {
    let app = hosted_app(ScriptedLlm::new(vec![]));
    let (code, _) = post_json(&app, "/load", json!({"model": "x"})).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_load_rejects_missing_model_and_keeps_handle() {
    let loader = StubLoader::ok(ScriptedLlm::new(vec![]));
    let (app, handle) = local_app(loader.clone());

    for body in [json!({}), json!({"model": ""})] {
        let (code, resp) = post_json(&app, "/load", body).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(
            resp,
            json!({"message": "Missing or empty parameter: \"model\"", "status": 1})
        );
    }

    assert!(!handle.is_loaded().await);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_load_keeps_installed_model() {
    let loader = StubLoader::ok(ScriptedLlm::new(vec![]));
    let (app, handle) = local_app(loader.clone());

    let (code, _) = post_json(&app, "/load", json!({"model": "org/first-model"})).await;
    assert_eq!(code, StatusCode::OK);

    for body in [json!({"model": ""}), json!({}), json!({"model": null})] {
        let (code, _) = post_json(&app, "/load", body).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }

    assert_eq!(handle.snapshot().await.unwrap().model_id, "org/first-model");
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_health_routes_do_not_need_a_model() {
    let (app, handle) = local_app(StubLoader::ok(ScriptedLlm::new(vec![])));
    assert!(!handle.is_loaded().await);

    let (code, body) = send(&app, "GET", "/", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"message": "Object Readability Service", "status": 0}));

    let (code, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"message": "success", "status": 0}));
}

#[tokio::test]
async fn test_analysis_before_load_fails() {
    let (app, _) = local_app(StubLoader::ok(ScriptedLlm::new(vec![])));
    let (code, resp) = post_json(&app, "/object_analysis", json!({"objeto": "x"})).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"message": "Error processing object", "status": 1}));
}

#[tokio::test]
async fn test_load_then_analyse() {
    let llm = ScriptedLlm::new(vec![Ok("baixa"), Ok("Redundante.")]);
    let (app, handle) = local_app(StubLoader::ok(llm.clone()));

    let (code, resp) = post_json(&app, "/load", json!({"model": "mistralai/Mistral-7B-Instruct-v0.2"})).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        resp,
        json!({"message": "Model and tokenizer loaded successfully", "status": 0})
    );
    assert_eq!(
        handle.snapshot().await.unwrap().model_id,
        "mistralai/Mistral-7B-Instruct-v0.2"
    );

    let (code, resp) = post_json(&app, "/object_analysis", json!({"objeto": "x"})).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(resp["output"]["clf_legibilidade"], "baixa");
    assert_eq!(llm.released(), 1);
}

#[tokio::test]
async fn test_load_failure_is_generic() {
    let (app, handle) = local_app(StubLoader::failing());

    let (code, resp) = post_json(&app, "/load", json!({"model": "does/not-exist"})).await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"message": "Error loading model", "status": 1}));
    assert!(!handle.is_loaded().await);
}
