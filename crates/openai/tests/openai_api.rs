//! Exercises the client against a throwaway local server that mimics the
//! OpenAI endpoints.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use ehon_core::error::CoreError;
use ehon_core::types::Photo;
use ehon_core::upstream::{CompletionRequest, GenerativeUpstream, IllustrationRequest};
use ehon_openai::{OpenAiApi, OpenAiApiError, OpenAiConfig};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorded {
    chat_body: Arc<Mutex<Option<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
    edit_fields: Arc<Mutex<Vec<(String, Option<String>, Option<String>)>>>,
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn client(base_url: String) -> OpenAiApi {
    let mut config = OpenAiConfig::new("sk-test");
    config.base_url = base_url;
    OpenAiApi::new(config)
}

fn photo() -> Photo {
    Photo::new(
        vec![0x89, b'P', b'N', b'G'],
        Some("kid.jpg".into()),
        Some("image/jpeg".into()),
    )
}

async fn chat_ok(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    *rec.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *rec.chat_body.lock().unwrap() = Some(body);
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "  1. 犬が走る\n2. 犬が寝る \n" } }]
    }))
}

async fn edits_url(State(rec): State<Recorded>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let _ = field.bytes().await.unwrap();
        rec.edit_fields.lock().unwrap().push((name, file_name, content_type));
    }
    Json(json!({ "data": [{ "url": "https://img.test/scene.png" }] }))
}

// ---------------------------------------------------------------------------
// Test: chat completion request shape and response parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_completion_sends_model_and_sampling_settings() {
    let rec = Recorded::default();
    let base = spawn(
        Router::new()
            .route("/v1/chat/completions", post(chat_ok))
            .with_state(rec.clone()),
    )
    .await;

    let text = client(base)
        .complete(&CompletionRequest {
            prompt: "キーワード: 犬".into(),
            temperature: 0.7,
            max_tokens: 150,
        })
        .await
        .unwrap();

    assert_eq!(text, "1. 犬が走る\n2. 犬が寝る");
    assert_eq!(rec.auth.lock().unwrap().as_deref(), Some("Bearer sk-test"));

    let body = rec.chat_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 150);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "キーワード: 犬");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Test: upstream error status and message are preserved
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_error_status_and_message_are_preserved() {
    let base = spawn(Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": { "message": "Rate limit reached", "type": "requests" } })),
            )
        }),
    ))
    .await;

    let api = client(base);
    let raw = api.chat_completion("x", 0.7, 150).await;
    assert_matches!(
        raw,
        Err(OpenAiApiError::ApiError { status: 429, ref message }) if message == "Rate limit reached"
    );

    let err = api
        .complete(&CompletionRequest {
            prompt: "x".into(),
            temperature: 0.7,
            max_tokens: 150,
        })
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Upstream { status: Some(429), .. });
}

// ---------------------------------------------------------------------------
// Test: image edit multipart shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_edit_uploads_photo_with_its_name_and_type() {
    let rec = Recorded::default();
    let base = spawn(
        Router::new()
            .route("/v1/images/edits", post(edits_url))
            .with_state(rec.clone()),
    )
    .await;

    let url = client(base)
        .illustrate(&IllustrationRequest {
            prompt: "scene".into(),
            photo: photo(),
        })
        .await
        .unwrap();
    assert_eq!(url, "https://img.test/scene.png");

    let fields = rec.edit_fields.lock().unwrap().clone();
    let names: Vec<&str> = fields.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, ["model", "prompt", "n", "image"]);

    let image = &fields[3];
    assert_eq!(image.1.as_deref(), Some("kid.jpg"));
    assert_eq!(image.2.as_deref(), Some("image/jpeg"));
}

// ---------------------------------------------------------------------------
// Test: base64-only results and empty results
// ---------------------------------------------------------------------------

#[tokio::test]
async fn base64_only_result_becomes_data_url() {
    let base = spawn(Router::new().route(
        "/v1/images/edits",
        post(|| async { Json(json!({ "data": [{ "b64_json": "iVBORw0KGgo=" }] })) }),
    ))
    .await;

    let url = client(base)
        .illustrate(&IllustrationRequest {
            prompt: "scene".into(),
            photo: photo(),
        })
        .await
        .unwrap();
    assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn empty_image_result_is_upstream_error() {
    let base = spawn(Router::new().route(
        "/v1/images/edits",
        post(|| async { Json(json!({ "data": [] })) }),
    ))
    .await;

    let err = client(base)
        .illustrate(&IllustrationRequest {
            prompt: "scene".into(),
            photo: photo(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Upstream { status: None, .. });
}

#[tokio::test]
async fn malformed_success_body_is_upstream_error() {
    let base = spawn(Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::OK, "<html>gateway page</html>") }),
    ))
    .await;

    let err = client(base)
        .complete(&CompletionRequest {
            prompt: "x".into(),
            temperature: 0.7,
            max_tokens: 150,
        })
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Upstream { status: None, .. });
}

// ---------------------------------------------------------------------------
// Test: an unusable upload content type is the caller's fault
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_photo_content_type_is_validation_error() {
    let rec = Recorded::default();
    let base = spawn(
        Router::new()
            .route("/v1/images/edits", post(edits_url))
            .with_state(rec.clone()),
    )
    .await;

    let bad = Photo::new(vec![1u8, 2, 3], None, Some("not a mime".into()));
    let err = client(base)
        .illustrate(&IllustrationRequest {
            prompt: "scene".into(),
            photo: bad,
        })
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
    assert!(rec.edit_fields.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: unreachable server surfaces as a network error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{addr}/v1"))
        .complete(&CompletionRequest {
            prompt: "x".into(),
            temperature: 0.7,
            max_tokens: 150,
        })
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Network(_));
}
