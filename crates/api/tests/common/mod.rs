use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};
use tower::ServiceExt;

use ehon_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use ehon_api::router::build_app_router;
use ehon_api::state::AppState;
use ehon_core::compositing::{Compositor, ImageLoader, ObjectUrlRegistry};
use ehon_core::upstream::GenerativeUpstream;

pub use ehon_core::fakes::FakeUpstream;

/// Build a test `ServerConfig` with safe defaults and no upstream
/// credential.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        image_fetch_timeout_secs: 5,
        image_fetch_allow_private: false,
        openai: None,
    }
}

/// Application state with the given upstream and a local-only image
/// loader. The registry is returned so tests can check object-URL
/// bookkeeping.
pub fn test_state(
    upstream: Option<Arc<dyn GenerativeUpstream>>,
) -> (AppState, Arc<ObjectUrlRegistry>) {
    let registry = Arc::new(ObjectUrlRegistry::new());
    let state = AppState {
        config: Arc::new(test_config()),
        upstream,
        compositor: Compositor::new(ImageLoader::local(registry.clone())),
    };
    (state, registry)
}

/// Build the full application router with all middleware layers, using the
/// same builder as `main.rs`.
pub fn build_test_app(upstream: Option<Arc<dyn GenerativeUpstream>>) -> Router {
    let (state, _) = test_state(upstream);
    build_app_router(state, &test_config())
}

pub fn app_with(upstream: &Arc<FakeUpstream>) -> Router {
    build_test_app(Some(upstream.clone() as Arc<dyn GenerativeUpstream>))
}

/// Like [`app_with`] but with a small request body limit.
pub fn app_with_upload_limit(upstream: &Arc<FakeUpstream>, max_upload_bytes: usize) -> Router {
    let config = ServerConfig {
        max_upload_bytes,
        ..test_config()
    };
    let (mut state, _) = test_state(Some(upstream.clone() as Arc<dyn GenerativeUpstream>));
    state.config = Arc::new(config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw_json(app, uri, body.to_string()).await
}

pub async fn post_raw_json(app: Router, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_form(app: Router, uri: &str, form: MultipartForm) -> Response<Body> {
    app.oneshot(form.into_request(uri)).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "ehon-test-boundary";

/// Minimal `multipart/form-data` body builder.
#[derive(Default)]
pub struct MultipartForm {
    buf: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Attach `bytes` as the `image` field.
    pub fn image(self, bytes: &[u8]) -> Self {
        self.file("image", "child.png", "image/png", bytes)
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.buf))
            .unwrap()
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Opaque blue PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub fn png_data_url(width: u32, height: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png_bytes(width, height))
    )
}

/// Decode a `data:image/png;base64,` URL returned by the API.
pub fn decode_data_url(url: &str) -> RgbaImage {
    let payload = url
        .strip_prefix("data:image/png;base64,")
        .expect("PNG data URL");
    image::load_from_memory(&STANDARD.decode(payload).unwrap())
        .unwrap()
        .to_rgba8()
}
