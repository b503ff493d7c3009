use ehon_openai::api::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL};
use ehon_openai::OpenAiConfig;

/// Default request body limit: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Story generation
    /// makes one image call per scene, so this is generous.
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 20 MiB).
    pub max_upload_bytes: usize,
    /// Per-fetch timeout for remote overlay sources (default: `30`).
    pub image_fetch_timeout_secs: u64,
    /// Allow overlay sources on loopback or private addresses (default:
    /// `false`).
    pub image_fetch_allow_private: bool,
    /// Upstream credentials and models. `None` when `OPENAI_API_KEY` is
    /// unset or blank; generation endpoints then answer with a
    /// configuration error.
    pub openai: Option<OpenAiConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `HOST`                 | `0.0.0.0`                    |
    /// | `PORT`                 | `3000`                       |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                        |
    /// | `MAX_UPLOAD_BYTES`     | `20971520`                   |
    /// | `IMAGE_FETCH_TIMEOUT_SECS` | `30`                     |
    /// | `IMAGE_FETCH_ALLOW_PRIVATE` | `false`                 |
    /// | `OPENAI_API_KEY`       | unset                        |
    /// | `OPENAI_BASE_URL`      | `https://api.openai.com/v1`  |
    /// | `OPENAI_CHAT_MODEL`    | `gpt-3.5-turbo`              |
    /// | `OPENAI_IMAGE_MODEL`   | `gpt-image-1`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let image_fetch_timeout_secs: u64 = std::env::var("IMAGE_FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("IMAGE_FETCH_TIMEOUT_SECS must be a valid u64");

        let image_fetch_allow_private = std::env::var("IMAGE_FETCH_ALLOW_PRIVATE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let openai = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| OpenAiConfig {
                api_key,
                base_url: std::env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
                chat_model: std::env::var("OPENAI_CHAT_MODEL")
                    .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.into()),
                image_model: std::env::var("OPENAI_IMAGE_MODEL")
                    .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.into()),
            });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            image_fetch_timeout_secs,
            image_fetch_allow_private,
            openai,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
