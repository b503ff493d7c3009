use std::sync::Arc;

use ehon_core::compositing::{Compositor, ImageLoader, ObjectUrlRegistry};
use ehon_core::error::CoreError;
use ehon_core::upstream::GenerativeUpstream;
use ehon_openai::OpenAiApi;

use crate::config::ServerConfig;
use crate::fetch::HttpImageFetcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generative upstream, absent when no credential is configured.
    pub upstream: Option<Arc<dyn GenerativeUpstream>>,
    /// Image compositing (object-URL registry and remote fetcher inside).
    pub compositor: Compositor,
}

impl AppState {
    /// Wire the production collaborators from `config`. One HTTP client is
    /// shared by the upstream and the image fetcher.
    pub fn from_config(config: ServerConfig) -> Self {
        let client = reqwest::Client::new();

        let upstream = config.openai.clone().map(|openai| {
            Arc::new(OpenAiApi::with_client(client.clone(), openai)) as Arc<dyn GenerativeUpstream>
        });

        let loader = ImageLoader::with_fetcher(
            Arc::new(ObjectUrlRegistry::new()),
            Arc::new(HttpImageFetcher::from_config(client, &config)),
        );

        Self {
            config: Arc::new(config),
            upstream,
            compositor: Compositor::new(loader),
        }
    }

    /// The configured upstream, or a configuration error naming the
    /// missing credential.
    pub fn upstream(&self) -> Result<&dyn GenerativeUpstream, CoreError> {
        self.upstream
            .as_deref()
            .ok_or_else(|| CoreError::Configuration("OpenAI API key not configured".to_string()))
    }
}
