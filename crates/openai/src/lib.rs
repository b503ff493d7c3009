//! OpenAI REST client used as the generative upstream.
//!
//! [`api`] wraps the chat-completions and image-edit endpoints;
//! [`upstream`] adapts it to [`ehon_core::upstream::GenerativeUpstream`].

pub mod api;
pub mod upstream;

pub use api::{OpenAiApi, OpenAiApiError, OpenAiConfig};
