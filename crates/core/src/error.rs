/// Domain error shared by every crate in the workspace.
///
/// Each variant maps to exactly one HTTP response class in `ehon-api`;
/// see `AppError::into_response` there.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or blank required input. Always caused by the client.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The server is missing a required setting (e.g. the upstream credential).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The generative service rejected or failed the request.
    ///
    /// `status` is the upstream HTTP status when one was received.
    #[error("Upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// A source image could not be loaded or decoded, or the canvas could
    /// not be encoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Transport failure reaching an upstream service.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for an upstream error without a status code.
    pub fn upstream(message: impl Into<String>) -> Self {
        CoreError::Upstream {
            status: None,
            message: message.into(),
        }
    }
}
