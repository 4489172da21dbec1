/// Errors that can occur while talking to the CMS or the export/geocoding services.
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        /// Error body returned by the server, when it was JSON.
        payload: Option<serde_json::Value>,
    },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unexpected API response: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CmsError {
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Server-provided error body, if any.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Server { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Build a `Server` error from a non-success response body.
    ///
    /// Strapi wraps errors as `{"error": {"message": ...}}`; other bodies are
    /// kept verbatim (truncated) as the message.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let payload: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let message = payload
            .as_ref()
            .and_then(|p| p.get("error"))
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| truncate(body, 200));
        Self::Server {
            status,
            message,
            payload,
        }
    }
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
