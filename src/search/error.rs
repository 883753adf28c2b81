use crate::upstream::UpstreamError;
use thiserror::Error;

/// Why a search produced no results.
///
/// Kinds come straight from [`UpstreamError`]; only [`SearchError::user_message`]
/// turns them into text for display.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned {code}: {message}")]
    UpstreamStatus { code: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    /// Superseded by a newer search
    #[error("search cancelled")]
    Cancelled,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<UpstreamError> for SearchError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Configuration(msg) => SearchError::Configuration(msg),
            UpstreamError::Transport(msg) => SearchError::Transport(msg),
            UpstreamError::Status { code, message } => SearchError::UpstreamStatus { code, message },
            UpstreamError::Decode(msg) => SearchError::Decode(msg),
        }
    }
}

impl SearchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }

    /// Text to show the user; `None` for cancellations, which are never shown
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            SearchError::Cancelled => return None,
            SearchError::Configuration(detail) => format!("Search is not configured: {detail}"),
            SearchError::Transport(_) => {
                "Connection error. Please check your internet connection.".to_string()
            }
            SearchError::UpstreamStatus { code: 401, .. } => {
                "Authentication failed. Please check your API credentials.".to_string()
            }
            SearchError::UpstreamStatus { code: 404, .. } => {
                "The search endpoint could not be found. Please contact support.".to_string()
            }
            SearchError::UpstreamStatus { code: 500, .. } | SearchError::Decode(_) => {
                "Server error occurred. Please try again later.".to_string()
            }
            SearchError::UpstreamStatus { .. } => "Search failed. Please try again.".to_string(),
            SearchError::InvalidRequest(detail) => detail.clone(),
        };
        Some(message)
    }
}
