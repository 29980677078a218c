//! Error types shared by the fetch, parse and push-channel boundaries.

use thiserror::Error;

/// Errors surfaced by dashboard operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The server answered with a non-2xx status.
    #[error("request to {url} failed with status {status}")]
    Fetch { url: String, status: u16 },

    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body or channel message could not be decoded.
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    /// The push channel could not be opened or broke mid-stream.
    #[error("log channel error: {0}")]
    Channel(String),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl DashboardError {
    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this belongs to the fetch class (bad status or transport failure).
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http(_))
    }

    /// Short text suitable for a degraded-state notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch { status, .. } => format!("server responded with status {}", status),
            Self::Http(e) if e.is_timeout() => "the server did not respond in time".to_string(),
            Self::Http(_) => "the server could not be reached".to_string(),
            Self::Parse { context, .. } => format!("the server sent an unreadable {}", context),
            Self::Channel(msg) => format!("log channel unavailable ({})", msg),
            Self::InvalidUrl { url, .. } => format!("invalid address {}", url),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
