use reqwest::StatusCode;
use thiserror::Error;

/// Classified failure of a gateway call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("rate limited by the search service")]
    RateLimited,

    #[error("search service error (HTTP {status}){}", fmt_message(.message))]
    Server { status: u16, message: Option<String> },

    #[error("request rejected (HTTP {status}){}", fmt_message(.message))]
    Client { status: u16, message: Option<String> },

    #[error("network error: {0}")]
    Network(String),
}

fn fmt_message(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    RateLimited,
    ServerError,
    ClientError,
    NetworkError,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::RateLimited => write!(f, "rate_limited"),
            ApiErrorKind::ServerError => write!(f, "server_error"),
            ApiErrorKind::ClientError => write!(f, "client_error"),
            ApiErrorKind::NetworkError => write!(f, "network_error"),
        }
    }
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            ApiError::RateLimited
        } else if status.is_server_error() {
            ApiError::Server {
                status: status.as_u16(),
                message,
            }
        } else {
            ApiError::Client {
                status: status.as_u16(),
                message,
            }
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::RateLimited => ApiErrorKind::RateLimited,
            ApiError::Server { .. } => ApiErrorKind::ServerError,
            ApiError::Client { .. } => ApiErrorKind::ClientError,
            ApiError::Network(_) => ApiErrorKind::NetworkError,
        }
    }

    /// Notification text for the outermost boundary.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::RateLimited => {
                "Too many requests. The free tier allows 3 requests per second, please wait a moment."
                    .to_string()
            }
            ApiError::Server { .. } => "Server error. Please try again later.".to_string(),
            ApiError::Client { status, .. } => {
                format!("An error occurred ({}). Please try again.", status)
            }
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
        }
    }

    /// Whether the boundary should fall back to a full session reset.
    /// A network failure leaves the session intact so the same action can be
    /// retried in place.
    pub fn invalidates_session(&self) -> bool {
        !matches!(self, ApiError::Network(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
