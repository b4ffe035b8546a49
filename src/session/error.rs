use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("search term must not be empty")]
    EmptyTerm,

    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("no detail returned for article {0}")]
    DetailNotFound(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
