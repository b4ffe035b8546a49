//! Gateway client
//!
//! Typed wrapper over the two remote operations the session layer depends on:
//! - paginated search-with-history (`/esearch-summary-history/`)
//! - bulk detail fetch by id list (`/efetch/`)
//!
//! Every failure is classified into an [`ApiError`] kind and returned to the
//! caller. Nothing is retried here.

pub mod client;
pub mod error;

pub use client::{coerce_count, ApiClient};
pub use error::{ApiError, ApiErrorKind, ApiResult};

use async_trait::async_trait;

use crate::models::{ArticleDetail, ArticleSummary, HistoryToken};

/// What identifies the result set on the wire. Exactly one of the two is
/// sent per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Fresh full-text search.
    Term(String),
    /// Continue a search the history server already holds.
    History(HistoryToken),
}

impl SearchQuery {
    pub fn is_by_token(&self) -> bool {
        matches!(self, SearchQuery::History(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: SearchQuery,
    /// Zero-based row index of the first result.
    pub offset: u64,
    pub limit: u32,
}

/// One page of search results as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPage {
    pub results: Vec<ArticleSummary>,
    /// Total matches, already coerced to a non-negative integer.
    pub count: u64,
    /// Present only when the response carried both webenv and query key.
    pub token: Option<HistoryToken>,
}

/// The remote operations consumed by the session controller and the detail
/// coordinator.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> ApiResult<SearchPage>;

    /// Every requested id that exists is returned; order is not guaranteed.
    async fn fetch_details(&self, ids: &[String]) -> ApiResult<Vec<ArticleDetail>>;
}

#[async_trait]
impl<T: SearchGateway + ?Sized> SearchGateway for std::sync::Arc<T> {
    async fn search(&self, request: &SearchRequest) -> ApiResult<SearchPage> {
        (**self).search(request).await
    }

    async fn fetch_details(&self, ids: &[String]) -> ApiResult<Vec<ArticleDetail>> {
        (**self).fetch_details(ids).await
    }
}
