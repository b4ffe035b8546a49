//! In-crate fakes for the session tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

use super::store::{Snapshot, SnapshotStore, StoreError, StoreResult};
use crate::api::{ApiError, ApiResult, SearchGateway, SearchPage, SearchRequest};
use crate::models::{ArticleDetail, ArticleSummary, HistoryToken};

pub fn summary(id: &str) -> ArticleSummary {
    ArticleSummary {
        id: id.to_string(),
        title: format!("Article {}", id),
        year: "2024".to_string(),
        authors: "Doe J".to_string(),
        url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id),
    }
}

pub fn detail(pmid: &str) -> ArticleDetail {
    ArticleDetail {
        id: pmid.to_string(),
        pmid: pmid.to_string(),
        title: format!("Article {}", pmid),
        publication_year: "2024".to_string(),
        journal: "Journal of Tests".to_string(),
        authors: vec!["Jane Doe".to_string()],
        abstract_text: "No abstract available".to_string(),
        mesh_terms: vec!["Humans".to_string()],
    }
}

pub fn page_of(rows: usize, count: u64, token: Option<(&str, &str)>) -> SearchPage {
    SearchPage {
        results: (0..rows).map(|i| summary(&format!("{}", 1000 + i))).collect(),
        count,
        token: token.map(|(w, q)| HistoryToken::new(w, q)),
    }
}

/// Answers calls from a queue, recording every request.
#[derive(Default)]
pub struct ScriptedGateway {
    pages: Mutex<VecDeque<ApiResult<SearchPage>>>,
    details: Mutex<VecDeque<ApiResult<Vec<ArticleDetail>>>>,
    requests: Mutex<Vec<SearchRequest>>,
    detail_requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: SearchPage) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_error(&self, error: ApiError) {
        self.pages.lock().unwrap().push_back(Err(error));
    }

    pub fn push_details(&self, details: ApiResult<Vec<ArticleDetail>>) {
        self.details.lock().unwrap().push_back(details);
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> SearchRequest {
        self.requests().last().cloned().expect("no search request recorded")
    }

    pub fn detail_requests(&self) -> Vec<Vec<String>> {
        self.detail_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchGateway for ScriptedGateway {
    async fn search(&self, request: &SearchRequest) -> ApiResult<SearchPage> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected search call")
    }

    async fn fetch_details(&self, ids: &[String]) -> ApiResult<Vec<ArticleDetail>> {
        self.detail_requests.lock().unwrap().push(ids.to_vec());
        self.details
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected detail call")
    }
}

/// Each call blocks until the test releases it, so responses can be made to
/// resolve out of order.
#[derive(Default)]
pub struct GatedGateway {
    search_gates: Mutex<VecDeque<oneshot::Receiver<ApiResult<SearchPage>>>>,
    detail_gates: Mutex<VecDeque<oneshot::Receiver<ApiResult<Vec<ArticleDetail>>>>>,
    calls: Mutex<usize>,
}

impl GatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_call(&self) -> oneshot::Sender<ApiResult<SearchPage>> {
        let (tx, rx) = oneshot::channel();
        self.search_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn expect_detail_call(&self) -> oneshot::Sender<ApiResult<Vec<ArticleDetail>>> {
        let (tx, rx) = oneshot::channel();
        self.detail_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl SearchGateway for GatedGateway {
    async fn search(&self, _request: &SearchRequest) -> ApiResult<SearchPage> {
        let gate = {
            *self.calls.lock().unwrap() += 1;
            self.search_gates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected search call")
        };
        gate.await
            .unwrap_or_else(|_| Err(ApiError::Network("gate dropped".to_string())))
    }

    async fn fetch_details(&self, _ids: &[String]) -> ApiResult<Vec<ArticleDetail>> {
        let gate = {
            *self.calls.lock().unwrap() += 1;
            self.detail_gates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected detail call")
        };
        gate.await
            .unwrap_or_else(|_| Err(ApiError::Network("gate dropped".to_string())))
    }
}

/// Every operation fails, as a full disk would.
pub struct FailingStore;

#[async_trait]
impl SnapshotStore for FailingStore {
    async fn restore(&self) -> StoreResult<Option<Snapshot>> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    async fn persist(&self, _snapshot: &Snapshot) -> StoreResult<()> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    async fn clear(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }
}
