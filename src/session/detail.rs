//! Detail fetch coordinator.
//!
//! `Closed -> Loading -> Shown -> Closed`, with `Loading -> Closed` when the
//! view closes before the response lands. A late response for a closed or
//! replaced request is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{SessionError, SessionResult};
use crate::api::SearchGateway;
use crate::models::ArticleDetail;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailState {
    #[default]
    Closed,
    Loading { id: String },
    Shown(ArticleDetail),
}

impl DetailState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DetailState::Loading { .. })
    }

    pub fn article(&self) -> Option<&ArticleDetail> {
        match self {
            DetailState::Shown(detail) => Some(detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Shown,
    /// Closed or replaced while in flight.
    Discarded,
}

pub struct DetailCoordinator<G> {
    gateway: G,
    state: watch::Sender<DetailState>,
    generation: AtomicU64,
}

impl<G: SearchGateway> DetailCoordinator<G> {
    pub fn new(gateway: G) -> Self {
        let (state, _) = watch::channel(DetailState::Closed);
        Self {
            gateway,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    /// Fetch and show the full record for `id`.
    pub async fn open(&self, id: &str) -> SessionResult<DetailOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(DetailState::Loading { id: id.to_string() });
        info!(id = %id, "Loading article detail");

        let result = self.gateway.fetch_details(&[id.to_string()]).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(id = %id, "Dropping detail response for closed request");
            return Ok(DetailOutcome::Discarded);
        }

        let details = match result {
            Ok(details) => details,
            Err(e) => {
                self.state.send_replace(DetailState::Closed);
                return Err(e.into());
            }
        };

        // Only one id was asked for, but match on it rather than trusting order.
        let detail = details
            .iter()
            .find(|d| d.record_id() == id || d.pmid == id)
            .or_else(|| details.first())
            .cloned();

        match detail {
            Some(detail) => {
                self.state.send_replace(DetailState::Shown(detail));
                Ok(DetailOutcome::Shown)
            }
            None => {
                self.state.send_replace(DetailState::Closed);
                Err(SessionError::DetailNotFound(id.to_string()))
            }
        }
    }

    /// Dismiss the detail view. An in-flight fetch is not cancelled, its
    /// result is ignored.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(DetailState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::session::testing::{detail, GatedGateway, ScriptedGateway};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_open_shows_detail() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_details(Ok(vec![detail("42")]));
        let coordinator = DetailCoordinator::new(gateway.clone());

        assert_eq!(coordinator.open("42").await, Ok(DetailOutcome::Shown));
        assert_eq!(gateway.detail_requests(), vec![vec!["42".to_string()]]);
        assert_eq!(coordinator.state().article().map(|d| d.pmid.as_str()), Some("42"));

        coordinator.close();
        assert_eq!(coordinator.state(), DetailState::Closed);
    }

    #[tokio::test]
    async fn test_open_prefers_matching_record() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_details(Ok(vec![detail("7"), detail("42")]));
        let coordinator = DetailCoordinator::new(gateway);

        coordinator.open("42").await.unwrap();
        assert_eq!(coordinator.state().article().unwrap().pmid, "42");
    }

    #[tokio::test]
    async fn test_empty_response_is_not_found() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_details(Ok(vec![]));
        let coordinator = DetailCoordinator::new(gateway);

        assert_eq!(
            coordinator.open("404").await,
            Err(SessionError::DetailNotFound("404".into()))
        );
        assert_eq!(coordinator.state(), DetailState::Closed);
    }

    #[tokio::test]
    async fn test_error_closes_and_propagates() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_details(Err(ApiError::Server { status: 500, message: None }));
        let coordinator = DetailCoordinator::new(gateway);

        let err = coordinator.open("1").await.unwrap_err();
        assert!(matches!(err.api(), Some(ApiError::Server { status: 500, .. })));
        assert_eq!(coordinator.state(), DetailState::Closed);
    }

    #[tokio::test]
    async fn test_close_while_loading_drops_response() {
        let gateway = Arc::new(GatedGateway::new());
        let coordinator = Arc::new(DetailCoordinator::new(gateway.clone()));
        let release = gateway.expect_detail_call();

        let task = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.open("42").await })
        };
        gateway.wait_for_calls(1).await;
        assert!(coordinator.state().is_loading());

        coordinator.close();
        release.send(Ok(vec![detail("42")])).unwrap();

        assert_eq!(task.await.unwrap(), Ok(DetailOutcome::Discarded));
        assert_eq!(coordinator.state(), DetailState::Closed);
    }

    #[tokio::test]
    async fn test_newer_selection_wins() {
        let gateway = Arc::new(GatedGateway::new());
        let coordinator = Arc::new(DetailCoordinator::new(gateway.clone()));
        let first_release = gateway.expect_detail_call();
        let second_release = gateway.expect_detail_call();

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.open("1").await })
        };
        gateway.wait_for_calls(1).await;
        let second = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.open("2").await })
        };
        gateway.wait_for_calls(2).await;

        second_release.send(Ok(vec![detail("2")])).unwrap();
        assert_eq!(second.await.unwrap(), Ok(DetailOutcome::Shown));
        first_release.send(Ok(vec![detail("1")])).unwrap();
        assert_eq!(first.await.unwrap(), Ok(DetailOutcome::Discarded));

        assert_eq!(coordinator.state().article().unwrap().pmid, "2");
    }
}
