//! Search session controller.
//!
//! Decision rule for every search:
//! - the term changed, or page 1 was asked for: fresh query by term
//! - same term, page > 1: continue by history token, term is not re-sent
//!
//! A term change drops the history token immediately; the token issued by a
//! later response replaces it. Responses without a token keep the previous
//! one.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::pagination::{clamp_page, offset_for};
use super::store::SnapshotStore;
use super::{SearchSession, SessionError, SessionResult};
use crate::api::{SearchGateway, SearchQuery, SearchRequest};
use crate::config::PAGE_SIZE;
use crate::models::HistoryToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response replaced the session. `persisted` is false when the
    /// snapshot write failed.
    Applied { persisted: bool },
    /// A newer request was issued before this one resolved; its response was
    /// dropped.
    Superseded,
}

pub struct SearchController<G, S> {
    gateway: G,
    store: S,
    session: watch::Sender<SearchSession>,
    generation: AtomicU64,
}

impl<G: SearchGateway, S: SnapshotStore> SearchController<G, S> {
    pub fn new(gateway: G, store: S) -> Self {
        let (session, _) = watch::channel(SearchSession::default());
        Self {
            gateway,
            store,
            session,
            generation: AtomicU64::new(0),
        }
    }

    /// Current session value.
    pub fn session(&self) -> SearchSession {
        self.session.borrow().clone()
    }

    /// Receive every new session value.
    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.session.subscribe()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the persisted snapshot into the session. No network call is
    /// made and the stored history token is trusted as-is. Returns whether
    /// a snapshot was applied.
    pub async fn hydrate(&self) -> bool {
        let snapshot = match self.store.restore().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No stored session to restore");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session snapshot");
                return false;
            }
        };

        if let Some(stored) = snapshot.page_size {
            if stored != PAGE_SIZE {
                warn!(stored, current = PAGE_SIZE, "Snapshot was taken with a different page size");
            }
        }

        info!(term = %snapshot.term, page = snapshot.page, "Session restored from snapshot");
        self.session.send_replace(SearchSession::from_snapshot(snapshot));
        true
    }

    /// Run a search for `term` at `page`.
    ///
    /// `override_token` is only consulted for a continuation (same term,
    /// page > 1), where it takes precedence over the stored token. Fresh
    /// queries always go by term.
    pub async fn run_search(
        &self,
        term: &str,
        page: u32,
        override_token: Option<HistoryToken>,
    ) -> SessionResult<SearchOutcome> {
        if term.trim().is_empty() {
            return Err(SessionError::EmptyTerm);
        }
        if page == 0 {
            return Err(SessionError::InvalidPage);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut query = SearchQuery::Term(term.to_string());
        let mut page_size = PAGE_SIZE;

        self.session.send_modify(|s| {
            let term_changed = s.term != term;
            let is_new_query = term_changed || page == 1;

            if term_changed {
                s.history_token = None;
            }
            if !is_new_query {
                match override_token.or_else(|| s.history_token.clone()) {
                    Some(token) => query = SearchQuery::History(token),
                    None => warn!(term = %term, page, "No history token for paged request, searching by term"),
                }
            }

            s.term = term.to_string();
            s.loading = true;
            page_size = s.page_size;
        });

        let request = SearchRequest {
            offset: offset_for(page, page_size),
            limit: page_size,
            query,
        };
        info!(
            term = %term,
            page,
            offset = request.offset,
            by_token = request.query.is_by_token(),
            generation,
            "Running search"
        );

        let result = self.gateway.search(&request).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(term = %term, page, generation, "Dropping response for superseded search");
            return Ok(SearchOutcome::Superseded);
        }

        let page_data = match result {
            Ok(page_data) => page_data,
            Err(e) => {
                // term and page stay as requested; the boundary decides what
                // to do with the error.
                self.session.send_modify(|s| s.loading = false);
                return Err(e.into());
            }
        };

        self.session.send_modify(|s| {
            s.results = page_data.results;
            s.page = page;
            s.total_count = page_data.count;
            if let Some(token) = page_data.token {
                s.history_token = Some(token);
            }
            s.loading = false;
        });

        let snapshot = self.session.borrow().to_snapshot();
        let persisted = match self.store.persist(&snapshot).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to save session snapshot");
                false
            }
        };

        Ok(SearchOutcome::Applied { persisted })
    }

    /// Move to `page` of the current term, clamped to the known page range.
    /// `Ok(None)` when there is no current term.
    pub async fn go_to_page(&self, page: u32) -> SessionResult<Option<SearchOutcome>> {
        let current = self.session();
        if !current.has_term() {
            return Ok(None);
        }

        let target = clamp_page(page, current.total_pages());
        if target != page {
            debug!(requested = page, target, "Clamped page request");
        }
        self.run_search(&current.term, target, None).await.map(Some)
    }

    pub async fn next_page(&self) -> SessionResult<Option<SearchOutcome>> {
        let page = self.session.borrow().page.saturating_add(1);
        self.go_to_page(page).await
    }

    pub async fn previous_page(&self) -> SessionResult<Option<SearchOutcome>> {
        let page = self.session.borrow().page.saturating_sub(1);
        self.go_to_page(page).await
    }

    /// Re-run the stored search from page 1. `Ok(None)` when nothing is
    /// stored.
    pub async fn go_to_first_page(&self) -> SessionResult<Option<SearchOutcome>> {
        let snapshot = match self.store.restore().await {
            Ok(Some(snapshot)) if !snapshot.term.is_empty() => snapshot,
            Ok(_) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Cannot read snapshot for first page");
                return Ok(None);
            }
        };

        let token = snapshot.history_token();
        self.run_search(&snapshot.term, 1, token).await.map(Some)
    }

    /// Drop the session and the stored snapshot. Outstanding responses are
    /// discarded when they arrive.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.session.send_replace(SearchSession::default());
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear session snapshot");
        }
        info!("Session reset");
    }
}
