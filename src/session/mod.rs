//! Search Session
//!
//! The stateful core of the navigator:
//! - [`SearchController`] decides between a fresh by-term query and a cheap
//!   by-token page fetch, owns the history token lifecycle and publishes
//!   the session as immutable values on a watch channel.
//! - [`DetailCoordinator`] fetches one record's full detail on demand.
//! - [`SnapshotStore`] persists the last successful session so it survives a
//!   restart.
//!
//! Responses are tagged with a generation number; a response that arrives
//! after a newer request was issued is dropped instead of overwriting state.

pub mod controller;
pub mod detail;
pub mod error;
pub mod pagination;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{SearchController, SearchOutcome};
pub use detail::{DetailCoordinator, DetailOutcome, DetailState};
pub use error::{SessionError, SessionResult};
pub use pagination::{clamp_page, offset_for, total_pages};
pub use store::{FileSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore, StoreError};

use crate::config::PAGE_SIZE;
use crate::models::{ArticleSummary, HistoryToken};

/// Working state of the current search, replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    pub term: String,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    /// Valid only for `term`.
    pub history_token: Option<HistoryToken>,
    pub results: Vec<ArticleSummary>,
    pub total_count: u64,
    pub loading: bool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            term: String::new(),
            page: 1,
            page_size: PAGE_SIZE,
            history_token: None,
            results: Vec::new(),
            total_count: 0,
            loading: false,
        }
    }
}

impl SearchSession {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn has_term(&self) -> bool {
        !self.term.is_empty()
    }

    /// Rebuild a session from a restored snapshot. Nothing is validated
    /// against the remote service.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            history_token: snapshot.history_token(),
            term: snapshot.term,
            page: snapshot.page.max(1),
            page_size: PAGE_SIZE,
            results: snapshot.results,
            total_count: snapshot.total_count,
            loading: false,
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            term: self.term.clone(),
            page: self.page,
            page_size: Some(self.page_size),
            webenv: self.history_token.as_ref().map(|t| t.webenv.clone()),
            query_key: self.history_token.as_ref().map(|t| t.query_key.clone()),
            results: self.results.clone(),
            total_count: self.total_count,
            saved_at: Some(chrono::Utc::now()),
        }
    }
}
