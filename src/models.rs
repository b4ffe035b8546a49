use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::search::EutilsClient;

/// Shared state for the gateway routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub eutils: EutilsClient,
}

/// One row of a result page, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub year: String,
    /// Display string, names joined by ", ".
    pub authors: String,
    pub url: String,
}

/// Full record shown in the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(default)]
    pub id: String,
    pub pmid: String,
    pub title: String,
    pub publication_year: String,
    pub journal: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub mesh_terms: Vec<String>,
}

impl ArticleDetail {
    /// `id` falls back to `pmid` when the gateway left it blank.
    pub fn record_id(&self) -> &str {
        if self.id.is_empty() {
            &self.pmid
        } else {
            &self.id
        }
    }
}

/// Continuation handle issued by the history server for a single term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryToken {
    pub webenv: String,
    pub query_key: String,
}

impl HistoryToken {
    pub fn new(webenv: impl Into<String>, query_key: impl Into<String>) -> Self {
        Self {
            webenv: webenv.into(),
            query_key: query_key.into(),
        }
    }

    /// Both halves must be present and non-empty to form a token.
    pub fn from_parts(webenv: Option<String>, query_key: Option<String>) -> Option<Self> {
        match (webenv, query_key) {
            (Some(webenv), Some(query_key)) if !webenv.is_empty() && !query_key.is_empty() => {
                Some(Self { webenv, query_key })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub upstream: String,
}
