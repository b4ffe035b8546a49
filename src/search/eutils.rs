//! NCBI E-utilities client
//!
//! ## Search Strategy
//!
//! 1. **First page**: `esearch` with `usehistory=y` and `retmax=0`. The
//!    history server keeps the matching id list and hands back a `WebEnv`
//!    and `query_key` alongside the total count.
//! 2. **Later pages**: `esearch` by `WebEnv` + `query_key` (count only), then
//!    `esummary` with `retstart`/`retmax` over the stored result set.
//! 3. **Details**: `efetch` in XML, parsed by [`parse_pubmed_articles`].

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::pubmed_xml::parse_pubmed_articles;
use crate::api::coerce_count;
use crate::config::NcbiConfig;
use crate::models::{ArticleDetail, ArticleSummary};

pub const NCBI_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const PUBMED_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Errors that can occur while talking to E-utilities
#[derive(Debug, Error)]
pub enum EutilsError {
    #[error("{stage} failed")]
    Status { stage: &'static str, status: u16 },

    #[error("{stage} request failed: {message}")]
    Request { stage: &'static str, message: String },

    #[error("failed to parse {stage} response: {message}")]
    Parse { stage: &'static str, message: String },
}

/// Result of an `esearch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub count: u64,
    pub webenv: Option<String>,
    pub query_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EutilsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EutilsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn from_config(config: &NcbiConfig) -> Self {
        Self::new(config.base_url.clone()).with_api_key(config.api_key.clone())
    }

    /// An API key raises the upstream quota from 3 to 10 requests per second.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(
        &self,
        stage: &'static str,
        endpoint: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<reqwest::Response, EutilsError> {
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| EutilsError::Request {
                stage,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(stage, status = status.as_u16(), "E-utilities call failed");
            return Err(EutilsError::Status {
                stage,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json(
        &self,
        stage: &'static str,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Value, EutilsError> {
        self.get(stage, endpoint, params)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| EutilsError::Parse {
                stage,
                message: e.to_string(),
            })
    }

    /// Run a fresh search and open a history-server result set for it.
    pub async fn esearch_term(&self, db: &str, term: &str) -> Result<SearchInfo, EutilsError> {
        info!(db = %db, term = %term, "Running esearch with history");

        let body = self
            .get_json(
                "ESearch",
                "esearch.fcgi",
                vec![
                    ("db", db.to_string()),
                    ("term", term.to_string()),
                    ("retmax", "0".to_string()),
                    ("retmode", "json".to_string()),
                    ("usehistory", "y".to_string()),
                ],
            )
            .await?;

        Ok(parse_esearch(&body))
    }

    /// Count of an existing result set. The token itself is not re-issued.
    pub async fn esearch_history(
        &self,
        db: &str,
        webenv: &str,
        query_key: &str,
    ) -> Result<u64, EutilsError> {
        debug!(db = %db, query_key = %query_key, "Running esearch count by history");

        let body = self
            .get_json(
                "ESearch (count only)",
                "esearch.fcgi",
                vec![
                    ("db", db.to_string()),
                    ("WebEnv", webenv.to_string()),
                    ("query_key", query_key.to_string()),
                    ("retmode", "json".to_string()),
                    ("retmax", "0".to_string()),
                ],
            )
            .await?;

        Ok(parse_esearch(&body).count)
    }

    /// One page of summaries from a history-server result set.
    pub async fn esummary(
        &self,
        db: &str,
        webenv: &str,
        query_key: &str,
        retstart: u64,
        retmax: u32,
    ) -> Result<Vec<ArticleSummary>, EutilsError> {
        debug!(db = %db, retstart, retmax, "Running esummary by history");

        let body = self
            .get_json(
                "ESummary",
                "esummary.fcgi",
                vec![
                    ("db", db.to_string()),
                    ("WebEnv", webenv.to_string()),
                    ("query_key", query_key.to_string()),
                    ("retstart", retstart.to_string()),
                    ("retmax", retmax.to_string()),
                    ("retmode", "json".to_string()),
                ],
            )
            .await?;

        let summaries = parse_esummary(&body);
        info!(count = summaries.len(), "ESummary completed");
        Ok(summaries)
    }

    /// Full records for `ids`, in the order the upstream returns them.
    pub async fn efetch(&self, db: &str, ids: &[String]) -> Result<Vec<ArticleDetail>, EutilsError> {
        info!(db = %db, count = ids.len(), "Running efetch");

        let xml = self
            .get(
                "EFetch",
                "efetch.fcgi",
                vec![
                    ("db", db.to_string()),
                    ("id", ids.join(",")),
                    ("retmode", "xml".to_string()),
                ],
            )
            .await?
            .text()
            .await
            .map_err(|e| EutilsError::Request {
                stage: "EFetch",
                message: e.to_string(),
            })?;

        parse_pubmed_articles(&xml).map_err(|e| EutilsError::Parse {
            stage: "EFetch",
            message: e.to_string(),
        })
    }
}

fn parse_esearch(body: &Value) -> SearchInfo {
    let result = body.get("esearchresult");
    let field = |name: &str| {
        result
            .and_then(|r| r.get(name))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    SearchInfo {
        count: result
            .and_then(|r| r.get("count"))
            .map(coerce_count)
            .unwrap_or(0),
        webenv: field("webenv"),
        query_key: field("querykey"),
    }
}

fn parse_esummary(body: &Value) -> Vec<ArticleSummary> {
    let Some(result) = body.get("result") else {
        return Vec::new();
    };

    let uids = result
        .get("uids")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>())
        .unwrap_or_default();

    uids.into_iter()
        .map(|uid| {
            let doc = result.get(uid);
            let str_field = |name: &str| {
                doc.and_then(|d| d.get(name))
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };

            let title = str_field("title").unwrap_or("No title available").to_string();

            // pubdate looks like "2019 Sep 12"; keep the year.
            let year = str_field("pubdate")
                .and_then(|d| d.split_whitespace().next())
                .unwrap_or("Unknown")
                .to_string();

            let names: Vec<&str> = doc
                .and_then(|d| d.get("authors"))
                .and_then(|v| v.as_array())
                .map(|authors| {
                    authors
                        .iter()
                        .filter_map(|a| a.get("name").and_then(|n| n.as_str()))
                        .filter(|n| !n.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let authors = if names.is_empty() {
                "Author information not available".to_string()
            } else {
                names.join(", ")
            };

            ArticleSummary {
                id: uid.to_string(),
                title,
                year,
                authors,
                url: format!("{}/{}/", PUBMED_URL, uid),
            }
        })
        .collect()
}
