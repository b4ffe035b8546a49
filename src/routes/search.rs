use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Uri},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::GatewayError;
use crate::models::{AppState, ArticleSummary};
use crate::search::EutilsError;

const DEFAULT_LIMIT: u32 = 5;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/esearch-summary-history/", get(search_with_history))
        .route("/api/esearch-summary-history", get(search_with_history))
        .with_state(state)
}

/// Raw query parameters. Numbers arrive as strings so a bad value can be
/// answered with a specific message.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub db: Option<String>,
    pub term: Option<String>,
    pub webenv: Option<String>,
    pub query_key: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ArticleSummary>,
    pub count: u64,
    pub webenv: Option<String>,
    pub query_key: Option<String>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_paging(params: &SearchParams) -> Result<(u32, u64), GatewayError> {
    let invalid = || GatewayError::BadRequest("Invalid 'limit' or 'offset'".to_string());
    let limit = match params.limit.as_deref() {
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| invalid())?,
        None => DEFAULT_LIMIT,
    };
    let offset = match params.offset.as_deref() {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| invalid())?,
        None => 0,
    };
    Ok((limit, offset))
}

struct PageLink<'a> {
    base: String,
    limit: u32,
    webenv: &'a str,
    query_key: &'a str,
    total: u64,
    term: Option<&'a str>,
}

impl PageLink<'_> {
    /// Continuation URL for `offset`, carrying the history token.
    fn at(&self, offset: u64) -> Option<String> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", offset.to_string()),
            ("webenv", self.webenv.to_string()),
            ("query_key", self.query_key.to_string()),
            ("total", self.total.to_string()),
        ];
        if let Some(term) = self.term {
            pairs.push(("term", term.to_string()));
        }
        reqwest::Url::parse_with_params(&self.base, &pairs)
            .ok()
            .map(|url| url.to_string())
    }
}

async fn search_with_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    let (limit, offset) = parse_paging(&params)?;
    let db = non_empty(params.db.clone()).unwrap_or_else(|| state.config.ncbi.db.clone());
    let term = non_empty(params.term.clone());

    let (count, webenv, query_key) = match (non_empty(params.webenv), non_empty(params.query_key)) {
        (Some(webenv), Some(query_key)) => {
            info!(offset, limit, "Paging by history token");
            let count = state.eutils.esearch_history(&db, &webenv, &query_key).await?;
            (count, webenv, query_key)
        }
        _ => {
            let term = term
                .as_deref()
                .ok_or_else(|| GatewayError::BadRequest("Missing 'term' parameter".to_string()))?;
            info!(term = %term, offset, limit, "New search");
            let search = state.eutils.esearch_term(&db, term).await?;
            match (search.webenv, search.query_key) {
                (Some(webenv), Some(query_key)) => (search.count, webenv, query_key),
                _ => {
                    return Err(EutilsError::Parse {
                        stage: "ESearch",
                        message: "no history token in response".to_string(),
                    }
                    .into())
                }
            }
        }
    };

    let results = state
        .eutils
        .esummary(&db, &webenv, &query_key, offset, limit)
        .await?;

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let link = PageLink {
        base: format!("http://{}{}", host, uri.path()),
        limit,
        webenv: &webenv,
        query_key: &query_key,
        total: count,
        term: term.as_deref(),
    };
    let next = offset
        .checked_add(u64::from(limit))
        .filter(|next_offset| *next_offset < count)
        .and_then(|next_offset| link.at(next_offset));
    let previous = if offset > 0 {
        link.at(offset.saturating_sub(u64::from(limit)))
    } else {
        None
    };

    Ok(Json(SearchResponse {
        results,
        count,
        webenv: Some(webenv.clone()),
        query_key: Some(query_key.clone()),
        next,
        previous,
    }))
}
