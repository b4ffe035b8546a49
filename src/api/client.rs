//! HTTP implementation of [`SearchGateway`] over the gateway's JSON API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ApiError, ApiResult, SearchGateway, SearchPage, SearchQuery, SearchRequest};
use crate::config::ClientConfig;
use crate::models::{ArticleDetail, ArticleSummary, HistoryToken};

const SEARCH_PATH: &str = "esearch-summary-history/";
const DETAILS_PATH: &str = "efetch/";

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    results: Vec<ArticleSummary>,
    #[serde(default)]
    count: Value,
    #[serde(default)]
    webenv: Option<String>,
    #[serde(default)]
    query_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the gateway's search and detail endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Turn a transport result into a success response or a classified error.
    async fn check(result: reqwest::Result<Response>) -> ApiResult<Response> {
        let response = result.map_err(|e| {
            warn!(error = %e, "Gateway unreachable");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
            .map(|b| b.error);

        let error = ApiError::from_status(status, message);
        warn!(status = status.as_u16(), kind = %error.kind(), "Gateway call failed");
        Err(error)
    }

    /// A 2xx whose body does not decode is reported as a server fault.
    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| ApiError::Server {
            status,
            message: Some(format!("malformed response body: {}", e)),
        })
    }
}

#[async_trait]
impl SearchGateway for ApiClient {
    async fn search(&self, request: &SearchRequest) -> ApiResult<SearchPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("limit", request.limit.to_string()),
            ("offset", request.offset.to_string()),
        ];
        match &request.query {
            SearchQuery::Term(term) => params.push(("term", term.clone())),
            SearchQuery::History(token) => {
                params.push(("webenv", token.webenv.clone()));
                params.push(("query_key", token.query_key.clone()));
            }
        }

        debug!(
            by_token = request.query.is_by_token(),
            offset = request.offset,
            limit = request.limit,
            "Sending search request"
        );

        let response = Self::check(
            self.client
                .get(self.endpoint(SEARCH_PATH))
                .query(&params)
                .send()
                .await,
        )
        .await?;
        let body: SearchResponseBody = Self::decode(response).await?;

        let page = SearchPage {
            count: coerce_count(&body.count),
            token: HistoryToken::from_parts(body.webenv, body.query_key),
            results: body.results,
        };
        info!(rows = page.results.len(), count = page.count, "Search page received");
        Ok(page)
    }

    async fn fetch_details(&self, ids: &[String]) -> ApiResult<Vec<ArticleDetail>> {
        if ids.is_empty() {
            return Err(ApiError::Client {
                status: 400,
                message: Some("at least one id is required".to_string()),
            });
        }

        // One `ids=` pair per id, in input order.
        let params: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();

        debug!(count = ids.len(), "Fetching article details");
        let response = Self::check(
            self.client
                .get(self.endpoint(DETAILS_PATH))
                .query(&params)
                .send()
                .await,
        )
        .await?;
        Self::decode(response).await
    }
}

/// Coerce the wire `count` (number or numeric string) to a non-negative
/// integer. Missing, negative or unparseable values become 0.
pub fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(non_negative_trunc))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(non_negative_trunc))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn non_negative_trunc(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 {
        Some(f.trunc() as u64)
    } else {
        None
    }
}
