use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::info;

use super::GatewayError;
use crate::models::{AppState, ArticleDetail};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/efetch/", get(fetch_details))
        .route("/api/efetch", get(fetch_details))
        .with_state(state)
}

/// `ids` is repeated once per id, so the query is taken as raw pairs.
async fn fetch_details(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<ArticleDetail>>, GatewayError> {
    let ids: Vec<String> = pairs
        .iter()
        .filter(|(key, value)| key == "ids" && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
        .collect();
    if ids.is_empty() {
        return Err(GatewayError::BadRequest(
            "Missing 'ids' query parameter".to_string(),
        ));
    }

    let db = pairs
        .iter()
        .find(|(key, value)| key == "db" && !value.is_empty())
        .map(|(_, value)| value.clone())
        .unwrap_or_else(|| state.config.ncbi.db.clone());

    info!(count = ids.len(), "Fetching article details");
    let details = state.eutils.efetch(&db, &ids).await?;
    Ok(Json(details))
}
