use axum::{body::Bytes, extract::State, Extension, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CandidateItem, ContentKind, RecommendationPayload, RecommendationRequest, ResultSet},
    routes::AppState,
    services::{links, recommendations},
};

const FALLBACK_NOTE: &str = "fallback";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub title: String,
    pub creator: String,
    pub year: String,
    pub reason: String,
    pub external_url: String,
    pub detail_url: String,
}

impl ItemResponse {
    fn new(kind: ContentKind, item: CandidateItem) -> Self {
        let query = links::search_query(&item, false);
        Self {
            external_url: links::external_url(kind, &query),
            detail_url: links::detail_url(&query),
            title: item.title,
            creator: item.creator,
            year: item.year,
            reason: item.reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub kind: ContentKind,
    pub items: Vec<ItemResponse>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

impl From<ResultSet> for RecommendationResponse {
    fn from(result: ResultSet) -> Self {
        let kind = result.kind;
        Self {
            kind,
            items: result
                .items
                .into_iter()
                .map(|item| ItemResponse::new(kind, item))
                .collect(),
            degraded: result.degraded,
            note: result.degraded.then_some(FALLBACK_NOTE),
        }
    }
}

/// Handler for the recommendation endpoint
///
/// The body is read as raw bytes so that malformed JSON is reported as a client error
/// like any other invalid input.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> AppResult<Json<RecommendationResponse>> {
    let gateway = state.gateway.as_deref().ok_or_else(|| {
        tracing::error!(request_id = %request_id, "Refusing request: GEMINI_API_KEY missing");
        AppError::Configuration("Missing GEMINI_API_KEY".to_string())
    })?;

    let payload: RecommendationPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid JSON body: {}", e)))?;
    let request = RecommendationRequest::try_from(payload).inspect_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "Rejected recommendation request");
    })?;

    tracing::info!(
        request_id = %request_id,
        kind = %request.kind,
        "Processing recommendation request"
    );

    let result = recommendations::recommend(gateway, &state.policy, &request).await;

    Ok(Json(RecommendationResponse::from(result)))
}
