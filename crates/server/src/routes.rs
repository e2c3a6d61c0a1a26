//! HTTP routes.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::services::{AgencyDirectory, AgencySummary, TitleService, TitleWordCount};

#[derive(Clone)]
pub struct AppState {
    pub titles: TitleService,
    pub agencies: AgencyDirectory,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/word-count", get(agencies_handler))
        .route("/titles", get(titles_handler))
        .route("/title-counts", get(title_counts_handler))
        .route("/title-counts/:title", get(title_count_handler))
        .route("/section-counts", get(section_counts_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
    Json(json!({ "message": format!("Health is okay. Time is {}", now) }))
}

async fn agencies_handler(State(state): State<AppState>) -> Result<Json<AgencySummary>, ApiError> {
    Ok(Json(state.agencies.list().await?))
}

#[derive(Debug, Deserialize)]
struct TitlesQuery {
    get_all: Option<String>,
}

/// Upstream failures come back as a 200 payload carrying `error` and `status_code`.
async fn titles_handler(
    State(state): State<AppState>, Query(query): Query<TitlesQuery>,
) -> Result<Response, ApiError> {
    if query.get_all.as_deref() == Some("true") {
        state.titles.populate_title_sections().await?;
    }

    let response = match state.titles.title_summary().await? {
        Ok(summary) => Json(summary).into_response(),
        Err(failure) => Json(failure).into_response(),
    };
    Ok(response)
}

async fn title_counts_handler(State(state): State<AppState>) -> Result<Json<Vec<TitleWordCount>>, ApiError> {
    Ok(Json(state.titles.get_title_counts_cached(true).await?))
}

async fn title_count_handler(
    State(state): State<AppState>, Path(title): Path<String>,
) -> Result<Json<TitleWordCount>, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    Ok(Json(state.titles.get_title_words(title).await?))
}

async fn section_counts_handler(State(state): State<AppState>) -> Result<Json<Vec<u64>>, ApiError> {
    Ok(Json(state.titles.get_section_counts().await?))
}
