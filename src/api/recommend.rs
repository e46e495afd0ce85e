use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::ai;
use crate::db::MovieRepo;
use crate::server::AppState;

const RESULT_LIMIT: i64 = 10;

/// AI recommendation proxy: ask the chat provider, then ground its answer in
/// the local catalog. Title matches first, then genre matches, then the
/// popularity top list so the client always gets something to render.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<RecommendationResponse>> {
    let question = params
        .get("question")
        .map(|q| q.as_str())
        .unwrap_or("What are some good movies to watch?");

    let response = state.ai.recommendations(question).await.map_err(|e| {
        warn!("AI recommendation failed: {}", e);
        ApiError::Internal
    })?;

    let keywords = ai::extract_keywords(&response);
    info!(keyword_count = keywords.len(), "Searching catalog for AI keywords");

    let mut movies = state
        .db
        .search_movies_by_title(&keywords, RESULT_LIMIT)
        .await?;

    if movies.is_empty() {
        let genres = ai::matched_genres(&keywords);
        movies = if genres.is_empty() {
            state.db.top_movies_by_popularity(RESULT_LIMIT).await?
        } else {
            state.db.search_movies_by_genre(&genres, RESULT_LIMIT).await?
        };
    }

    Ok(Json(RecommendationResponse {
        recommendations: response,
        movies: movies.iter().map(MovieDto::from).collect(),
    }))
}
