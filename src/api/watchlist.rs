use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::db::{DbError, MovieRepo, WatchlistRepo};
use crate::server::AppState;

pub async fn get_watchlist(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<MovieDto>>> {
    let movies = state.db.get_watchlist_movies(user.0.id).await?;
    Ok(Json(movies.iter().map(MovieDto::from).collect()))
}

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddWatchlistRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let movie_id = req
        .movie_id
        .ok_or_else(|| ApiError::BadRequest("Movie id is required".to_string()))?;

    // The movie must exist before it can be listed.
    state
        .db
        .get_movie(movie_id)
        .await
        .map_err(|_| ApiError::NotFound("Movie not found".to_string()))?;

    state
        .db
        .add_to_watchlist(user.0.id, movie_id)
        .await
        .map_err(|e| match e {
            DbError::AlreadyExists(_) => {
                ApiError::BadRequest("Movie already in watchlist".to_string())
            }
            _ => e.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Movie added to watchlist".to_string(),
        }),
    ))
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .db
        .remove_from_watchlist(user.0.id, movie_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => ApiError::NotFound("Movie not in watchlist".to_string()),
            _ => e.into(),
        })?;

    Ok(Json(MessageResponse {
        message: "Movie removed from watchlist".to_string(),
    }))
}
