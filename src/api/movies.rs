use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::db::{Movie, MovieRepo};
use crate::server::AppState;

pub async fn list_movies(State(state): State<AppState>) -> ApiResult<Json<Vec<MovieDto>>> {
    let movies = state.db.list_movies().await?;
    Ok(Json(movies.iter().map(MovieDto::from).collect()))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MovieDto>> {
    let movie = state
        .db
        .get_movie(id)
        .await
        .map_err(|_| ApiError::NotFound("Movie not found".to_string()))?;
    Ok(Json(MovieDto::from(&movie)))
}

pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<Vec<GenreCount>>> {
    let movies = state.db.list_movies().await?;
    Ok(Json(count_genres(&movies)))
}

/// Genre counts across the catalog, most common first, ties alphabetical.
fn count_genres(movies: &[Movie]) -> Vec<GenreCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for movie in movies {
        for genre in movie.genre_list() {
            *counts.entry(genre).or_insert(0) += 1;
        }
    }

    let mut genres: Vec<GenreCount> = counts
        .into_iter()
        .map(|(genre, count)| GenreCount { genre, count })
        .collect();

    genres.sort_by(|a, b| b.count.cmp(&a.count).then(a.genre.cmp(&b.genre)));
    genres
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_with_genres(id: i64, genres: &str) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            description: None,
            posterfilm: None,
            trailer: None,
            release_date: None,
            genres: genres.to_string(),
            vote_average: None,
            popularity: None,
            language: None,
            vote_count: None,
        }
    }

    #[test]
    fn genres_sorted_by_count_then_name() {
        let movies = vec![
            movie_with_genres(1, r#"["Drama", "Action"]"#),
            movie_with_genres(2, r#"["Drama", "Comedy"]"#),
            movie_with_genres(3, r#"["Action"]"#),
        ];

        let genres = count_genres(&movies);
        assert_eq!(genres[0].genre, "Action");
        assert_eq!(genres[0].count, 2);
        assert_eq!(genres[1].genre, "Drama");
        assert_eq!(genres[1].count, 2);
        assert_eq!(genres[2].genre, "Comedy");
        assert_eq!(genres[2].count, 1);
    }

    #[test]
    fn malformed_genre_json_counts_nothing() {
        let movies = vec![movie_with_genres(1, "not json")];
        assert!(count_genres(&movies).is_empty());
    }
}
