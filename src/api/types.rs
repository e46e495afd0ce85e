use serde::{Deserialize, Serialize};

use crate::db::{Movie, User, UserStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub google_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub photo: String,
    pub status: UserStatus,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            photo: user.photo.clone(),
            status: user.status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Movie as served to clients: genres decoded from their stored JSON text.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub posterfilm: Option<String>,
    pub trailer: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub language: Option<String>,
    #[serde(rename = "voteCount")]
    pub vote_count: Option<i64>,
}

impl From<&Movie> for MovieDto {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            description: movie.description.clone(),
            posterfilm: movie.posterfilm.clone(),
            trailer: movie.trailer.clone(),
            release_date: movie.release_date.clone(),
            genres: movie.genre_list(),
            vote_average: movie.vote_average,
            popularity: movie.popularity,
            language: movie.language.clone(),
            vote_count: movie.vote_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchlistRequest {
    #[serde(default)]
    pub movie_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiatePaymentResponse {
    #[serde(rename = "transactionToken")]
    pub transaction_token: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: String,
    pub movies: Vec<MovieDto>,
}
