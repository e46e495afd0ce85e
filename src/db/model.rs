use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserStatus {
    Basic,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub photo: String,
    pub status: UserStatus,
    pub created: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub posterfilm: Option<String>,
    pub trailer: Option<String>,
    pub release_date: Option<String>,
    /// JSON array of genre names, stored as TEXT.
    pub genres: String,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub language: Option<String>,
    pub vote_count: Option<i64>,
}

impl Movie {
    pub fn genre_list(&self) -> Vec<String> {
        serde_json::from_str(&self.genres).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub user_id: i64,
    pub amount: i64,
    pub status: OrderStatus,
    pub paid_date: Option<DateTime<Utc>>,
}

/// Outcome of the paid-transition write. `AlreadyPaid` means the conditional
/// update matched zero rows: some other call settled this order first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidTransition {
    Applied,
    AlreadyPaid,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;
