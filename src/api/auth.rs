use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::db::{NewUser, User, UserRepo};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub exp: i64,
}

pub fn sign_token(secret: &str, user_id: i64, token_days: i64) -> Result<String, ApiError> {
    let claims = Claims {
        id: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(token_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| ApiError::Internal)
}

pub fn verify_token(secret: &str, token: &str) -> Result<i64, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;
    Ok(data.claims.id)
}

/// Authenticated caller, attached to the request by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Token required".to_string()))?
        .to_string();

    let user_id = verify_token(&state.config.auth.jwt_secret, &token)?;

    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let hashed = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST).map_err(|e| {
        warn!("Password hashing failed: {}", e);
        ApiError::Internal
    })?;

    let user = state
        .db
        .create_user(&NewUser {
            email: req.email.trim().to_string(),
            username: req.username.trim().to_string(),
            password: hashed,
            photo: None,
        })
        .await?;

    info!(user_id = user.id, "New user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if req.email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let user = state
        .db
        .get_user_by_email(&req.email)
        .await
        .map_err(|e| match e {
            crate::db::DbError::NotFound(_) => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            _ => e.into(),
        })?;

    let valid = bcrypt::verify(&req.password, &user.password).unwrap_or(false);
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let access_token = sign_token(
        &state.config.auth.jwt_secret,
        user.id,
        state.config.auth.token_days,
    )?;

    Ok(Json(TokenResponse { access_token }))
}

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

pub async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let client = reqwest::Client::new();
    let response = client
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", req.google_token.as_str())])
        .send()
        .await
        .map_err(|e| {
            warn!("Google tokeninfo request failed: {}", e);
            ApiError::Internal
        })?;

    if !response.status().is_success() {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    let payload: GoogleTokenInfo = response.json().await.map_err(|e| {
        warn!("Google tokeninfo decode failed: {}", e);
        ApiError::Internal
    })?;

    if payload.aud != state.config.auth.google_client_id {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    let user = match state.db.get_user_by_email(&payload.email).await {
        Ok(user) => user,
        Err(_) => {
            // First Google sign-in: provision an account with a throwaway
            // password; the user can only ever log in through Google.
            let hashed = bcrypt::hash(uuid::Uuid::new_v4().to_string(), bcrypt::DEFAULT_COST)
                .map_err(|_| ApiError::Internal)?;
            let username = payload
                .name
                .unwrap_or_else(|| payload.email.split('@').next().unwrap_or("user").to_string());
            state
                .db
                .create_user(&NewUser {
                    email: payload.email.clone(),
                    username,
                    password: hashed,
                    photo: None,
                })
                .await?
        }
    };

    let access_token = sign_token(
        &state.config.auth.jwt_secret,
        user.id,
        state.config.auth.token_days,
    )?;

    Ok(Json(TokenResponse { access_token }))
}
