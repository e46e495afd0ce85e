use axum::{extract::State, Extension, Json};

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::types::*;
use crate::db::UserRepo;
use crate::server::AppState;

pub async fn get_profile(Extension(user): Extension<CurrentUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(&user.0))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let updated = state
        .db
        .update_user_profile(user.0.id, req.username.as_deref(), req.photo.as_deref())
        .await?;

    Ok(Json(ProfileResponse::from(&updated)))
}
