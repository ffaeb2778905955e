use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AuthUser;
use crate::models::User;
use crate::state::AppState;

/// プロフィールレスポンス
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            photo: user.photo,
            role: user.role,
        }
    }
}

/// プロフィール取得ハンドラー
///
/// GET /api/users/getuser（要認証）
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .user_repo
        .find_by_id(auth.id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

/// プロフィール更新リクエスト
///
/// 省略されたフィールドは現在値を保持する（部分更新）。
/// email はこの経路では変更できない。
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub photo: Option<String>,
    pub role: Option<String>,
}

/// プロフィール更新ハンドラー
///
/// PATCH /api/users/updateuser（要認証）
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .user_repo
        .update_profile(
            auth.id,
            request.name.as_deref(),
            request.photo.as_deref(),
            request.role.as_deref(),
        )
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %auth.id, "プロフィール更新完了");

    Ok(Json(user.into()))
}
