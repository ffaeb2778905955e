use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AuthUser;
use crate::services::auth::{hash_password, verify_password};
use crate::state::AppState;

/// パスワード変更リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub password: String,
}

/// パスワード変更レスポンス
#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub message: String,
}

/// パスワード変更ハンドラー
///
/// PATCH /api/users/changepassword（要認証）
///
/// 現在のパスワードの照合に成功した場合のみ更新する。
/// 新旧が同一の場合は `PasswordUnchanged` でハッシュを変更しない。
///
/// # Security
/// - 新旧パスワードはログに出力しない
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AppError> {
    // バリデーション
    validate_change_password_request(&request)?;

    let user = state
        .user_repo
        .find_by_id(auth.id)
        .await?
        .ok_or(AppError::NotFound)?;

    // 現在のパスワードを照合
    if !verify_password(&request.old_password, &user.password_hash) {
        tracing::warn!(user_id = %auth.id, "パスワード変更失敗: 現在のパスワード不一致");
        return Err(AppError::InvalidCredentials);
    }

    // 新旧同一チェック
    if request.password == request.old_password {
        return Err(AppError::PasswordUnchanged);
    }

    let password_hash = hash_password(&request.password)?;
    state
        .user_repo
        .update_password(auth.id, &password_hash)
        .await?;

    tracing::info!(user_id = %auth.id, "パスワード変更完了");

    Ok(Json(ChangePasswordResponse {
        message: "Password change successful".to_string(),
    }))
}

/// パスワード変更リクエストのバリデーション
fn validate_change_password_request(request: &ChangePasswordRequest) -> Result<(), AppError> {
    if request.old_password.is_empty() {
        return Err(AppError::MissingField("oldPassword"));
    }
    if request.password.is_empty() {
        return Err(AppError::MissingField("password"));
    }
    // 新パスワード: 6文字以上
    if request.password.chars().count() < 6 {
        return Err(AppError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(old_password: &str, password: &str) -> ChangePasswordRequest {
        ChangePasswordRequest {
            old_password: old_password.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_old_password() {
        let result = validate_change_password_request(&request("", "secret2"));
        assert!(matches!(result, Err(AppError::MissingField("oldPassword"))));
    }

    #[test]
    fn test_validate_empty_new_password() {
        let result = validate_change_password_request(&request("secret1", ""));
        assert!(matches!(result, Err(AppError::MissingField("password"))));
    }

    #[test]
    fn test_validate_short_new_password() {
        let result = validate_change_password_request(&request("secret1", "five5"));
        assert!(matches!(result, Err(AppError::WeakPassword)));
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_change_password_request(&request("secret1", "secret2"));
        assert!(result.is_ok());
    }

    // 同一パスワードの拒否はハンドラー本体で照合後に行う
    // （バリデーションではなくビジネスルールのため）
    #[test]
    fn test_validate_allows_same_passwords_at_validation_stage() {
        let result = validate_change_password_request(&request("secret1", "secret1"));
        assert!(result.is_ok());
    }
}
