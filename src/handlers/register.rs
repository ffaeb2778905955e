use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::hash_password;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
    pub token: String,
}

/// ユーザー登録ハンドラー
///
/// POST /api/users/register
///
/// 登録成功時はセッショントークンを発行し、HttpOnlyクッキーとして返す。
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<RegisterResponse>), AppError> {
    // バリデーション
    validate_register_request(&request)?;

    // パスワードハッシュ化
    let password_hash = hash_password(&request.password)?;

    // ユーザー作成（email の一意性はDBのUNIQUE制約で保証）
    let user = state
        .user_repo
        .create_user(&request.name, &request.email, &password_hash)
        .await
        .map_err(|e| {
            // UNIQUE制約違反チェック
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("users_email_key")
            {
                return AppError::DuplicateEmail;
            }
            AppError::Database(e)
        })?;

    tracing::info!(email = %request.email, "ユーザー登録成功");

    // セッショントークン発行 + クッキー設定
    let token = state.session_service.mint(user.id)?;
    let jar = jar.add(state.session_service.session_cookie(token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(RegisterResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            photo: user.photo,
            role: user.role,
            token,
        }),
    ))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::MissingField("name"));
    }
    if request.email.trim().is_empty() {
        return Err(AppError::MissingField("email"));
    }
    if request.password.is_empty() {
        return Err(AppError::MissingField("password"));
    }
    // password: 6文字以上
    if request.password.chars().count() < 6 {
        return Err(AppError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_name() {
        let result = validate_register_request(&request("", "test@example.com", "secret1"));
        assert!(matches!(result, Err(AppError::MissingField("name"))));
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_register_request(&request("A", "", "secret1"));
        assert!(matches!(result, Err(AppError::MissingField("email"))));
    }

    #[test]
    fn test_validate_empty_password() {
        let result = validate_register_request(&request("A", "test@example.com", ""));
        assert!(matches!(result, Err(AppError::MissingField("password"))));
    }

    #[test]
    fn test_validate_short_password() {
        let result = validate_register_request(&request("A", "test@example.com", "five5"));
        assert!(matches!(result, Err(AppError::WeakPassword)));
    }

    #[test]
    fn test_validate_six_char_password_is_accepted() {
        let result = validate_register_request(&request("A", "test@example.com", "secret"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_register_request(&request("A", "a@x.com", "secret1"));
        assert!(result.is_ok());
    }
}
