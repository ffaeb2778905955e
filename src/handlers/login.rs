use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::session::SESSION_COOKIE;
use crate::state::AppState;

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// ユーザーのメールアドレス
    #[serde(default)]
    pub email: String,
    /// ユーザーのパスワード
    #[serde(default)]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
    pub token: String,
}

/// ログインハンドラー
///
/// POST /api/users/login
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. ユーザー認証（DB照合）
/// 3. セッショントークン発行
/// 4. HttpOnlyクッキーを設定してプロフィールを返却
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    // 1. リクエストバリデーション
    validate_login_request(&request)?;

    // 2. ユーザー認証（存在しないメールもパスワード不一致と同じエラー）
    let auth_service = AuthService::new(state.user_repo.clone());
    let user = auth_service
        .authenticate(&request.email, &request.password)
        .await?;

    // 3. セッショントークン発行
    let token = state.session_service.mint(user.id)?;

    // 4. クッキー設定 + プロフィール返却
    let jar = jar.add(state.session_service.session_cookie(token.clone()));

    Ok((
        jar,
        Json(LoginResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            photo: user.photo,
            role: user.role,
            token,
        }),
    ))
}

/// ログイン状態チェックハンドラー
///
/// GET /api/users/loggedin
///
/// クッキーのトークンを検証し true/false のみを返す。
/// 未ログインはエラーではなく false。
pub async fn login_status(State(state): State<AppState>, jar: CookieJar) -> Json<bool> {
    let logged_in = jar
        .get(SESSION_COOKIE)
        .map(|cookie| state.session_service.verify(cookie.value()).is_some())
        .unwrap_or(false);

    Json(logged_in)
}

/// ログインリクエストのバリデーション
fn validate_login_request(request: &LoginRequest) -> Result<(), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::MissingField("email"));
    }
    if request.password.is_empty() {
        return Err(AppError::MissingField("password"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        let request = LoginRequest {
            email: "".to_string(),
            password: "secret1".to_string(),
        };

        let result = validate_login_request(&request);
        assert!(matches!(result, Err(AppError::MissingField("email"))));
    }

    #[test]
    fn test_validate_empty_password() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };

        let result = validate_login_request(&request);
        assert!(matches!(result, Err(AppError::MissingField("password"))));
    }

    #[test]
    fn test_validate_valid_request() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "secret1".to_string(),
        };

        let result = validate_login_request(&request);
        assert!(result.is_ok());
    }
}
