use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::PasswordResetService;
use crate::state::AppState;

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
}

/// パスワードリセットリクエストハンドラー
///
/// POST /api/users/forgotpassword
///
/// # Security
/// - 発行したシークレットはレスポンスにもログにも含めない（メールのみ）
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    // バリデーション
    if request.email.trim().is_empty() {
        return Err(AppError::MissingField("email"));
    }

    let password_reset_service = PasswordResetService::new(
        state.user_repo.clone(),
        state.token_repo.clone(),
        state.email_service.clone(),
        state.config.clone(),
    );
    password_reset_service.request_reset(&request.email).await?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: "Reset Email Sent".to_string(),
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
}

/// パスワードリセット実行ハンドラー
///
/// PUT /api/users/resetpassword/{reset_token}
///
/// # Security
/// - reset_token, password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション
    validate_reset_password_request(&reset_token, &request)?;

    let password_reset_service = PasswordResetService::new(
        state.user_repo.clone(),
        state.token_repo.clone(),
        state.email_service.clone(),
        state.config.clone(),
    );
    password_reset_service
        .reset_password(&reset_token, &request.password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        message: "Password Reset Successful, Please Login".to_string(),
    }))
}

/// リセットパスワードリクエストのバリデーション
fn validate_reset_password_request(
    reset_token: &str,
    request: &ResetPasswordRequest,
) -> Result<(), AppError> {
    if reset_token.trim().is_empty() {
        return Err(AppError::MissingField("resetToken"));
    }
    if request.password.is_empty() {
        return Err(AppError::MissingField("password"));
    }
    if request.password.chars().count() < 6 {
        return Err(AppError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_token() {
        let request = ResetPasswordRequest {
            password: "secret2".to_string(),
        };
        let result = validate_reset_password_request("", &request);
        assert!(matches!(result, Err(AppError::MissingField("resetToken"))));
    }

    #[test]
    fn test_validate_empty_password() {
        let request = ResetPasswordRequest {
            password: "".to_string(),
        };
        let result = validate_reset_password_request("valid-token", &request);
        assert!(matches!(result, Err(AppError::MissingField("password"))));
    }

    #[test]
    fn test_validate_short_password() {
        let request = ResetPasswordRequest {
            password: "five5".to_string(),
        };
        let result = validate_reset_password_request("valid-token", &request);
        assert!(matches!(result, Err(AppError::WeakPassword)));
    }

    #[test]
    fn test_validate_valid_reset_request() {
        let request = ResetPasswordRequest {
            password: "secret2".to_string(),
        };
        let result = validate_reset_password_request("valid-token", &request);
        assert!(result.is_ok());
    }
}
