use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} は必須です")]
    MissingField(&'static str),

    #[error("パスワードは6文字以上で入力してください")]
    WeakPassword,

    #[error("このメールアドレスは既に使用されています")]
    DuplicateEmail,

    #[error("メールアドレスまたはパスワードが正しくありません")]
    InvalidCredentials,

    #[error("ユーザーが見つかりません")]
    NotFound,

    #[error("無効または期限切れのリンクです")]
    InvalidOrExpiredToken,

    #[error("新しいパスワードが現在のパスワードと同じです")]
    PasswordUnchanged,

    #[error("メールの送信に失敗しました")]
    EmailDeliveryFailed,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingField(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::WeakPassword => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::DuplicateEmail => (StatusCode::CONFLICT, self.to_string()),
            Self::InvalidCredentials => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::InvalidOrExpiredToken => (StatusCode::NOT_FOUND, self.to_string()),
            Self::PasswordUnchanged => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::EmailDeliveryFailed => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        assert_eq!(status_of(AppError::MissingField("name")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::WeakPassword), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::DuplicateEmail), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::InvalidCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::InvalidOrExpiredToken),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(AppError::PasswordUnchanged), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_infrastructure_errors_map_to_500() {
        assert_eq!(
            status_of(AppError::EmailDeliveryFailed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Database(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Internal(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
