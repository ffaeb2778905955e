use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::session::SESSION_COOKIE;
use crate::state::AppState;

/// 認証済みユーザーのエクストラクタ
///
/// `token` クッキーのJWTを検証し、ユーザーIDを取り出す。
/// クッキー不在・署名不正・期限切れはいずれも `InvalidCredentials`。
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(SESSION_COOKIE).ok_or(AppError::InvalidCredentials)?;

        let id = state
            .session_service
            .verify(cookie.value())
            .ok_or(AppError::InvalidCredentials)?;

        Ok(AuthUser { id })
    }
}
