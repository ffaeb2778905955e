use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::state::AppState;

/// ログアウトレスポンス
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// ログアウトハンドラー
///
/// GET /api/users/logout
///
/// クッキーを空値 + 過去の有効期限で上書きする。
/// サーバー側に失効リストはないため、発行済みトークン自体は
/// 埋め込まれた期限まで有効なまま（既知の制限）。
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.add(state.session_service.expired_cookie());

    tracing::info!("ログアウト完了");

    (
        jar,
        Json(LogoutResponse {
            message: "Successfully Logged Out".to_string(),
        }),
    )
}
