use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;

/// セッションクッキー名
pub const SESSION_COOKIE: &str = "token";

/// JWTクレーム
///
/// ユーザーIDと有効期限のみを持つ自己完結型トークン。
/// サーバー側に失効リストは持たない（ログアウト後も期限までは有効）。
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// セッショントークンサービス
///
/// 起動時に読み込んだ単一のHS256シークレットで署名・検証する。
/// 鍵のローテーションは行わない。
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionService {
    /// 新しい SessionService を作成
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// セッショントークンを発行
    ///
    /// 有効期限は発行時刻 + TTL（デフォルト1日）
    pub fn mint(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "セッショントークンの発行に失敗");
            AppError::Internal(anyhow::anyhow!("session token encode error"))
        })
    }

    /// セッショントークンを検証
    ///
    /// 署名不正・期限切れ・クレーム不正はすべて None を返す。
    /// 呼び出し側はログイン状態チェックとしても利用できる。
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).ok()?;
        Uuid::parse_str(&token_data.claims.sub).ok()
    }

    /// セッションクッキーを構築
    ///
    /// HttpOnly + Secure + SameSite=None、有効期限はトークンと同じ
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .expires(OffsetDateTime::now_utc() + self.ttl)
            .build()
    }

    /// ログアウト用の失効済みクッキーを構築
    ///
    /// 空値 + 過去の有効期限で上書きし、ブラウザ側のクッキーを破棄させる
    pub fn expired_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SessionService {
        SessionService::new("test-secret-key-for-unit-tests", 86400)
    }

    #[test]
    fn test_mint_then_verify_returns_user_id() {
        let service = service();
        let user_id = Uuid::new_v4();
        let token = service.mint(user_id).unwrap();
        assert_eq!(service.verify(&token), Some(user_id));
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let service = service();
        let mut token = service.mint(Uuid::new_v4()).unwrap();
        token.pop();
        token.push('x');
        assert_eq!(service.verify(&token), None);
    }

    #[test]
    fn test_verify_rejects_foreign_key() {
        let token = service().mint(Uuid::new_v4()).unwrap();
        let other = SessionService::new("another-secret-entirely", 86400);
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // TTL を過去に振って期限切れトークンを作る（検証側leewayを超える幅）
        let expired = SessionService::new("test-secret-key-for-unit-tests", -3600);
        let token = expired.mint(Uuid::new_v4()).unwrap();
        assert_eq!(service().verify(&token), None);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert_eq!(service().verify(""), None);
        assert_eq!(service().verify("not.a.jwt"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = service().session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_expired_cookie_clears_session() {
        let cookie = service().expired_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        let expires = cookie.expires_datetime().unwrap();
        assert!(expires < OffsetDateTime::now_utc());
    }
}
