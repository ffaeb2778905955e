use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{PasswordResetTokenRepository, UserRepository};
use crate::services::{EmailService, auth::hash_password};

/// パスワードリセットサービス
#[derive(Clone)]
pub struct PasswordResetService {
    user_repo: UserRepository,
    token_repo: PasswordResetTokenRepository,
    email_service: EmailService,
    config: Arc<Config>,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(
        user_repo: UserRepository,
        token_repo: PasswordResetTokenRepository,
        email_service: EmailService,
        config: Arc<Config>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            email_service,
            config,
        }
    }

    /// パスワードリセットをリクエスト
    ///
    /// 有効なトークンは1ユーザーにつき1つ。再リクエスト時は旧トークンを
    /// 破棄してから発行するため、古いリセットリンクは無効になる。
    ///
    /// # Security
    /// - トークン（平文）はログに出力しない（メール本文のみに載せる）
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        tracing::info!(email = %email, "パスワードリセットリクエスト");

        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::NotFound)?;

        // 既存トークンを破棄（期限切れのゴミもここで掃除される）
        self.token_repo.delete_for_user(user.id).await?;

        // 32バイトランダム + ユーザーIDでシークレット生成
        let token = generate_secret(user.id);

        // SHA256ハッシュのみをDBに保存
        let token_hash = hash_token(&token);
        let expires_at = OffsetDateTime::now_utc()
            + Duration::seconds(self.config.password_reset_token_ttl_secs);
        self.token_repo
            .create(user.id, &token_hash, expires_at)
            .await?;

        // リセットURLを構築してメール送信
        // 送信失敗時もトークンはロールバックしない（再リクエストで置換される）
        let reset_url = self.build_reset_url(&token);
        let sent_from = self.config.email_from.as_deref().unwrap_or("no-reply@localhost");
        self.email_service
            .send(
                "Your Password Reset Request",
                &reset_email_body(&reset_url),
                &user.email,
                sent_from,
            )
            .await?;

        tracing::info!(user_id = %user.id, "パスワードリセットメール送信完了");

        Ok(())
    }

    /// パスワードをリセット
    ///
    /// トークンの照合と削除は単一の条件付きDELETEで行うため、
    /// 同一トークンの並行リクエストで成功するのは高々1つ。
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Uuid, AppError> {
        let token_hash = hash_token(token);

        // 不一致・消費済み・期限切れはすべて None
        let user_id = self
            .token_repo
            .consume(&token_hash)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        let password_hash = hash_password(new_password)?;
        self.user_repo
            .update_password(user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %user_id, "パスワードリセット完了");

        Ok(user_id)
    }

    /// リセットURLを構築
    fn build_reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-password/{}",
            self.config.frontend_url.trim_end_matches('/'),
            token
        )
    }
}

/// リセットシークレットを生成
///
/// 32バイトの乱数をbase64url化し、末尾にユーザーIDを連結して
/// ユーザー間で衝突しないことを保証する
fn generate_secret(user_id: Uuid) -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    format!("{}{}", URL_SAFE_NO_PAD.encode(bytes), user_id.simple())
}

/// トークンをSHA256でハッシュ化
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// リセットメール本文（HTML）
fn reset_email_body(reset_url: &str) -> String {
    format!(
        r#"<h2>Reset your Count password</h2>
<a href="{reset_url}" clicktracking="off">Click here to reset your password.</a>

<p style="color: #999;">If you didn't request a reset, don't worry. You can safely ignore this email.</p>

<p>Thank you,</p>
<p>The Count Team</p>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// リクエスト/消費の経路は PgPool が必要なため、
    /// シークレット生成とダイジェストのロジックを直接テスト
    #[test]
    fn test_generate_secret_embeds_user_id() {
        let user_id = Uuid::new_v4();
        let secret = generate_secret(user_id);
        assert!(secret.ends_with(&user_id.simple().to_string()));
        // base64url(32バイト) = 43文字 + uuid simple 32文字
        assert_eq!(secret.len(), 43 + 32);
    }

    #[test]
    fn test_generate_secret_is_unique_per_call() {
        let user_id = Uuid::new_v4();
        assert_ne!(generate_secret(user_id), generate_secret(user_id));
    }

    #[test]
    fn test_hash_token_is_deterministic_hex() {
        let a = hash_token("some-secret");
        let b = hash_token("some-secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_token_differs_per_secret() {
        assert_ne!(hash_token("secret-a"), hash_token("secret-b"));
    }

    #[test]
    fn test_reset_email_body_contains_link() {
        let body = reset_email_body("https://example.com/reset-password/abc");
        assert!(body.contains("https://example.com/reset-password/abc"));
    }
}
