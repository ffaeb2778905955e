use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

/// メール送信サービス
///
/// `email` 機能有効時は lettre でSMTP送信、無効時はログ出力のみのスタブ。
/// 送信失敗は `EmailDeliveryFailed` として呼び出し側に返す。
#[derive(Clone)]
pub struct EmailService {
    config: Arc<Config>,
}

impl EmailService {
    /// 新しい EmailService を作成
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// メールを送信
    ///
    /// # Security
    /// 本文にはリセットシークレットが含まれるためログに出力しない
    pub async fn send(
        &self,
        subject: &str,
        html_body: &str,
        to: &str,
        from: &str,
    ) -> Result<(), AppError> {
        if !self.smtp_configured() {
            // 開発モード: メール送信せずログ出力のみ（本文は出さない）
            let _ = html_body;
            tracing::info!(to = %to, from = %from, subject = %subject, "SMTP未設定、メール送信をスキップ（開発モード）");
            return Ok(());
        }

        #[cfg(feature = "email")]
        {
            self.send_via_smtp(subject, html_body, to, from).await
        }

        #[cfg(not(feature = "email"))]
        {
            // email機能無効ビルド: SMTP設定があってもログ出力のみ
            let _ = html_body;
            tracing::warn!(to = %to, from = %from, subject = %subject, "email機能が無効、メール送信をスキップ");
            Ok(())
        }
    }

    fn smtp_configured(&self) -> bool {
        self.config.smtp_host.is_some()
            && self.config.smtp_username.is_some()
            && self.config.smtp_password.is_some()
    }

    #[cfg(feature = "email")]
    async fn send_via_smtp(
        &self,
        subject: &str,
        html_body: &str,
        to: &str,
        from: &str,
    ) -> Result<(), AppError> {
        use lettre::message::header::ContentType;
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
        use secrecy::ExposeSecret;

        let host = self
            .config
            .smtp_host
            .as_deref()
            .ok_or(AppError::EmailDeliveryFailed)?;
        let username = self
            .config
            .smtp_username
            .as_ref()
            .ok_or(AppError::EmailDeliveryFailed)?;
        let password = self
            .config
            .smtp_password
            .as_ref()
            .ok_or(AppError::EmailDeliveryFailed)?;

        let message = Message::builder()
            .from(from.parse().map_err(|e| {
                tracing::error!(error = ?e, "送信元アドレスのパースに失敗");
                AppError::EmailDeliveryFailed
            })?)
            .to(to.parse().map_err(|e| {
                tracing::error!(error = ?e, "宛先アドレスのパースに失敗");
                AppError::EmailDeliveryFailed
            })?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| {
                tracing::error!(error = ?e, "メールメッセージの構築に失敗");
                AppError::EmailDeliveryFailed
            })?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| {
                tracing::error!(error = ?e, "SMTPトランスポートの構築に失敗");
                AppError::EmailDeliveryFailed
            })?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                username.expose_secret().clone(),
                password.expose_secret().clone(),
            ))
            .build();

        mailer.send(message).await.map_err(|e| {
            tracing::error!(error = ?e, to = %to, "メール送信に失敗");
            AppError::EmailDeliveryFailed
        })?;

        tracing::info!(to = %to, "メール送信完了");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretBox;

    fn config_without_smtp() -> Config {
        Config {
            database_url: SecretBox::new(Box::new("postgres://localhost/test".to_string())),
            host: "127.0.0.1".to_string(),
            port: 9000,
            jwt_secret: SecretBox::new(Box::new("test-secret".to_string())),
            session_ttl_secs: 86400,
            frontend_url: "http://localhost:3000".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            email_from: None,
            password_reset_token_ttl_secs: 1800,
        }
    }

    #[test]
    fn test_smtp_unconfigured_is_detected() {
        let service = EmailService::new(Arc::new(config_without_smtp()));
        assert!(!service.smtp_configured());
    }

    #[tokio::test]
    async fn test_send_without_smtp_succeeds_as_stub() {
        let service = EmailService::new(Arc::new(config_without_smtp()));
        let result = service
            .send("Subject", "<p>body</p>", "to@example.com", "from@example.com")
            .await;
        assert!(result.is_ok());
    }
}
