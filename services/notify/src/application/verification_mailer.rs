//! 验证码邮件投递
//!
//! 每次调用只向服务商发起一次投递，不重试、不设超时。无论成功与否都只返回一个
//! [`DispatchResult`]，服务商错误在此处记录日志后吞掉，不会传给调用方。

use std::sync::Arc;
use std::time::Instant;

use eztax_adapter_email::{
    DeliveryReceipt, EmailMessage, EmailSender, TemplateRenderer, VerificationEmail, mask_email,
};
use eztax_config::EmailConfig;
use eztax_errors::AppResult;
use eztax_telemetry::record_email_dispatch;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::domain::VerificationRequest;

pub const VERIFICATION_SENT_MESSAGE: &str = "Verification email send successfully";
pub const VERIFICATION_FAILED_MESSAGE: &str = "Failed to send verification email";

/// 投递结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// 是否成功
    pub success: bool,
    /// 消息
    pub message: String,
}

impl DispatchResult {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: VERIFICATION_SENT_MESSAGE.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: VERIFICATION_FAILED_MESSAGE.to_string(),
        }
    }
}

/// 固定的发件人与主题
#[derive(Debug, Clone)]
pub struct MailerSettings {
    pub from_address: String,
    pub subject: String,
}

impl From<&EmailConfig> for MailerSettings {
    fn from(config: &EmailConfig) -> Self {
        Self {
            from_address: config.from_address.clone(),
            subject: config.verification_subject.clone(),
        }
    }
}

impl Default for MailerSettings {
    fn default() -> Self {
        Self::from(&EmailConfig::default())
    }
}

/// 验证码邮件发送器
pub struct VerificationMailer {
    sender: Arc<dyn EmailSender>,
    renderer: Arc<dyn TemplateRenderer>,
    settings: MailerSettings,
}

impl VerificationMailer {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        renderer: Arc<dyn TemplateRenderer>,
        settings: MailerSettings,
    ) -> Self {
        Self {
            sender,
            renderer,
            settings,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.sender.provider_name()
    }

    pub async fn is_available(&self) -> bool {
        self.sender.is_available().await
    }

    /// 发送验证码邮件
    ///
    /// 输入不合法、模板渲染失败、服务商拒绝或网络错误都返回同一个失败结果。
    pub async fn send_verification_email(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> DispatchResult {
        match self.try_send_verification_email(email, username, code).await {
            Ok(_) => DispatchResult::sent(),
            Err(_) => DispatchResult::failed(),
        }
    }

    /// 同 [`send_verification_email`](Self::send_verification_email)，但保留失败原因
    ///
    /// 错误已在此处记录日志，调用方只需据此区分输入错误（`Validation`）与投递失败。
    pub async fn try_send_verification_email(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> AppResult<DeliveryReceipt> {
        let started = Instant::now();
        let outcome = self.deliver(email, username, code).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        record_email_dispatch(
            "verification",
            self.sender.provider_name(),
            outcome.is_ok(),
            elapsed_ms,
        );

        match &outcome {
            Ok(receipt) => {
                info!(
                    to = %mask_email(email),
                    provider = %receipt.provider,
                    message_id = %receipt.message_id,
                    elapsed_ms = elapsed_ms,
                    "Verification email sent"
                );
            }
            Err(e) => {
                error!(
                    to = %mask_email(email),
                    provider = self.sender.provider_name(),
                    error = %e,
                    "Error sending verification email"
                );
            }
        }

        outcome
    }

    async fn deliver(&self, email: &str, username: &str, code: &str) -> AppResult<DeliveryReceipt> {
        let request = VerificationRequest::new(email, username, code)?;

        let rendered = self.renderer.render_email(&VerificationEmail::new(
            request.username.as_str(),
            request.code.as_str(),
        ))?;

        let message = EmailMessage::from_rendered(
            self.settings.from_address.as_str(),
            request.email.as_str(),
            self.settings.subject.as_str(),
            rendered,
        );

        debug!(to = %mask_email(&message.to), subject = %message.subject, "Dispatching verification email");

        self.sender.send_email(&message).await
    }
}
