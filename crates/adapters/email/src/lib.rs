//! Email 适配器
//!
//! 提供邮件投递功能，支持：
//! - Resend HTTP API
//! - SMTP 邮件发送
//! - 日志输出（开发环境）
//! - 模板渲染

mod log_sender;
mod resend;
mod smtp;
mod template;

use std::sync::Arc;

pub use log_sender::LogEmailSender;
pub use resend::ResendEmailSender;
pub use smtp::SmtpEmailSender;
pub use template::{EmailTemplate, RenderedEmail, TemplateEngine, TemplateRenderer, VerificationEmail};

use eztax_config::{EmailConfig, EmailProvider};
use eztax_errors::{AppError, AppResult};

/// 待投递的邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

impl EmailMessage {
    /// 由渲染结果组装邮件
    pub fn from_rendered(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        rendered: RenderedEmail,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            html_body: rendered.html,
            text_body: Some(rendered.text),
        }
    }
}

/// 服务商确认回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider: String,
    pub message_id: String,
}

/// 邮件发送接口
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// 投递一封邮件，服务商确认后返回回执
    async fn send_email(&self, message: &EmailMessage) -> AppResult<DeliveryReceipt>;

    /// 服务商名称
    fn provider_name(&self) -> &str;

    /// 健康检查
    async fn is_available(&self) -> bool {
        true
    }
}

/// 按配置创建邮件发送器
pub fn create_email_sender(config: &EmailConfig) -> AppResult<Arc<dyn EmailSender>> {
    let sender: Arc<dyn EmailSender> = match config.provider {
        EmailProvider::Resend => {
            let resend = config
                .resend
                .as_ref()
                .ok_or_else(|| AppError::configuration("Missing [email.resend] section"))?;
            Arc::new(ResendEmailSender::new(resend)?)
        }
        EmailProvider::Smtp => {
            let smtp = config
                .smtp
                .as_ref()
                .ok_or_else(|| AppError::configuration("Missing [email.smtp] section"))?;
            Arc::new(SmtpEmailSender::new(smtp)?)
        }
        EmailProvider::Log => Arc::new(LogEmailSender::new()),
    };

    tracing::info!(provider = sender.provider_name(), "Email sender configured");
    Ok(sender)
}

/// 日志中隐藏邮箱本地部分，只保留首字符
///
/// ```
/// assert_eq!(eztax_adapter_email::mask_email("alice@example.com"), "a****@example.com");
/// ```
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            match chars.next() {
                Some(first) if local.chars().count() > 1 => {
                    format!("{}{}@{}", first, "*".repeat(chars.count()), domain)
                }
                _ => format!("*@{}", domain),
            }
        }
        None => "*".repeat(email.chars().count()),
    }
}
