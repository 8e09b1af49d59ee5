//! 测试共用的 mock

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eztax_adapter_email::{
    DeliveryReceipt, EmailMessage, EmailSender, EmailTemplate, RenderedEmail, TemplateEngine,
    TemplateRenderer,
};
use eztax_errors::{AppError, AppResult};
use eztax_notify::application::{MailerSettings, VerificationMailer};

/// 记录所有投递请求并返回成功
#[derive(Default)]
pub struct RecordingSender {
    pub messages: Mutex<Vec<EmailMessage>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send_email(&self, message: &EmailMessage) -> AppResult<DeliveryReceipt> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(message.clone());
        Ok(DeliveryReceipt {
            provider: "recording".to_string(),
            message_id: format!("msg-{}", messages.len()),
        })
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

/// 模拟网络错误
pub struct UnreachableSender;

#[async_trait]
impl EmailSender for UnreachableSender {
    async fn send_email(&self, _message: &EmailMessage) -> AppResult<DeliveryReceipt> {
        Err(AppError::external_service(
            "Resend request failed: error sending request: connection refused",
        ))
    }

    fn provider_name(&self) -> &str {
        "unreachable"
    }

    async fn is_available(&self) -> bool {
        false
    }
}

/// 渲染总是失败
pub struct BrokenRenderer;

impl TemplateRenderer for BrokenRenderer {
    fn render_email(&self, template: &dyn EmailTemplate) -> AppResult<RenderedEmail> {
        Err(AppError::template(format!(
            "Template '{}' not found",
            template.name()
        )))
    }
}

pub fn mailer_with(sender: Arc<dyn EmailSender>) -> VerificationMailer {
    VerificationMailer::new(
        sender,
        Arc::new(TemplateEngine::builtin().unwrap()),
        MailerSettings::default(),
    )
}
