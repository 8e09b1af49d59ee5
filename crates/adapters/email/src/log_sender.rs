//! 日志邮件发送器
//!
//! 开发与测试环境使用：不连接任何服务商，只把邮件写入日志。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use eztax_errors::{AppError, AppResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{DeliveryReceipt, EmailMessage, EmailSender, mask_email};

/// 只记录日志的邮件发送器
#[derive(Clone, Default)]
pub struct LogEmailSender {
    sent: Arc<AtomicU64>,
    simulate_failure: bool,
}

impl LogEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次发送都返回失败
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(AtomicU64::new(0)),
            simulate_failure: true,
        }
    }

    /// 已"发送"的邮件数量
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmailSender for LogEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> AppResult<DeliveryReceipt> {
        let to = mask_email(&message.to);

        if self.simulate_failure {
            warn!(to = %to, "Log email sender simulating failure");
            return Err(AppError::external_service("Simulated email delivery failure"));
        }

        let message_id = format!("log-{}", Uuid::new_v4());
        let count = self.sent.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            provider = "log",
            to = %to,
            from = %message.from,
            subject = %message.subject,
            message_id = %message_id,
            count = count,
            "Email logged instead of sent"
        );
        if let Some(text) = &message.text_body {
            tracing::debug!(body = %text, "Logged email body");
        }

        Ok(DeliveryReceipt {
            provider: self.provider_name().to_string(),
            message_id,
        })
    }

    fn provider_name(&self) -> &str {
        "log"
    }

    async fn is_available(&self) -> bool {
        !self.simulate_failure
    }
}
