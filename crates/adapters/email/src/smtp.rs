//! SMTP 邮件发送

use crate::{DeliveryReceipt, EmailMessage, EmailSender};
use eztax_config::SmtpConfig;
use eztax_errors::{AppError, AppResult};
use lettre::message::{Mailbox, MultiPart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// SMTP 邮件客户端
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Message-ID 的域名部分
    host: String,
}

impl SmtpEmailSender {
    /// 创建 SMTP 客户端，连接在首次发送时建立
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                AppError::configuration(format!("Failed to create SMTP transport: {}", e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let transport = builder.port(config.port).credentials(credentials).build();

        Ok(Self {
            transport,
            host: config.host.clone(),
        })
    }

    /// 构建 MIME 消息，有纯文本时生成 multipart/alternative
    fn build_message(msg: &EmailMessage, message_id: &str) -> AppResult<Message> {
        let from: Mailbox = msg
            .from
            .parse()
            .map_err(|e| AppError::configuration(format!("Invalid from address: {}", e)))?;

        let to: Mailbox = msg
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(msg.subject.as_str())
            .message_id(Some(message_id.to_string()));

        let message = match &msg.text_body {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(
                text.clone(),
                msg.html_body.clone(),
            )),
            None => builder
                .header(header::ContentType::TEXT_HTML)
                .body(msg.html_body.clone()),
        }
        .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))?;

        Ok(message)
    }
}

#[async_trait::async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> AppResult<DeliveryReceipt> {
        debug!(subject = %message.subject, "Sending email via SMTP");

        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.host);
        let mime = Self::build_message(message, &message_id)?;

        let response = self
            .transport
            .send(mime)
            .await
            .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))?;

        info!(
            message_id = %message_id,
            code = %response.code(),
            "Email accepted by SMTP relay"
        );

        Ok(DeliveryReceipt {
            provider: self.provider_name().to_string(),
            message_id,
        })
    }

    fn provider_name(&self) -> &str {
        "smtp"
    }

    async fn is_available(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "SMTP relay unreachable");
                false
            }
        }
    }
}
