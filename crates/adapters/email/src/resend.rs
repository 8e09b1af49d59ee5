//! Resend HTTP API 客户端

use crate::{DeliveryReceipt, EmailMessage, EmailSender};
use eztax_config::ResendConfig;
use eztax_errors::{AppError, AppResult};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// `POST /emails` 请求体
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> From<&'a EmailMessage> for SendEmailRequest<'a> {
    fn from(msg: &'a EmailMessage) -> Self {
        Self {
            from: &msg.from,
            to: [&msg.to],
            subject: &msg.subject,
            html: &msg.html_body,
            text: msg.text_body.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Resend 错误响应，例如 `{"statusCode":422,"name":"validation_error","message":"..."}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    name: Option<String>,
    message: Option<String>,
}

/// Resend 邮件客户端
pub struct ResendEmailSender {
    http: reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
}

impl ResendEmailSender {
    /// 创建新的 Resend 客户端
    pub fn new(config: &ResendConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("eztax-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.base_url)
    }
}

/// 把非 2xx 响应体整理成可读信息
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            name: Some(name),
            message: Some(message),
        }) => format!("{}: {}", name, message),
        Ok(ErrorResponse {
            message: Some(message),
            ..
        }) => message,
        _ if body.is_empty() => "empty response body".to_string(),
        _ => body.to_string(),
    }
}

#[async_trait::async_trait]
impl EmailSender for ResendEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> AppResult<DeliveryReceipt> {
        debug!(subject = %message.subject, "Sending email via Resend");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&SendEmailRequest::from(message))
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Resend request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(format!(
                "Resend rejected email ({}): {}",
                status.as_u16(),
                describe_error(&body)
            )));
        }

        let body: SendEmailResponse = response.json().await.map_err(|e| {
            AppError::external_service(format!("Invalid Resend response: {}", e))
        })?;

        info!(message_id = %body.id, "Email accepted by Resend");

        Ok(DeliveryReceipt {
            provider: self.provider_name().to_string(),
            message_id: body.id,
        })
    }

    fn provider_name(&self) -> &str {
        "resend"
    }
}
