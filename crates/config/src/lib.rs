//! eztax-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志（生产环境总是 JSON）
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 邮件服务商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    Resend,
    Smtp,
    /// 仅记录日志，不实际发送（开发环境）
    #[default]
    Log,
}

/// Resend API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ResendConfig {
    pub api_key: Secret<String>,
    #[serde(default = "default_resend_base_url")]
    pub base_url: String,
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

/// SMTP 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    /// STARTTLS，关闭后凭据以明文传输
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

/// 邮件配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub provider: EmailProvider,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_verification_subject")]
    pub verification_subject: String,
    /// 模板目录，未设置时使用内置模板
    pub template_dir: Option<String>,
    pub resend: Option<ResendConfig>,
    pub smtp: Option<SmtpConfig>,
}

fn default_from_address() -> String {
    "onboarding@resend.dev".to_string()
}

fn default_verification_subject() -> String {
    "EZTax | Verification Code".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::default(),
            from_address: default_from_address(),
            verification_subject: default_verification_subject(),
            template_dir: None,
            resend: None,
            smtp: None,
        }
    }
}

impl EmailConfig {
    /// 检查所选服务商的配置是否齐全
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider {
            EmailProvider::Resend if self.resend.is_none() => Err(ConfigError::Invalid(
                "email.provider is \"resend\" but [email.resend] is missing".to_string(),
            )),
            EmailProvider::Smtp if self.smtp.is_none() => Err(ConfigError::Invalid(
                "email.provider is \"smtp\" but [email.smtp] is missing".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

fn default_app_name() -> String {
    "eztax-notify".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：`EZTAX_*` 环境变量 > `{APP_ENV}.toml` > `default.toml`
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("EZTAX_").split("__"));

        Self::from_figment(figment)
    }

    /// 从任意 Figment 提取并校验配置
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.email.validate()?;
        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
