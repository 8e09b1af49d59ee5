//! 值对象

use std::str::FromStr;

use email_address::EmailAddress;
use eztax_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 收件邮箱
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into();
        let email = email.trim();

        EmailAddress::from_str(email)
            .map_err(|e| AppError::validation(format!("Invalid email address: {}", e)))?;

        Ok(Self(email.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户名，只要求非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> AppResult<Self> {
        let username = username.into();

        if username.trim().is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }

        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一次性验证码（6 位数字）
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub const LENGTH: usize = 6;

    pub fn new(code: impl Into<String>) -> AppResult<Self> {
        let code = code.into();

        if code.len() != Self::LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::validation(format!(
                "Verification code must be exactly {} digits",
                Self::LENGTH
            )));
        }

        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// 验证码不进日志
impl std::fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VerificationCode(******)")
    }
}
