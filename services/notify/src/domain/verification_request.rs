//! 验证邮件请求

use eztax_errors::AppResult;

use super::value_objects::{Email, Username, VerificationCode};

/// 单次验证邮件请求，调用时构造，不持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub email: Email,
    pub username: Username,
    pub code: VerificationCode,
}

impl VerificationRequest {
    pub fn new(email: &str, username: &str, code: &str) -> AppResult<Self> {
        Ok(Self {
            email: Email::new(email)?,
            username: Username::new(username)?,
            code: VerificationCode::new(code)?,
        })
    }
}
