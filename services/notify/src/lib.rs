//! EZTax Notify Service Library
//!
//! - `domain`: 验证请求与值对象
//! - `application`: 验证码邮件投递
//! - `api`: HTTP 路由

pub mod api;
pub mod application;
pub mod domain;
