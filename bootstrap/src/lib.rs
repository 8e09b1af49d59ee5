//! eztax-bootstrap - 统一服务启动骨架
//!
//! 日志初始化与优雅关闭

mod runtime;

pub use runtime::*;
