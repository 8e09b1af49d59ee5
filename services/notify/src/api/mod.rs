//! HTTP 接口

mod routes;

pub use routes::{ApiProblem, AppState, SendVerificationEmailRequest, routes};
