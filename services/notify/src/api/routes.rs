//! 路由与处理器

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use eztax_errors::{AppError, ProblemDetails};
use eztax_telemetry::HealthStatus;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};

use crate::application::{DispatchResult, VerificationMailer};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub mailer: Arc<VerificationMailer>,
    pub metrics: Option<PrometheusHandle>,
}

/// `POST /api/verification-emails` 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendVerificationEmailRequest {
    pub email: String,
    pub username: String,
    pub code: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(VERIFICATION_EMAILS_PATH, post(send_verification_email))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

const VERIFICATION_EMAILS_PATH: &str = "/api/verification-emails";

/// RFC 7807 错误响应
pub struct ApiProblem(pub ProblemDetails);

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self.0),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiProblem {
    fn from(rejection: JsonRejection) -> Self {
        let mut problem = AppError::validation(rejection.body_text())
            .to_problem_details()
            .with_instance(VERIFICATION_EMAILS_PATH);
        // 保留 axum 的 400/415/422 区分
        problem.status = rejection.status().as_u16();
        Self(problem)
    }
}

/// 输入错误为 4xx，服务商失败为 502，响应体保持一致
fn dispatch_status(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn send_verification_email(
    State(state): State<AppState>,
    payload: Result<Json<SendVerificationEmailRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiProblem::from(rejection).into_response(),
    };

    match state
        .mailer
        .try_send_verification_email(&req.email, &req.username, &req.code)
        .await
    {
        Ok(_) => (StatusCode::OK, Json(DispatchResult::sent())).into_response(),
        Err(e) => (dispatch_status(&e), Json(DispatchResult::failed())).into_response(),
    }
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();

    let available = state.mailer.is_available().await;
    status.add_check(
        format!("email_provider:{}", state.mailer.provider_name()),
        available,
        (!available).then(|| "provider unavailable".to_string()),
    );

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
