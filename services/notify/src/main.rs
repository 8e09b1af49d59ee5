//! EZTax Notify Service

use std::net::SocketAddr;
use std::sync::Arc;

use eztax_adapter_email::{TemplateEngine, create_email_sender};
use eztax_bootstrap::{init_runtime, shutdown_signal};
use eztax_config::AppConfig;
use eztax_notify::api::{AppState, routes};
use eztax_notify::application::{MailerSettings, VerificationMailer};
use eztax_telemetry::init_metrics;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config_dir = std::env::var("EZTAX_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;

    // 初始化运行时
    init_runtime(&config);

    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    };

    // 组装投递链路
    let sender = create_email_sender(&config.email)?;
    let renderer = Arc::new(TemplateEngine::from_config(config.email.template_dir.as_deref())?);
    let mailer = Arc::new(VerificationMailer::new(
        sender,
        renderer,
        MailerSettings::from(&config.email),
    ));

    let app = routes(AppState { mailer, metrics }).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!(%addr, "Starting notify service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Notify service stopped");
    Ok(())
}
