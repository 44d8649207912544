use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::{any::Any, net::SocketAddr, sync::Arc};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::webhook::WebhookProcessor;

pub async fn serve(cfg: &Config, processor: Arc<WebhookProcessor>) -> eyre::Result<()> {
    let addr = SocketAddr::new(cfg.bind_addr, cfg.port);
    info!("Webhook listener on http://{}/webhook", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(processor).into_make_service()).await?;

    Ok(())
}

pub fn router(processor: Arc<WebhookProcessor>) -> Router {
    Router::new()
        .route("/", get(|| async { "Fresh wallet watcher running" }))
        .route("/webhook", post(handle_webhook))
        .with_state(processor)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

async fn handle_webhook(
    State(processor): State<Arc<WebhookProcessor>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    match processor.process(&body).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "processed",
                "events": summary.events,
                "alerts": summary.alerts
            })),
        ),
        Err(e) => {
            error!(error = %e, "⚠️ Webhook handler failed");
            error_response()
        }
    }
}

fn error_response() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error" })),
    )
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "⚠️ Webhook handler panicked");
    error_response().into_response()
}
