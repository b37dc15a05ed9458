//! HTTP entrypoint: accepts an already-structured intent and dispatches it.
//!
//! Request bodies are the tagged `ParsedIntent` JSON; bodies that fail schema
//! validation are rejected by the `Json` extractor before reaching the handler.

use crate::core::dispatcher::{DispatchReport, Dispatcher};
use crate::domain::model::{Contact, ParsedIntent};
use crate::utils::error::{MailError, Result};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub const DISPATCH_PATH: &str = "/dispatcher_and_send_mail";

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DispatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/contacts", get(list_contacts))
        .route(DISPATCH_PATH, post(dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

pub async fn serve(listener: TcpListener, dispatcher: Dispatcher) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on {}", addr);
    }
    axum::serve(listener, router(dispatcher)).await?;
    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_contacts(State(dispatcher): State<Dispatcher>) -> Json<Vec<Contact>> {
    Json(dispatcher.contacts().lock().await.contacts())
}

async fn dispatch(
    State(dispatcher): State<Dispatcher>,
    Json(intent): Json<ParsedIntent>,
) -> (StatusCode, Json<DispatchResponse>) {
    tracing::info!("JSON received: '{}' request", intent.kind());

    match dispatcher.dispatch(&intent).await {
        Ok(report) => (
            StatusCode::OK,
            Json(DispatchResponse {
                status: "ok",
                report: Some(report),
                message: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("❌ Dispatch failed: {}", e);
            (
                status_for(&e),
                Json(DispatchResponse {
                    status: "error",
                    report: None,
                    message: Some(e.to_string()),
                }),
            )
        }
    }
}

fn status_for(error: &MailError) -> StatusCode {
    match error {
        MailError::ContactNotFound { .. } => StatusCode::NOT_FOUND,
        MailError::ContactExists { .. } => StatusCode::CONFLICT,
        MailError::MailSendError { .. } | MailError::CredentialError { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
