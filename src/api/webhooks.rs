use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::services::webhook_processor::WebhookProcessor;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

pub struct WebhookState {
    pub processor: Arc<WebhookProcessor>,
}

/// POST /webhooks/razorpay
///
/// Always answers 200 with a structured status body. A non-2xx here would
/// make the gateway retry a poison payload forever.
pub async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!(bytes = body.len(), "Received gateway webhook");

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let reply = state
        .processor
        .process_webhook(&body, signature.as_deref())
        .await;

    Json(reply)
}
