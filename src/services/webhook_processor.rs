//! Webhook reconciliation.
//!
//! The gateway pushes payment events independently of the client's browser
//! session; this processor converges the donation's status even when
//! client-side verification never runs. It always produces a status reply
//! and never propagates an error, so the HTTP handler can answer 200 and
//! the gateway's retry policy is not triggered by poison payloads.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::database::store::{DonationStore, SettingsStore};
use crate::error::{AppError, AppResult};
use crate::gateway::signature::verify_webhook_signature;
use crate::gateway::types::WebhookEnvelope;
use crate::services::receipt::ReceiptService;
use crate::services::stats::StatsRefresher;

pub const EVENT_PAYMENT_CAPTURED: &str = "payment.captured";
pub const EVENT_PAYMENT_FAILED: &str = "payment.failed";

/// Structured reply body for the gateway.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookReply {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookReply {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

pub struct WebhookProcessor {
    settings: Arc<dyn SettingsStore>,
    donations: Arc<dyn DonationStore>,
    stats: Arc<StatsRefresher>,
    receipts: Arc<ReceiptService>,
}

impl WebhookProcessor {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        donations: Arc<dyn DonationStore>,
        stats: Arc<StatsRefresher>,
        receipts: Arc<ReceiptService>,
    ) -> Self {
        Self {
            settings,
            donations,
            stats,
            receipts,
        }
    }

    pub async fn process_webhook(&self, body: &[u8], signature: Option<&str>) -> WebhookReply {
        match self.process_inner(body, signature).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Webhook processing failed");
                WebhookReply::error(e.user_message())
            }
        }
    }

    async fn process_inner(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> AppResult<WebhookReply> {
        let settings = self
            .settings
            .get_settings()
            .await?
            .ok_or_else(|| AppError::Configuration("gateway settings not found".to_string()))?;
        let credentials = settings.credentials()?;

        match (credentials.webhook_secret.as_deref(), signature) {
            (Some(secret), Some(signature)) => {
                if !verify_webhook_signature(secret, body, signature) {
                    warn!("Invalid webhook signature");
                    return Ok(WebhookReply::error("Invalid signature"));
                }
            }
            (Some(_), None) => {
                // Secret configured but no header supplied; accepted for
                // parity with gateway test deliveries, logged for the
                // operator.
                warn!("Webhook received without signature header");
            }
            (None, _) => {
                // Trust-all mode, a known weaker posture.
                warn!("Webhook secret not configured, skipping signature verification");
            }
        }

        let envelope: WebhookEnvelope = match serde_json::from_slice(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Malformed webhook payload");
                return Ok(WebhookReply::error("Invalid payload"));
            }
        };

        match envelope.event.as_str() {
            EVENT_PAYMENT_CAPTURED => self.handle_captured(&settings, &envelope).await,
            EVENT_PAYMENT_FAILED => self.handle_failed(&envelope).await,
            other => {
                info!(event = %other, "Ignoring webhook event");
                Ok(WebhookReply::success())
            }
        }
    }

    async fn handle_captured(
        &self,
        settings: &crate::database::store::GatewaySettings,
        envelope: &WebhookEnvelope,
    ) -> AppResult<WebhookReply> {
        let entity = match envelope.payment_entity() {
            Some(entity) => entity,
            None => return Ok(WebhookReply::error("Missing payment entity")),
        };
        let order_id = match entity.order_id.as_deref() {
            Some(order_id) => order_id,
            None => return Ok(WebhookReply::error("Missing order id")),
        };

        let donation = match self.donations.find_by_order_id(order_id).await? {
            Some(donation) => donation,
            None => {
                // Orders created outside this system show up here too.
                info!(order_id = %order_id, "No donation for captured order");
                return Ok(WebhookReply::success());
            }
        };

        let payment_id = entity.id.as_deref().unwrap_or_default();
        let payment_method = entity.method.as_deref().map(|m| m.to_uppercase());

        match self
            .donations
            .mark_paid(donation.id, payment_id, None, payment_method.as_deref())
            .await?
        {
            Some(paid) => {
                info!(
                    donation_id = %paid.id,
                    order_id = %order_id,
                    "Donation reconciled as paid via webhook"
                );
                let _ = self.stats.refresh_for(&paid).await;
                let _ = self.receipts.send_receipt(settings, &paid).await;
            }
            None => {
                // Duplicate delivery or the client verification got there
                // first.
                info!(donation_id = %donation.id, "Captured webhook was a no-op");
            }
        }

        Ok(WebhookReply::success())
    }

    async fn handle_failed(&self, envelope: &WebhookEnvelope) -> AppResult<WebhookReply> {
        let order_id = match envelope.payment_entity().and_then(|e| e.order_id.as_deref()) {
            Some(order_id) => order_id,
            None => return Ok(WebhookReply::error("Missing order id")),
        };

        let donation = match self.donations.find_by_order_id(order_id).await? {
            Some(donation) => donation,
            None => return Ok(WebhookReply::success()),
        };

        // CAS: only a still-pending donation can fail; Paid is never
        // reverted.
        match self.donations.mark_failed(donation.id).await? {
            Some(failed) => {
                info!(donation_id = %failed.id, order_id = %order_id, "Donation marked failed via webhook");
            }
            None => {
                info!(donation_id = %donation.id, "Failed webhook was a no-op");
            }
        }

        Ok(WebhookReply::success())
    }
}
