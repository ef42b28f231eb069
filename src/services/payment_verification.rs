//! Client-initiated payment verification.
//!
//! The HMAC signature over `"{order_id}|{payment_id}"` is the sole
//! authenticity check for a client-reported payment; it proves the payload
//! was signed by the gateway, not forged by the browser.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::store::{DonationStore, SettingsStore};
use crate::error::{AppError, AppResult};
use crate::gateway::signature::verify_payment_signature;
use crate::gateway::DonationGateway;
use crate::services::receipt::ReceiptService;
use crate::services::stats::StatsRefresher;

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    pub donation_id: Uuid,
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
}

pub struct PaymentVerificationService {
    settings: Arc<dyn SettingsStore>,
    donations: Arc<dyn DonationStore>,
    gateway: Arc<dyn DonationGateway>,
    stats: Arc<StatsRefresher>,
    receipts: Arc<ReceiptService>,
}

impl PaymentVerificationService {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        donations: Arc<dyn DonationStore>,
        gateway: Arc<dyn DonationGateway>,
        stats: Arc<StatsRefresher>,
        receipts: Arc<ReceiptService>,
    ) -> Self {
        Self {
            settings,
            donations,
            gateway,
            stats,
            receipts,
        }
    }

    pub async fn verify_payment(&self, request: VerifyPaymentRequest) -> AppResult<()> {
        match self.verify_inner(&request).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Best-effort failure mark. The CAS guard means a donation
                // that already reached Paid is left untouched.
                if let Err(mark_err) = self.donations.mark_failed(request.donation_id).await {
                    warn!(
                        donation_id = %request.donation_id,
                        error = %mark_err,
                        "Could not mark donation as failed"
                    );
                }
                Err(err)
            }
        }
    }

    async fn verify_inner(&self, request: &VerifyPaymentRequest) -> AppResult<()> {
        let settings = self
            .settings
            .get_settings()
            .await?
            .ok_or_else(|| AppError::Configuration("gateway settings not found".to_string()))?;
        let credentials = settings.credentials()?;

        if !verify_payment_signature(
            &credentials.key_secret,
            &request.order_id,
            &request.payment_id,
            &request.signature,
        ) {
            return Err(AppError::Signature(format!(
                "invalid signature for donation {}",
                request.donation_id
            )));
        }

        let donation = self
            .donations
            .find_by_id(request.donation_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Donation", request.donation_id.to_string())
            })?;

        // A valid gateway signature for some other order must not flip
        // this donation.
        if donation.gateway_order_id != request.order_id {
            return Err(AppError::validation(
                "Order does not belong to this donation",
            ));
        }

        // Best-effort payment method lookup; a fetch failure leaves the
        // method unset.
        let payment_method = match self
            .gateway
            .fetch_payment(&credentials, &request.payment_id)
            .await
        {
            Ok(details) => details.method.map(|m| m.to_uppercase()),
            Err(e) => {
                warn!(
                    payment_id = %request.payment_id,
                    error = %e,
                    "Could not fetch payment details"
                );
                None
            }
        };

        match self
            .donations
            .mark_paid(
                donation.id,
                &request.payment_id,
                Some(&request.signature),
                payment_method.as_deref(),
            )
            .await?
        {
            Some(paid) => {
                info!(donation_id = %paid.id, payment_id = %request.payment_id, "Payment verified");
                let _ = self.stats.refresh_for(&paid).await;
                let _ = self.receipts.send_receipt(&settings, &paid).await;
            }
            None => {
                // Already terminal; the webhook won the race and handled
                // stats and the receipt. Idempotent success.
                info!(
                    donation_id = %donation.id,
                    status = %donation.payment_status,
                    "Verification arrived after a terminal transition"
                );
            }
        }

        Ok(())
    }
}
