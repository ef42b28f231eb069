//! Receipt email side channel.
//!
//! Delivery is best-effort: a failed receipt is logged and swallowed, it
//! must never fail the payment response that triggered it.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::store::{Donation, GatewaySettings};

#[derive(Debug, Clone, Error)]
pub enum ReceiptError {
    #[error("delivery failed: {message}")]
    Delivery { message: String },
}

/// Transport seam for receipt delivery.
#[async_trait]
pub trait ReceiptMailer: Send + Sync {
    async fn deliver(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ReceiptError>;
}

/// Structured-log delivery, the default transport until a real mail
/// provider is wired in.
pub struct LogMailer;

#[async_trait]
impl ReceiptMailer for LogMailer {
    async fn deliver(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ReceiptError> {
        info!(
            to = %to,
            subject = %subject,
            body_bytes = html_body.len(),
            "🔔 RECEIPT: donation receipt delivered"
        );
        Ok(())
    }
}

/// What a receipt attempt did, for callers and tests; callers are free to
/// ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Sent,
    /// The send_receipt setting is off.
    Disabled,
    /// Donation has no donor email (anonymous path).
    NoRecipient,
    /// Transport failure; already logged.
    Failed,
}

pub struct ReceiptService {
    mailer: Arc<dyn ReceiptMailer>,
}

impl ReceiptService {
    pub fn new(mailer: Arc<dyn ReceiptMailer>) -> Self {
        Self { mailer }
    }

    /// Send the receipt for a paid donation. Never returns an error.
    pub async fn send_receipt(
        &self,
        settings: &GatewaySettings,
        donation: &Donation,
    ) -> ReceiptOutcome {
        if !settings.send_receipt {
            return ReceiptOutcome::Disabled;
        }

        let to = match donation.donor_email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => email,
            None => return ReceiptOutcome::NoRecipient,
        };

        let subject = format!("Thank you for your donation - {}", donation.id);
        let body = render_receipt(donation);

        match self.mailer.deliver(to, &subject, &body).await {
            Ok(()) => ReceiptOutcome::Sent,
            Err(e) => {
                warn!(donation_id = %donation.id, error = %e, "Failed to send donation receipt");
                ReceiptOutcome::Failed
            }
        }
    }
}

fn render_receipt(donation: &Donation) -> String {
    let donor_name = donation.donor_name.as_deref().unwrap_or("Donor");
    let payment_id = donation.gateway_payment_id.as_deref().unwrap_or("N/A");
    let date = donation.created_at.format("%Y-%m-%d");

    format!(
        r#"<h2>Thank You for Your Donation!</h2>
<p>Dear {donor_name},</p>
<p>We have received your generous donation. Here are the details:</p>
<table style="border-collapse: collapse; margin: 20px 0;">
  <tr>
    <td style="padding: 8px; border: 1px solid #ddd;"><strong>Donation ID</strong></td>
    <td style="padding: 8px; border: 1px solid #ddd;">{id}</td>
  </tr>
  <tr>
    <td style="padding: 8px; border: 1px solid #ddd;"><strong>Amount</strong></td>
    <td style="padding: 8px; border: 1px solid #ddd;">₹{amount}</td>
  </tr>
  <tr>
    <td style="padding: 8px; border: 1px solid #ddd;"><strong>Payment ID</strong></td>
    <td style="padding: 8px; border: 1px solid #ddd;">{payment_id}</td>
  </tr>
  <tr>
    <td style="padding: 8px; border: 1px solid #ddd;"><strong>Date</strong></td>
    <td style="padding: 8px; border: 1px solid #ddd;">{date}</td>
  </tr>
</table>
<p>Your support means a lot to us. Thank you for making a difference!</p>"#,
        donor_name = donor_name,
        id = donation.id,
        amount = donation.amount,
        payment_id = payment_id,
        date = date,
    )
}
