//! Donation order creation.
//!
//! Validates the request, upserts the donor, creates a gateway order and
//! persists the pending donation. Side effect ordering matters: the donor
//! upsert happens before the gateway call (a stray donor row is harmless
//! if the gateway call then fails), while the donation row is only written
//! after the gateway confirmed the order, so no donation exists without a
//! real gateway order id.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::info;
use uuid::Uuid;

use crate::database::store::{
    CampaignStore, DonationStore, Donor, DonorIdentity, DonorStore, NewDonation, SettingsStore,
};
use crate::error::{AppError, AppResult};
use crate::gateway::types::{OrderNotes, OrderRequest};
use crate::gateway::DonationGateway;

/// Fixed settlement currency; the gateway's minor unit is paisa.
pub const CURRENCY: &str = "INR";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: String,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub pan_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Returned to the client so it can launch the payment widget. Carries
/// the public key id, never the secret.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreated {
    pub donation_id: Uuid,
    pub order_id: String,
    pub amount: String,
    pub key_id: String,
}

pub struct DonationOrderService {
    settings: Arc<dyn SettingsStore>,
    donors: Arc<dyn DonorStore>,
    campaigns: Arc<dyn CampaignStore>,
    donations: Arc<dyn DonationStore>,
    gateway: Arc<dyn DonationGateway>,
}

impl DonationOrderService {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        donors: Arc<dyn DonorStore>,
        campaigns: Arc<dyn CampaignStore>,
        donations: Arc<dyn DonationStore>,
        gateway: Arc<dyn DonationGateway>,
    ) -> Self {
        Self {
            settings,
            donors,
            campaigns,
            donations,
            gateway,
        }
    }

    pub async fn create_order(&self, request: CreateOrderRequest) -> AppResult<OrderCreated> {
        let amount = parse_amount(&request.amount)?;

        let mut request = request;
        request.pan_number = normalize_pan(request.pan_number.as_deref())?;

        if let Some(campaign_id) = request.campaign_id {
            let campaign = self
                .campaigns
                .find_by_id(campaign_id)
                .await?
                .ok_or_else(|| AppError::not_found("Campaign", campaign_id.to_string()))?;

            if amount < campaign.minimum_amount {
                return Err(AppError::validation(format!(
                    "Minimum donation amount is {}",
                    campaign.minimum_amount
                )));
            }
        }

        let settings = self
            .settings
            .get_settings()
            .await?
            .ok_or_else(|| AppError::Configuration("gateway settings not found".to_string()))?;
        let credentials = settings.credentials()?;

        let donor = self.resolve_donor(&request).await?;

        let order_request = OrderRequest {
            amount: to_minor_units(&amount).ok_or_else(|| {
                AppError::validation("Amount is too large to process".to_string())
            })?,
            currency: CURRENCY.to_string(),
            receipt: format!("donation_{}", Uuid::new_v4().simple()),
            notes: OrderNotes {
                donor_name: request
                    .full_name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                donor_email: request.email.clone().unwrap_or_default(),
                campaign: request
                    .campaign_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            },
        };

        let order = self
            .gateway
            .create_order(&credentials, &order_request)
            .await?;

        // Snapshot donor fields from the request inputs, not from the
        // donor record, so the historical row reflects what was submitted.
        let donation = self
            .donations
            .insert(NewDonation {
                donor_id: donor.as_ref().map(|d| d.id),
                donor_name: request.full_name.clone(),
                donor_email: request.email.clone(),
                donor_mobile: request.mobile.clone(),
                campaign_id: request.campaign_id,
                amount: amount.clone(),
                message: request.message.clone(),
                is_anonymous: request.is_anonymous,
                gateway_order_id: order.id.clone(),
            })
            .await?;

        info!(
            donation_id = %donation.id,
            order_id = %order.id,
            amount = %amount,
            "Donation order created"
        );

        Ok(OrderCreated {
            donation_id: donation.id,
            order_id: order.id,
            amount: amount.to_string(),
            key_id: credentials.key_id,
        })
    }

    /// Upsert-by-email. No email means a donor-less (anonymous) donation.
    async fn resolve_donor(&self, request: &CreateOrderRequest) -> AppResult<Option<Donor>> {
        let email = match request.email.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(email) => email.trim(),
            None => return Ok(None),
        };

        let incoming = DonorIdentity {
            full_name: request.full_name.clone(),
            mobile: request.mobile.clone(),
            pan_number: request.pan_number.clone(),
        };

        let donor = match self.donors.find_by_email(email).await? {
            Some(existing) => match merge_identity(&existing, &incoming) {
                Some(merged) => self.donors.update_identity(existing.id, &merged).await?,
                None => existing,
            },
            None => self.donors.insert(email, &incoming).await?,
        };

        Ok(Some(donor))
    }
}

/// Parse a positive decimal amount from user input.
pub fn parse_amount(raw: &str) -> AppResult<BigDecimal> {
    let amount = BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::validation("Amount must be a number"))?;

    if amount <= BigDecimal::from(0) {
        return Err(AppError::validation("Amount must be greater than 0"));
    }

    Ok(amount)
}

fn pan_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Z]{5}[0-9]{4}[A-Z]$").expect("static pattern"))
}

/// Normalize an optional PAN: trim, upcase, validate the standard
/// five-letters/four-digits/one-letter format. Blank input counts as
/// absent.
pub fn normalize_pan(raw: Option<&str>) -> AppResult<Option<String>> {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let pan = raw.to_uppercase();
    if !pan_pattern().is_match(&pan) {
        return Err(AppError::validation(
            "Please enter a valid PAN number (e.g., ABCDE1234F)",
        ));
    }

    Ok(Some(pan))
}

/// Convert to the gateway's minor units (amount * 100, rounded).
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
}

/// Field-level donor merge: a field is overwritten only when the incoming
/// value is non-empty and differs. Returns `None` when nothing changed.
pub fn merge_identity(existing: &Donor, incoming: &DonorIdentity) -> Option<DonorIdentity> {
    fn pick(current: &Option<String>, incoming: &Option<String>) -> (Option<String>, bool) {
        match incoming.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(new_value) if current.as_deref() != Some(new_value) => {
                (Some(new_value.to_string()), true)
            }
            _ => (current.clone(), false),
        }
    }

    let (full_name, name_changed) = pick(&existing.full_name, &incoming.full_name);
    let (mobile, mobile_changed) = pick(&existing.mobile, &incoming.mobile);
    let (pan_number, pan_changed) = pick(&existing.pan_number, &incoming.pan_number);

    if name_changed || mobile_changed || pan_changed {
        Some(DonorIdentity {
            full_name,
            mobile,
            pan_number,
        })
    } else {
        None
    }
}
