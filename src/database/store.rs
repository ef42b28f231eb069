//! Entities and storage trait seams for the donation domain.
//!
//! Services depend on these traits rather than on concrete repositories so
//! the payment lifecycle can be exercised against in-memory stores in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::BigDecimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::error::DatabaseError;

/// Donation payment lifecycle states.
///
/// `Pending -> Paid` and `Pending -> Failed` are the only transitions;
/// both terminal states are final. The stores enforce this with
/// compare-and-swap updates, so a late arrival on either the verification
/// or the webhook path degrades to a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }

}

/// Campaign visibility states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatus {
    Active,
    Inactive,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "Active",
            CampaignStatus::Inactive => "Inactive",
            CampaignStatus::Completed => "Completed",
        }
    }
}

/// Donor entity
///
/// Natural key is the email; `total_donated` and `donation_count` are
/// derived aggregates recomputed from paid donations.
#[derive(Debug, Clone, FromRow)]
pub struct Donor {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
    pub mobile: Option<String>,
    pub pan_number: Option<String>,
    pub total_donated: BigDecimal,
    pub donation_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Identity fields for creating or merging a donor
#[derive(Debug, Clone, Default)]
pub struct DonorIdentity {
    pub full_name: Option<String>,
    pub mobile: Option<String>,
    pub pan_number: Option<String>,
}

/// Campaign entity
#[derive(Debug, Clone, FromRow)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub target_amount: BigDecimal,
    pub minimum_amount: BigDecimal,
    pub collected_amount: BigDecimal,
    pub donor_count: i64,
    pub is_default: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub show_on_website: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Donation entity
///
/// Donor identity fields are a snapshot taken at creation time so the
/// historical record survives later donor edits.
#[derive(Debug, Clone, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Option<Uuid>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_mobile: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Donation {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid.as_str()
    }
}

/// Fields required to persist a new pending donation
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_id: Option<Uuid>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_mobile: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub gateway_order_id: String,
}

/// Aggregate totals over paid donations
#[derive(Debug, Clone, FromRow)]
pub struct DonationStats {
    pub total_donations: i64,
    pub total_amount: BigDecimal,
    pub total_donors: i64,
}

/// Persisted gateway settings (singleton row)
#[derive(Debug, Clone, FromRow)]
pub struct GatewaySettings {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: Option<String>,
    pub send_receipt: bool,
}

/// Resolved gateway credentials, passed explicitly into the services that
/// need them.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: Option<String>,
}

impl GatewaySettings {
    /// Fails loudly when key id or secret is unconfigured. A missing
    /// webhook secret is allowed; it disables webhook signature checks.
    pub fn credentials(&self) -> Result<GatewayCredentials, crate::error::AppError> {
        if self.key_id.trim().is_empty() || self.key_secret.trim().is_empty() {
            return Err(crate::error::AppError::Configuration(
                "gateway key_id/key_secret not configured".to_string(),
            ));
        }
        Ok(GatewayCredentials {
            key_id: self.key_id.clone(),
            key_secret: self.key_secret.clone(),
            webhook_secret: self
                .webhook_secret
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.to_string()),
        })
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self) -> Result<Option<GatewaySettings>, DatabaseError>;
}

#[async_trait]
pub trait DonorStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Donor>, DatabaseError>;

    async fn insert(&self, email: &str, identity: &DonorIdentity) -> Result<Donor, DatabaseError>;

    /// Overwrite identity fields with the given (already merged) values.
    async fn update_identity(
        &self,
        id: Uuid,
        identity: &DonorIdentity,
    ) -> Result<Donor, DatabaseError>;

    /// Full recompute of total_donated/donation_count from paid donations.
    async fn refresh_stats(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError>;

    /// Active campaigns shown on the website, default campaign first.
    async fn list_active(&self) -> Result<Vec<Campaign>, DatabaseError>;

    /// Mark one campaign as default, clearing the flag everywhere else.
    async fn set_default(&self, id: Uuid) -> Result<Campaign, DatabaseError>;

    /// Full recompute of collected_amount/donor_count from paid donations.
    async fn refresh_stats(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait DonationStore: Send + Sync {
    async fn insert(&self, new: NewDonation) -> Result<Donation, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, DatabaseError>;

    /// Transition Pending -> Paid, recording gateway payment details.
    ///
    /// Compare-and-swap: returns `None` when the donation was not in
    /// Pending state (already paid or failed), in which case nothing was
    /// written.
    async fn mark_paid(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: Option<&str>,
        payment_method: Option<&str>,
    ) -> Result<Option<Donation>, DatabaseError>;

    /// Transition Pending -> Failed. Same CAS semantics as `mark_paid`;
    /// a Paid donation is never overwritten.
    async fn mark_failed(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError>;

    async fn paid_stats(&self) -> Result<DonationStats, DatabaseError>;

    /// Recent paid donations, newest first.
    async fn recent_paid(&self, limit: i64) -> Result<Vec<Donation>, DatabaseError>;
}
