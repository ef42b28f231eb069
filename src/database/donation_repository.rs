use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::error::DatabaseError;
use crate::database::store::{Donation, DonationStats, DonationStore, NewDonation, PaymentStatus};

const DONATION_COLUMNS: &str = "id, donor_id, donor_name, donor_email, donor_mobile, campaign_id, \
     amount, message, is_anonymous, gateway_order_id, gateway_payment_id, gateway_signature, \
     payment_method, payment_status, created_at, updated_at";

/// Repository for donation records
///
/// Status transitions are compare-and-swap updates guarded on
/// `payment_status = 'Pending'`, which makes the verification/webhook race
/// converge at the storage layer.
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationStore for DonationRepository {
    async fn insert(&self, new: NewDonation) -> Result<Donation, DatabaseError> {
        sqlx::query_as::<_, Donation>(&format!(
            "INSERT INTO donations
             (donor_id, donor_name, donor_email, donor_mobile, campaign_id, amount,
              message, is_anonymous, gateway_order_id, payment_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            DONATION_COLUMNS
        ))
        .bind(new.donor_id)
        .bind(&new.donor_name)
        .bind(&new.donor_email)
        .bind(&new.donor_mobile)
        .bind(new.campaign_id)
        .bind(&new.amount)
        .bind(&new.message)
        .bind(new.is_anonymous)
        .bind(&new.gateway_order_id)
        .bind(PaymentStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError> {
        sqlx::query_as::<_, Donation>(&format!(
            "SELECT {} FROM donations WHERE id = $1",
            DONATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, DatabaseError> {
        sqlx::query_as::<_, Donation>(&format!(
            "SELECT {} FROM donations WHERE gateway_order_id = $1",
            DONATION_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: Option<&str>,
        payment_method: Option<&str>,
    ) -> Result<Option<Donation>, DatabaseError> {
        sqlx::query_as::<_, Donation>(&format!(
            "UPDATE donations
             SET gateway_payment_id = $2,
                 gateway_signature = COALESCE($3, gateway_signature),
                 payment_method = COALESCE($4, payment_method),
                 payment_status = $5,
                 updated_at = NOW()
             WHERE id = $1 AND payment_status = $6
             RETURNING {}",
            DONATION_COLUMNS
        ))
        .bind(id)
        .bind(payment_id)
        .bind(signature)
        .bind(payment_method)
        .bind(PaymentStatus::Paid.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn mark_failed(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError> {
        sqlx::query_as::<_, Donation>(&format!(
            "UPDATE donations
             SET payment_status = $2, updated_at = NOW()
             WHERE id = $1 AND payment_status = $3
             RETURNING {}",
            DONATION_COLUMNS
        ))
        .bind(id)
        .bind(PaymentStatus::Failed.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn paid_stats(&self) -> Result<DonationStats, DatabaseError> {
        sqlx::query_as::<_, DonationStats>(
            "SELECT COUNT(*) AS total_donations,
                    COALESCE(SUM(amount), 0) AS total_amount,
                    COUNT(DISTINCT donor_id) AS total_donors
             FROM donations
             WHERE payment_status = 'Paid'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn recent_paid(&self, limit: i64) -> Result<Vec<Donation>, DatabaseError> {
        sqlx::query_as::<_, Donation>(&format!(
            "SELECT {} FROM donations
             WHERE payment_status = 'Paid'
             ORDER BY created_at DESC
             LIMIT $1",
            DONATION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
