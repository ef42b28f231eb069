use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::error::DatabaseError;
use crate::database::store::{Donor, DonorIdentity, DonorStore};

const DONOR_COLUMNS: &str = "id, full_name, email, mobile, pan_number, total_donated, \
     donation_count, created_at, updated_at";

/// Repository for donor records
pub struct DonorRepository {
    pool: PgPool,
}

impl DonorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonorStore for DonorRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Donor>, DatabaseError> {
        sqlx::query_as::<_, Donor>(&format!(
            "SELECT {} FROM donors WHERE email = $1",
            DONOR_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn insert(&self, email: &str, identity: &DonorIdentity) -> Result<Donor, DatabaseError> {
        sqlx::query_as::<_, Donor>(&format!(
            "INSERT INTO donors (email, full_name, mobile, pan_number)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            DONOR_COLUMNS
        ))
        .bind(email)
        .bind(&identity.full_name)
        .bind(&identity.mobile)
        .bind(&identity.pan_number)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update_identity(
        &self,
        id: Uuid,
        identity: &DonorIdentity,
    ) -> Result<Donor, DatabaseError> {
        sqlx::query_as::<_, Donor>(&format!(
            "UPDATE donors
             SET full_name = $2, mobile = $3, pan_number = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            DONOR_COLUMNS
        ))
        .bind(id)
        .bind(&identity.full_name)
        .bind(&identity.mobile)
        .bind(&identity.pan_number)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn refresh_stats(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE donors d
             SET total_donated = s.total,
                 donation_count = s.cnt,
                 updated_at = NOW()
             FROM (
                 SELECT COALESCE(SUM(amount), 0) AS total, COUNT(*) AS cnt
                 FROM donations
                 WHERE donor_id = $1 AND payment_status = 'Paid'
             ) s
             WHERE d.id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }
}
