use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::database::store::{Campaign, CampaignStatus, CampaignStore};

const CAMPAIGN_COLUMNS: &str = "id, name, description, status, target_amount, minimum_amount, \
     collected_amount, donor_count, is_default, start_date, end_date, show_on_website, \
     created_at, updated_at";

/// Repository for fundraising campaigns
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for CampaignRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError> {
        sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {} FROM campaigns WHERE id = $1",
            CAMPAIGN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_active(&self) -> Result<Vec<Campaign>, DatabaseError> {
        sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {} FROM campaigns
             WHERE status = $1 AND show_on_website = TRUE
             ORDER BY is_default DESC, created_at DESC",
            CAMPAIGN_COLUMNS
        ))
        .bind(CampaignStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn set_default(&self, id: Uuid) -> Result<Campaign, DatabaseError> {
        // Invariant: at most one campaign carries is_default. Clearing and
        // setting happen in one transaction.
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;

        sqlx::query("UPDATE campaigns SET is_default = FALSE WHERE id != $1 AND is_default = TRUE")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let updated = sqlx::query_as::<_, Campaign>(&format!(
            "UPDATE campaigns
             SET is_default = TRUE, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            CAMPAIGN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let campaign = match updated {
            Some(campaign) => campaign,
            None => {
                tx.rollback().await.map_err(DatabaseError::from_sqlx)?;
                return Err(DatabaseError::new(DatabaseErrorKind::NotFound {
                    entity: "Campaign".to_string(),
                    id: id.to_string(),
                }));
            }
        };

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(campaign)
    }

    async fn refresh_stats(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE campaigns c
             SET collected_amount = s.total,
                 donor_count = s.donors,
                 updated_at = NOW()
             FROM (
                 SELECT COALESCE(SUM(amount), 0) AS total,
                        COUNT(DISTINCT donor_id) AS donors
                 FROM donations
                 WHERE campaign_id = $1 AND payment_status = 'Paid'
             ) s
             WHERE c.id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }
}
