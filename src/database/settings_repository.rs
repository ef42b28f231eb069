use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::error::DatabaseError;
use crate::database::store::{GatewaySettings, SettingsStore};

/// Repository for the singleton gateway settings row
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get_settings(&self) -> Result<Option<GatewaySettings>, DatabaseError> {
        sqlx::query_as::<_, GatewaySettings>(
            "SELECT key_id, key_secret, webhook_secret, send_receipt
             FROM gateway_settings
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
