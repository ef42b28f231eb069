use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::store::CampaignStore;
use crate::error::AppResult;

pub struct CampaignApiState {
    pub campaigns: Arc<dyn CampaignStore>,
}

#[derive(Debug, Serialize)]
pub struct CampaignCard {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: String,
    pub collected_amount: String,
    pub minimum_amount: String,
    pub donor_count: i64,
    pub is_default: bool,
}

/// GET /api/campaigns
///
/// Active campaigns shown on the donation page, default campaign first.
pub async fn list_campaigns(
    State(state): State<Arc<CampaignApiState>>,
) -> AppResult<Json<Vec<CampaignCard>>> {
    let campaigns = state.campaigns.list_active().await?;

    let cards = campaigns
        .into_iter()
        .map(|c| CampaignCard {
            id: c.id,
            name: c.name,
            description: c.description,
            target_amount: c.target_amount.to_string(),
            collected_amount: c.collected_amount.to_string(),
            minimum_amount: c.minimum_amount.to_string(),
            donor_count: c.donor_count,
            is_default: c.is_default,
        })
        .collect();

    Ok(Json(cards))
}
