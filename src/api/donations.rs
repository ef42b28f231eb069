use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::store::DonationStore;
use crate::error::AppResult;
use crate::services::donation_order::{CreateOrderRequest, DonationOrderService, OrderCreated};
use crate::services::payment_verification::{PaymentVerificationService, VerifyPaymentRequest};

const DEFAULT_RECENT_LIMIT: i64 = 10;
const MAX_RECENT_LIMIT: i64 = 100;

pub struct DonationApiState {
    pub orders: Arc<DonationOrderService>,
    pub verification: Arc<PaymentVerificationService>,
    pub donations: Arc<dyn DonationStore>,
}

/// POST /api/donations/orders
pub async fn create_order(
    State(state): State<Arc<DonationApiState>>,
    Json(request): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderCreated>> {
    let created = state.orders.create_order(request).await?;
    Ok(Json(created))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/donations/verify
pub async fn verify_payment(
    State(state): State<Arc<DonationApiState>>,
    Json(request): Json<VerifyPaymentRequest>,
) -> AppResult<Json<VerifyResponse>> {
    state.verification.verify_payment(request).await?;
    Ok(Json(VerifyResponse {
        success: true,
        message: "Payment verified successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_donations: i64,
    pub total_amount: String,
    pub total_donors: i64,
}

/// GET /api/donations/stats
///
/// Routed behind the bearer-token guard.
pub async fn get_stats(
    State(state): State<Arc<DonationApiState>>,
) -> AppResult<Json<StatsResponse>> {
    let stats = state.donations.paid_stats().await?;
    Ok(Json(StatsResponse {
        total_donations: stats.total_donations,
        total_amount: stats.total_amount.to_string(),
        total_donors: stats.total_donors,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecentDonation {
    pub id: Uuid,
    pub donor_name: String,
    pub amount: String,
    pub campaign_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// GET /api/donations/recent
///
/// Routed behind the bearer-token guard. Donor names are anonymized when
/// the donation was flagged anonymous.
pub async fn recent_donations(
    State(state): State<Arc<DonationApiState>>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<RecentDonation>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);

    let donations = state.donations.recent_paid(limit).await?;

    let recent = donations
        .into_iter()
        .map(|d| RecentDonation {
            id: d.id,
            donor_name: if d.is_anonymous {
                "Anonymous".to_string()
            } else {
                d.donor_name.unwrap_or_else(|| "Anonymous".to_string())
            },
            amount: d.amount.to_string(),
            campaign_id: d.campaign_id,
            created_at: d.created_at,
        })
        .collect();

    Ok(Json(recent))
}
