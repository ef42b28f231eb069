//! Payment gateway integration (Razorpay)

pub mod error;
pub mod razorpay;
pub mod signature;
pub mod types;

use async_trait::async_trait;

use crate::database::store::GatewayCredentials;
use crate::gateway::error::GatewayResult;
use crate::gateway::types::{GatewayOrder, OrderRequest, PaymentDetails};

/// Seam over the gateway's HTTP API.
///
/// Credentials are passed per call because they are resolved from the
/// persisted settings row on every request, not from ambient state.
#[async_trait]
pub trait DonationGateway: Send + Sync {
    /// `POST /v1/orders` — reserve an expected payment.
    async fn create_order(
        &self,
        credentials: &GatewayCredentials,
        request: &OrderRequest,
    ) -> GatewayResult<GatewayOrder>;

    /// `GET /v1/payments/{id}` — fetch payment details (payment method).
    async fn fetch_payment(
        &self,
        credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> GatewayResult<PaymentDetails>;
}
