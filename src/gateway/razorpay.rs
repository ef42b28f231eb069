use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use crate::config::GatewayHttpConfig;
use crate::database::store::GatewayCredentials;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::types::{GatewayOrder, OrderRequest, PaymentDetails};
use crate::gateway::DonationGateway;

/// Razorpay HTTP client.
///
/// Authenticates every call with basic auth (key id / key secret). A call
/// that hangs is bounded by the configured request timeout; there is no
/// retry, failures surface immediately to the caller.
pub struct RazorpayClient {
    base_url: String,
    client: Client,
}

impl RazorpayClient {
    pub fn new(config: &GatewayHttpConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| GatewayError::Network {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DonationGateway for RazorpayClient {
    async fn create_order(
        &self,
        credentials: &GatewayCredentials,
        request: &OrderRequest,
    ) -> GatewayResult<GatewayOrder> {
        if request.amount <= 0 {
            return Err(GatewayError::Validation {
                message: "order amount must be positive".to_string(),
            });
        }

        let response = self
            .client
            .post(self.endpoint("/v1/orders"))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                message: format!("order creation request failed: {}", e),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            // The raw body is logged for the operator and never surfaced
            // to the end user.
            error!(status = %status, body = %text, "Razorpay order creation failed");
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let order: GatewayOrder =
            serde_json::from_str(&text).map_err(|e| GatewayError::InvalidResponse {
                message: format!("invalid order response: {}", e),
            })?;

        info!(order_id = %order.id, amount = order.amount, "Razorpay order created");
        Ok(order)
    }

    async fn fetch_payment(
        &self,
        credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> GatewayResult<PaymentDetails> {
        let response = self
            .client
            .get(self.endpoint(&format!("/v1/payments/{}", payment_id)))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                message: format!("payment fetch request failed: {}", e),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| GatewayError::InvalidResponse {
            message: format!("invalid payment response: {}", e),
        })
    }
}
