use serde::{Deserialize, Serialize};

/// Order creation request sent to the gateway.
///
/// `amount` is in the gateway's minor currency unit (paisa for INR).
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Audit metadata attached to the gateway order, visible on the gateway
/// dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct OrderNotes {
    pub donor_name: String,
    pub donor_email: String,
    pub campaign: String,
}

/// Gateway order as returned by `POST /v1/orders`
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Payment details as returned by `GET /v1/payments/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetails {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Webhook envelope pushed by the gateway.
///
/// Shape: `{event, payload: {payment: {entity: {...}}}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<WebhookPaymentWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPaymentWrapper {
    pub entity: WebhookPaymentEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPaymentEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl WebhookEnvelope {
    pub fn payment_entity(&self) -> Option<&WebhookPaymentEntity> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }
}
