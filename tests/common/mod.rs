//! Shared in-memory fixtures for the integration tests.
//!
//! The services only see the store traits, so the whole payment lifecycle
//! can run against a single mutex-guarded state bag plus a scripted
//! gateway, without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::types::BigDecimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use donations_backend::database::error::{DatabaseError, DatabaseErrorKind};
use donations_backend::database::store::{
    Campaign, CampaignStore, Donation, DonationStats, DonationStore, Donor, DonorIdentity,
    DonorStore, GatewayCredentials, GatewaySettings, NewDonation, PaymentStatus, SettingsStore,
};
use donations_backend::gateway::error::{GatewayError, GatewayResult};
use donations_backend::gateway::signature::payment_signature;
use donations_backend::gateway::types::{GatewayOrder, OrderRequest, PaymentDetails};
use donations_backend::gateway::DonationGateway;
use donations_backend::services::receipt::{ReceiptError, ReceiptMailer};
use donations_backend::services::{
    DonationOrderService, PaymentVerificationService, ReceiptService, StatsRefresher,
    WebhookProcessor,
};

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "rzp_test_secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub fn dec(raw: &str) -> BigDecimal {
    BigDecimal::from_str(raw).expect("valid decimal literal")
}

/// Signature the gateway would attach to a client-reported payment.
pub fn sign_payment(order_id: &str, payment_id: &str) -> String {
    payment_signature(KEY_SECRET, order_id, payment_id).expect("signature")
}

/// Signature the gateway would attach to a webhook body.
pub fn sign_webhook(body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("webhook secret");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Default)]
struct MemoryState {
    settings: Option<GatewaySettings>,
    donors: Vec<Donor>,
    campaigns: Vec<Campaign>,
    donations: Vec<Donation>,
}

/// One state bag implementing all four store traits.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        let store = Arc::new(Self {
            state: Mutex::new(MemoryState::default()),
        });
        store.put_settings(GatewaySettings {
            key_id: KEY_ID.to_string(),
            key_secret: KEY_SECRET.to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            send_receipt: true,
        });
        store
    }

    pub fn put_settings(&self, settings: GatewaySettings) {
        self.state.lock().unwrap().settings = Some(settings);
    }

    pub fn seed_campaign(&self, name: &str, minimum: &str, is_default: bool) -> Campaign {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            status: "Active".to_string(),
            target_amount: dec("100000"),
            minimum_amount: dec(minimum),
            collected_amount: dec("0"),
            donor_count: 0,
            is_default,
            start_date: None,
            end_date: None,
            show_on_website: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.state.lock().unwrap().campaigns.push(campaign.clone());
        campaign
    }

    pub fn donation(&self, id: Uuid) -> Option<Donation> {
        self.state
            .lock()
            .unwrap()
            .donations
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn donor(&self, email: &str) -> Option<Donor> {
        self.state
            .lock()
            .unwrap()
            .donors
            .iter()
            .find(|d| d.email == email)
            .cloned()
    }

    pub fn donor_rows(&self) -> usize {
        self.state.lock().unwrap().donors.len()
    }

    pub fn campaign(&self, id: Uuid) -> Option<Campaign> {
        self.state
            .lock()
            .unwrap()
            .campaigns
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn campaigns(&self) -> Vec<Campaign> {
        self.state.lock().unwrap().campaigns.clone()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_settings(&self) -> Result<Option<GatewaySettings>, DatabaseError> {
        Ok(self.state.lock().unwrap().settings.clone())
    }
}

#[async_trait]
impl DonorStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Donor>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .donors
            .iter()
            .find(|d| d.email == email)
            .cloned())
    }

    async fn insert(&self, email: &str, identity: &DonorIdentity) -> Result<Donor, DatabaseError> {
        let donor = Donor {
            id: Uuid::new_v4(),
            full_name: identity.full_name.clone(),
            email: email.to_string(),
            mobile: identity.mobile.clone(),
            pan_number: identity.pan_number.clone(),
            total_donated: dec("0"),
            donation_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.state.lock().unwrap().donors.push(donor.clone());
        Ok(donor)
    }

    async fn update_identity(
        &self,
        id: Uuid,
        identity: &DonorIdentity,
    ) -> Result<Donor, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let donor = state
            .donors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| {
                DatabaseError::new(DatabaseErrorKind::NotFound {
                    entity: "Donor".to_string(),
                    id: id.to_string(),
                })
            })?;
        donor.full_name = identity.full_name.clone();
        donor.mobile = identity.mobile.clone();
        donor.pan_number = identity.pan_number.clone();
        donor.updated_at = chrono::Utc::now();
        Ok(donor.clone())
    }

    async fn refresh_stats(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let paid: Vec<&Donation> = state
            .donations
            .iter()
            .filter(|d| d.donor_id == Some(id) && d.is_paid())
            .collect();
        let total = paid
            .iter()
            .fold(dec("0"), |acc, d| acc + d.amount.clone());
        let count = paid.len() as i64;

        if let Some(donor) = state.donors.iter_mut().find(|d| d.id == id) {
            donor.total_donated = total;
            donor.donation_count = count;
        }
        Ok(())
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .campaigns
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Campaign>, DatabaseError> {
        let mut active: Vec<Campaign> = self
            .state
            .lock()
            .unwrap()
            .campaigns
            .iter()
            .filter(|c| c.status == "Active" && c.show_on_website)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(active)
    }

    async fn set_default(&self, id: Uuid) -> Result<Campaign, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if !state.campaigns.iter().any(|c| c.id == id) {
            return Err(DatabaseError::new(DatabaseErrorKind::NotFound {
                entity: "Campaign".to_string(),
                id: id.to_string(),
            }));
        }
        for campaign in state.campaigns.iter_mut() {
            campaign.is_default = campaign.id == id;
        }
        Ok(state
            .campaigns
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("campaign just updated"))
    }

    async fn refresh_stats(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let paid: Vec<&Donation> = state
            .donations
            .iter()
            .filter(|d| d.campaign_id == Some(id) && d.is_paid())
            .collect();
        let collected = paid
            .iter()
            .fold(dec("0"), |acc, d| acc + d.amount.clone());
        let donors: HashSet<Uuid> = paid.iter().filter_map(|d| d.donor_id).collect();
        let donor_count = donors.len() as i64;

        if let Some(campaign) = state.campaigns.iter_mut().find(|c| c.id == id) {
            campaign.collected_amount = collected;
            campaign.donor_count = donor_count;
        }
        Ok(())
    }
}

#[async_trait]
impl DonationStore for MemoryStore {
    async fn insert(&self, new: NewDonation) -> Result<Donation, DatabaseError> {
        let donation = Donation {
            id: Uuid::new_v4(),
            donor_id: new.donor_id,
            donor_name: new.donor_name,
            donor_email: new.donor_email,
            donor_mobile: new.donor_mobile,
            campaign_id: new.campaign_id,
            amount: new.amount,
            message: new.message,
            is_anonymous: new.is_anonymous,
            gateway_order_id: new.gateway_order_id,
            gateway_payment_id: None,
            gateway_signature: None,
            payment_method: None,
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.state.lock().unwrap().donations.push(donation.clone());
        Ok(donation)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError> {
        Ok(self.donation(id))
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .donations
            .iter()
            .find(|d| d.gateway_order_id == order_id)
            .cloned())
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: Option<&str>,
        payment_method: Option<&str>,
    ) -> Result<Option<Donation>, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let donation = match state.donations.iter_mut().find(|d| d.id == id) {
            Some(donation) => donation,
            None => return Ok(None),
        };
        if donation.payment_status != PaymentStatus::Pending.as_str() {
            return Ok(None);
        }
        donation.payment_status = PaymentStatus::Paid.as_str().to_string();
        donation.gateway_payment_id = Some(payment_id.to_string());
        donation.gateway_signature = signature.map(|s| s.to_string());
        donation.payment_method = payment_method.map(|m| m.to_string());
        donation.updated_at = chrono::Utc::now();
        Ok(Some(donation.clone()))
    }

    async fn mark_failed(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let donation = match state.donations.iter_mut().find(|d| d.id == id) {
            Some(donation) => donation,
            None => return Ok(None),
        };
        if donation.payment_status != PaymentStatus::Pending.as_str() {
            return Ok(None);
        }
        donation.payment_status = PaymentStatus::Failed.as_str().to_string();
        donation.updated_at = chrono::Utc::now();
        Ok(Some(donation.clone()))
    }

    async fn paid_stats(&self) -> Result<DonationStats, DatabaseError> {
        let state = self.state.lock().unwrap();
        let paid: Vec<&Donation> = state.donations.iter().filter(|d| d.is_paid()).collect();
        let total_amount = paid
            .iter()
            .fold(dec("0"), |acc, d| acc + d.amount.clone());
        let donors: HashSet<Uuid> = paid.iter().filter_map(|d| d.donor_id).collect();
        Ok(DonationStats {
            total_donations: paid.len() as i64,
            total_amount,
            total_donors: donors.len() as i64,
        })
    }

    async fn recent_paid(&self, limit: i64) -> Result<Vec<Donation>, DatabaseError> {
        let mut paid: Vec<Donation> = self
            .state
            .lock()
            .unwrap()
            .donations
            .iter()
            .filter(|d| d.is_paid())
            .cloned()
            .collect();
        paid.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        paid.truncate(limit.max(0) as usize);
        Ok(paid)
    }
}

/// Scripted gateway. Orders get sequential ids; `fail_orders` makes
/// `create_order` return an HTTP 500.
pub struct MockGateway {
    counter: AtomicU64,
    fail_orders: AtomicBool,
    payment_method: Mutex<Option<String>>,
    pub orders: Mutex<Vec<OrderRequest>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counter: AtomicU64::new(0),
            fail_orders: AtomicBool::new(false),
            payment_method: Mutex::new(Some("upi".to_string())),
            orders: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_next_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn set_payment_method(&self, method: Option<&str>) {
        *self.payment_method.lock().unwrap() = method.map(|m| m.to_string());
    }
}

#[async_trait]
impl DonationGateway for MockGateway {
    async fn create_order(
        &self,
        _credentials: &GatewayCredentials,
        request: &OrderRequest,
    ) -> GatewayResult<GatewayOrder> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(GatewayError::Http {
                status: 500,
                body: "{\"error\":\"internal\"}".to_string(),
            });
        }
        self.orders.lock().unwrap().push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            id: format!("order_mock_{}", n),
            amount: request.amount,
            currency: request.currency.clone(),
            status: Some("created".to_string()),
        })
    }

    async fn fetch_payment(
        &self,
        _credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> GatewayResult<PaymentDetails> {
        Ok(PaymentDetails {
            id: payment_id.to_string(),
            order_id: None,
            method: self.payment_method.lock().unwrap().clone(),
            status: Some("captured".to_string()),
        })
    }
}

/// Mailer that records deliveries instead of sending anything.
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ReceiptMailer for RecordingMailer {
    async fn deliver(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), ReceiptError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Fully wired service stack over the in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<MockGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub orders: Arc<DonationOrderService>,
    pub verification: Arc<PaymentVerificationService>,
    pub webhooks: Arc<WebhookProcessor>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let mailer = RecordingMailer::new();

        let settings: Arc<dyn SettingsStore> = store.clone();
        let donors: Arc<dyn DonorStore> = store.clone();
        let campaigns: Arc<dyn CampaignStore> = store.clone();
        let donations: Arc<dyn DonationStore> = store.clone();
        let gateway_dyn: Arc<dyn DonationGateway> = gateway.clone();

        let stats = Arc::new(StatsRefresher::new(donors.clone(), campaigns.clone()));
        let receipts = Arc::new(ReceiptService::new(mailer.clone()));

        let orders = Arc::new(DonationOrderService::new(
            settings.clone(),
            donors.clone(),
            campaigns.clone(),
            donations.clone(),
            gateway_dyn.clone(),
        ));
        let verification = Arc::new(PaymentVerificationService::new(
            settings.clone(),
            donations.clone(),
            gateway_dyn.clone(),
            stats.clone(),
            receipts.clone(),
        ));
        let webhooks = Arc::new(WebhookProcessor::new(settings, donations, stats, receipts));

        Self {
            store,
            gateway,
            mailer,
            orders,
            verification,
            webhooks,
        }
    }

    /// JSON body for a captured-payment webhook.
    pub fn captured_body(order_id: &str, payment_id: &str) -> Vec<u8> {
        serde_json::json!({
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": payment_id,
                        "order_id": order_id,
                        "method": "card"
                    }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    /// JSON body for a failed-payment webhook.
    pub fn failed_body(order_id: &str, payment_id: &str) -> Vec<u8> {
        serde_json::json!({
            "event": "payment.failed",
            "payload": {
                "payment": {
                    "entity": {
                        "id": payment_id,
                        "order_id": order_id,
                        "method": "card"
                    }
                }
            }
        })
        .to_string()
        .into_bytes()
    }
}
