//! Services module for business logic and integrations

pub mod donation_order;
pub mod payment_verification;
pub mod receipt;
pub mod stats;
pub mod webhook_processor;

pub use donation_order::{CreateOrderRequest, DonationOrderService, OrderCreated};
pub use payment_verification::{PaymentVerificationService, VerifyPaymentRequest};
pub use receipt::{LogMailer, ReceiptMailer, ReceiptOutcome, ReceiptService};
pub use stats::{StatsRefreshOutcome, StatsRefresher};
pub use webhook_processor::{WebhookProcessor, WebhookReply};
