pub mod midtrans;
pub mod upgrade;

pub use midtrans::MidtransGateway;
pub use upgrade::{reconcile_upgrade, UpgradeError};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Fixed price of the premium plan, in the smallest currency unit.
pub const PREMIUM_AMOUNT: i64 = 50000;

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
}

/// Client-side payment token returned by the provider's Snap API.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapToken {
    pub token: String,
}

/// Provider view of one transaction, as returned by the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatus {
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub status_code: String,
}

impl TransactionStatus {
    /// Whether the provider reports the funds as successfully charged.
    /// Card payments report `capture`; other channels report `settlement`.
    pub fn is_captured(&self) -> bool {
        self.status_code == "200"
            && (self.transaction_status == "capture" || self.transaction_status == "settlement")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests a client payment token for a new order.
    async fn create_transaction(
        &self,
        order_id: &str,
        amount: i64,
        customer: &CustomerDetails,
    ) -> Result<SnapToken, GatewayError>;

    /// Looks up the provider-side status of an order.
    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatus, GatewayError>;
}

/// Order ids are unique per request: owner id plus issue time in millis.
pub fn new_order_id(user_id: i64) -> String {
    format!("ORDER-{}-{}", user_id, Utc::now().timestamp_millis())
}
