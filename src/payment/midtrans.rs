use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use super::{CustomerDetails, GatewayError, PaymentGateway, SnapToken, TransactionStatus};
use crate::config::MidtransConfig;

/// Midtrans adapter: Snap API for token creation, core API for status lookup.
/// Both endpoints authenticate with the server key as basic-auth username.
pub struct MidtransGateway {
    client: reqwest::Client,
    snap_url: String,
    api_url: String,
    server_key: String,
}

impl MidtransGateway {
    pub fn new(config: &MidtransConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            snap_url: config.snap_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            server_key: config.server_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_transaction(
        &self,
        order_id: &str,
        amount: i64,
        customer: &CustomerDetails,
    ) -> Result<SnapToken, GatewayError> {
        let url = format!("{}/snap/v1/transactions", self.snap_url);
        let body = json!({
            "transaction_details": {
                "order_id": order_id,
                "gross_amount": amount,
            },
            "credit_card": {
                "secure": true,
            },
            "customer_details": {
                "first_name": customer.first_name,
                "email": customer.email,
            },
        });

        debug!(order_id, amount, "Requesting Snap transaction token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(order_id, status = status.as_u16(), %message, "Snap token request rejected");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<SnapToken>().await?)
    }

    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatus, GatewayError> {
        let url = format!("{}/v2/{}/status", self.api_url, order_id);

        debug!(order_id, "Querying transaction status");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.server_key, Some(""))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(order_id, status = status.as_u16(), %message, "Status lookup rejected");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<TransactionStatus>().await?)
    }
}
