use axum::{extract::State, Extension, Json};
use tracing::info;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::db::{Order, OrderRepo, OrderStatus};
use crate::payment::{self, CustomerDetails, PREMIUM_AMOUNT};
use crate::server::AppState;

/// Issues a Snap payment token and records the pending order. The order row
/// is written only after the provider handed out a token.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<InitiatePaymentResponse>> {
    let user = user.0;
    let order_id = payment::new_order_id(user.id);

    info!(%order_id, user_id = user.id, "Initiating premium payment");

    let snap = state
        .gateway
        .create_transaction(
            &order_id,
            PREMIUM_AMOUNT,
            &CustomerDetails {
                first_name: user.username.clone(),
                email: user.email.clone(),
            },
        )
        .await?;

    state
        .db
        .create_order(&Order {
            order_id: order_id.clone(),
            user_id: user.id,
            amount: PREMIUM_AMOUNT,
            status: OrderStatus::Pending,
            paid_date: None,
        })
        .await?;

    Ok(Json(InitiatePaymentResponse {
        transaction_token: snap.token,
        order_id,
        message: "Order Created Successfully".to_string(),
    }))
}

/// PATCH /users/me/upgrade: verify the payment with the provider and flip
/// user and order state together.
pub async fn upgrade_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpgradeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let order_id = req
        .order_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Order id is required".to_string()))?;

    payment::reconcile_upgrade(
        state.db.as_ref(),
        state.gateway.as_ref(),
        &user.0,
        &order_id,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: "Upgraded premium successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{extract::State, Extension};

    use super::*;
    use crate::ai::AiClient;
    use crate::config::Config;
    use crate::db::{DbError, NewUser, SqliteRepository, UserRepo};
    use crate::payment::{GatewayError, PaymentGateway, SnapToken, TransactionStatus};
    use crate::server::AppState;

    /// Refuses every token request, remembering the order id it was asked
    /// to create.
    struct RejectingGateway {
        seen_order_id: Mutex<Option<String>>,
    }

    #[async_trait]
    impl PaymentGateway for RejectingGateway {
        async fn create_transaction(
            &self,
            order_id: &str,
            _amount: i64,
            _customer: &CustomerDetails,
        ) -> Result<SnapToken, GatewayError> {
            *self.seen_order_id.lock().unwrap() = Some(order_id.to_string());
            Err(GatewayError::Rejected {
                status: 401,
                message: "invalid server key".to_string(),
            })
        }

        async fn transaction_status(
            &self,
            _order_id: &str,
        ) -> Result<TransactionStatus, GatewayError> {
            unreachable!("status lookup is not part of initiation")
        }
    }

    #[tokio::test]
    async fn no_order_row_when_token_issuance_fails() {
        let repo = Arc::new(
            SqliteRepository::new("sqlite:file:pay_token_fail?mode=memory&cache=shared")
                .await
                .unwrap(),
        );
        let user = repo
            .create_user(&NewUser {
                email: "pay@moflix.io".to_string(),
                username: "tester".to_string(),
                password: "hash".to_string(),
                photo: None,
            })
            .await
            .unwrap();

        let gateway = Arc::new(RejectingGateway {
            seen_order_id: Mutex::new(None),
        });
        let config: Config = serde_yaml::from_str("{}").unwrap();
        let ai = Arc::new(AiClient::new(&config.ai).unwrap());
        let state = AppState::new(config, repo.clone(), gateway.clone(), ai);

        let result = initiate_payment(State(state), Extension(CurrentUser(user))).await;
        assert!(matches!(result, Err(ApiError::Internal)));

        // The provider saw the order id, but no row was persisted for it.
        let order_id = gateway.seen_order_id.lock().unwrap().clone().unwrap();
        let err = repo.get_order(&order_id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
