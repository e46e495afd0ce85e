use tracing::{info, warn};

use super::{GatewayError, PaymentGateway};
use crate::db::{DbError, OrderStatus, PaidTransition, Repository, User, UserStatus};

#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("Order not found")]
    OrderNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("You are already premium")]
    AlreadyPremium,
    #[error("Order already paid")]
    AlreadyPaid,
    #[error("Upgrade failed, please call our customer support")]
    Denied,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Db(DbError),
}

/// Confirms a provider-side payment and applies the premium upgrade.
///
/// Checks run in a fixed order: the order must exist, the caller must not
/// already be premium, and an already-paid order short-circuits before any
/// provider call. Only a captured transaction mutates state, and then both
/// rows (order paid, user premium) change in one database transaction. The
/// paid transition is a conditional update, so a concurrent duplicate that
/// loses the race surfaces as `AlreadyPaid` rather than a double apply.
pub async fn reconcile_upgrade(
    db: &dyn Repository,
    gateway: &dyn PaymentGateway,
    user: &User,
    order_id: &str,
) -> Result<(), UpgradeError> {
    let order = db.get_order(order_id).await.map_err(|e| match e {
        DbError::NotFound(_) => UpgradeError::OrderNotFound,
        _ => UpgradeError::Db(e),
    })?;

    if user.status == UserStatus::Premium {
        return Err(UpgradeError::AlreadyPremium);
    }

    if order.status == OrderStatus::Paid {
        return Err(UpgradeError::AlreadyPaid);
    }

    let status = gateway.transaction_status(order_id).await?;

    if !status.is_captured() {
        warn!(
            order_id,
            transaction_status = %status.transaction_status,
            status_code = %status.status_code,
            "Provider did not confirm capture"
        );
        return Err(UpgradeError::Denied);
    }

    let transition = db
        .settle_order_and_upgrade_user(order_id, user.id)
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => UpgradeError::UserNotFound,
            _ => UpgradeError::Db(e),
        })?;

    match transition {
        PaidTransition::Applied => {
            info!(order_id, user_id = user.id, "Order settled, user upgraded to premium");
            Ok(())
        }
        PaidTransition::AlreadyPaid => Err(UpgradeError::AlreadyPaid),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::{NewUser, Order, OrderRepo, SqliteRepository, UserRepo};
    use crate::payment::{CustomerDetails, SnapToken, TransactionStatus};

    struct MockGateway {
        status: Mutex<TransactionStatus>,
        calls: AtomicUsize,
    }

    impl MockGateway {
        fn reporting(transaction_status: &str, status_code: &str) -> Self {
            Self {
                status: Mutex::new(TransactionStatus {
                    transaction_status: transaction_status.to_string(),
                    status_code: status_code.to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_transaction(
            &self,
            _order_id: &str,
            _amount: i64,
            _customer: &CustomerDetails,
        ) -> Result<SnapToken, GatewayError> {
            Ok(SnapToken {
                token: "snap-token".to_string(),
            })
        }

        async fn transaction_status(
            &self,
            _order_id: &str,
        ) -> Result<TransactionStatus, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status.lock().unwrap().clone())
        }
    }

    async fn test_repo(name: &str) -> SqliteRepository {
        let uri = format!("sqlite:file:{}?mode=memory&cache=shared", name);
        SqliteRepository::new(&uri).await.unwrap()
    }

    async fn seed_user(repo: &SqliteRepository, email: &str) -> User {
        repo.create_user(&NewUser {
            email: email.to_string(),
            username: "tester".to_string(),
            password: "hash".to_string(),
            photo: None,
        })
        .await
        .unwrap()
    }

    async fn seed_pending_order(repo: &SqliteRepository, order_id: &str, user_id: i64) {
        repo.create_order(&Order {
            order_id: order_id.to_string(),
            user_id,
            amount: 50000,
            status: OrderStatus::Pending,
            paid_date: None,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let repo = test_repo("up_unknown_order").await;
        let user = seed_user(&repo, "a@moflix.io").await;
        let gateway = MockGateway::reporting("capture", "200");

        let err = reconcile_upgrade(&repo, &gateway, &user, "ORDER-0-0")
            .await
            .unwrap_err();
        assert!(matches!(err, UpgradeError::OrderNotFound));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn premium_caller_is_rejected_regardless_of_order() {
        let repo = test_repo("up_already_premium").await;
        let user = seed_user(&repo, "b@moflix.io").await;
        seed_pending_order(&repo, "ORDER-X", user.id).await;
        let gateway = MockGateway::reporting("capture", "200");

        let mut premium = user.clone();
        premium.status = UserStatus::Premium;

        let err = reconcile_upgrade(&repo, &gateway, &premium, "ORDER-X")
            .await
            .unwrap_err();
        assert!(matches!(err, UpgradeError::AlreadyPremium));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn paid_order_short_circuits_without_provider_call() {
        let repo = test_repo("up_paid_short_circuit").await;
        let user = seed_user(&repo, "c@moflix.io").await;
        seed_pending_order(&repo, "ORDER-Y", user.id).await;
        repo.settle_order_and_upgrade_user("ORDER-Y", user.id)
            .await
            .unwrap();
        let gateway = MockGateway::reporting("capture", "200");

        // Re-read: the settle above flipped the user to premium, use a basic
        // caller so the paid-order guard is the one that fires.
        let mut basic = repo.get_user_by_id(user.id).await.unwrap();
        basic.status = UserStatus::Basic;

        let err = reconcile_upgrade(&repo, &gateway, &basic, "ORDER-Y")
            .await
            .unwrap_err();
        assert!(matches!(err, UpgradeError::AlreadyPaid));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn captured_transaction_upgrades_user_and_settles_order() {
        let repo = test_repo("up_capture_success").await;
        // Register seven users so the caller holds id 7, matching the
        // order id it is paired with.
        let mut user = seed_user(&repo, "d0@moflix.io").await;
        for i in 1..7 {
            user = seed_user(&repo, &format!("d{}@moflix.io", i)).await;
        }
        assert_eq!(user.id, 7);
        seed_pending_order(&repo, "ORDER-7-1000", user.id).await;
        let gateway = MockGateway::reporting("capture", "200");

        reconcile_upgrade(&repo, &gateway, &user, "ORDER-7-1000")
            .await
            .unwrap();
        assert_eq!(gateway.call_count(), 1);

        let user = repo.get_user_by_id(user.id).await.unwrap();
        assert_eq!(user.status, UserStatus::Premium);

        let order = repo.get_order("ORDER-7-1000").await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.paid_date.is_some());
    }

    #[tokio::test]
    async fn denied_transaction_leaves_state_unchanged() {
        let repo = test_repo("up_denied").await;
        let user = seed_user(&repo, "e@moflix.io").await;
        seed_pending_order(&repo, "ORDER-D", user.id).await;
        let gateway = MockGateway::reporting("deny", "202");

        let err = reconcile_upgrade(&repo, &gateway, &user, "ORDER-D")
            .await
            .unwrap_err();
        assert!(matches!(err, UpgradeError::Denied));

        let user = repo.get_user_by_id(user.id).await.unwrap();
        assert_eq!(user.status, UserStatus::Basic);

        let order = repo.get_order("ORDER-D").await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.paid_date.is_none());
    }

    #[tokio::test]
    async fn pending_provider_status_is_not_a_capture() {
        let repo = test_repo("up_provider_pending").await;
        let user = seed_user(&repo, "f@moflix.io").await;
        seed_pending_order(&repo, "ORDER-P", user.id).await;
        let gateway = MockGateway::reporting("pending", "201");

        let err = reconcile_upgrade(&repo, &gateway, &user, "ORDER-P")
            .await
            .unwrap_err();
        assert!(matches!(err, UpgradeError::Denied));
    }

    #[tokio::test]
    async fn second_call_after_success_reports_already_paid() {
        let repo = test_repo("up_idempotent").await;
        let user = seed_user(&repo, "g@moflix.io").await;
        seed_pending_order(&repo, "ORDER-I", user.id).await;
        let gateway = MockGateway::reporting("capture", "200");

        reconcile_upgrade(&repo, &gateway, &user, "ORDER-I")
            .await
            .unwrap();
        let order_after_first = repo.get_order("ORDER-I").await.unwrap();

        // The original caller snapshot is stale (still basic), so the second
        // call reaches the paid-order guard rather than the premium guard.
        let err = reconcile_upgrade(&repo, &gateway, &user, "ORDER-I")
            .await
            .unwrap_err();
        assert!(matches!(err, UpgradeError::AlreadyPaid));
        assert_eq!(gateway.call_count(), 1);

        let order_after_second = repo.get_order("ORDER-I").await.unwrap();
        assert_eq!(order_after_second.status, order_after_first.status);
        assert_eq!(order_after_second.paid_date, order_after_first.paid_date);
    }

    #[tokio::test]
    async fn lost_race_on_paid_transition_reports_already_paid() {
        let repo = test_repo("up_lost_race").await;
        let user = seed_user(&repo, "h@moflix.io").await;
        seed_pending_order(&repo, "ORDER-R", user.id).await;
        let gateway = MockGateway::reporting("capture", "200");

        // Simulate the duplicate that won the race between our pending read
        // and our conditional write.
        repo.settle_order_and_upgrade_user("ORDER-R", user.id)
            .await
            .unwrap();

        let mut stale = user.clone();
        stale.status = UserStatus::Basic;

        // Depending on timing the guard or the conditional update catches it;
        // either way the outcome is AlreadyPaid and no double apply.
        match reconcile_upgrade(&repo, &gateway, &stale, "ORDER-R").await {
            Err(UpgradeError::AlreadyPaid) => {}
            other => panic!("expected AlreadyPaid, got {:?}", other),
        }
    }
}
