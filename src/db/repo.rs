use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn get_user_by_id(&self, id: i64) -> DbResult<User>;
    async fn create_user(&self, user: &NewUser) -> DbResult<User>;
    async fn update_user_profile(
        &self,
        id: i64,
        username: Option<&str>,
        photo: Option<&str>,
    ) -> DbResult<User>;
}

#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn list_movies(&self) -> DbResult<Vec<Movie>>;
    async fn get_movie(&self, id: i64) -> DbResult<Movie>;
    async fn upsert_movie(&self, movie: &Movie) -> DbResult<()>;
    async fn search_movies_by_title(&self, keywords: &[String], limit: i64) -> DbResult<Vec<Movie>>;
    async fn search_movies_by_genre(&self, genres: &[String], limit: i64) -> DbResult<Vec<Movie>>;
    async fn top_movies_by_popularity(&self, limit: i64) -> DbResult<Vec<Movie>>;
}

#[async_trait]
pub trait WatchlistRepo: Send + Sync {
    async fn get_watchlist_movies(&self, user_id: i64) -> DbResult<Vec<Movie>>;
    async fn add_to_watchlist(&self, user_id: i64, movie_id: i64) -> DbResult<()>;
    async fn remove_from_watchlist(&self, user_id: i64, movie_id: i64) -> DbResult<()>;
}

#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn get_order(&self, order_id: &str) -> DbResult<Order>;
    async fn create_order(&self, order: &Order) -> DbResult<()>;
    /// Settles an order and upgrades its payer in one transaction.
    ///
    /// The order write is conditional on `status = 'pending'`; a zero
    /// affected-row count reports `AlreadyPaid` instead of re-applying the
    /// transition, so concurrent duplicate calls settle exactly once.
    async fn settle_order_and_upgrade_user(
        &self,
        order_id: &str,
        user_id: i64,
    ) -> DbResult<PaidTransition>;
}

pub trait Repository: UserRepo + MovieRepo + WatchlistRepo + OrderRepo + Send + Sync {
    fn close(&self);
}
