use std::fmt::Write;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, username, password, photo, status, created FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", email)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn get_user_by_id(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, username, password, photo, status, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", id)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn create_user(&self, user: &NewUser) -> DbResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, username, password, photo, status, created)
             VALUES (?, ?, ?, COALESCE(?, 'https://ui-avatars.com/api/?name=user&background=random'), 'basic', ?)",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.photo)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyExists(format!("Email already registered: {}", user.email))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        self.get_user_by_id(result.last_insert_rowid()).await
    }

    async fn update_user_profile(
        &self,
        id: i64,
        username: Option<&str>,
        photo: Option<&str>,
    ) -> DbResult<User> {
        let result = sqlx::query(
            "UPDATE users SET username = COALESCE(?, username), photo = COALESCE(?, photo) WHERE id = ?",
        )
        .bind(username)
        .bind(photo)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }

        self.get_user_by_id(id).await
    }
}

const MOVIE_COLUMNS: &str = "id, title, description, posterfilm, trailer, release_date, genres, \
     vote_average, popularity, language, vote_count";

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn list_movies(&self) -> DbResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies ORDER BY popularity DESC",
            MOVIE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn get_movie(&self, id: i64) -> DbResult<Movie> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {} FROM movies WHERE id = ?", MOVIE_COLUMNS))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound(format!("Movie not found: {}", id)),
                _ => DbError::Sqlx(e),
            })
    }

    async fn upsert_movie(&self, movie: &Movie) -> DbResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO movies
            (id, title, description, posterfilm, trailer, release_date, genres,
             vote_average, popularity, language, vote_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(&movie.posterfilm)
        .bind(&movie.trailer)
        .bind(&movie.release_date)
        .bind(&movie.genres)
        .bind(movie.vote_average)
        .bind(movie.popularity)
        .bind(&movie.language)
        .bind(movie.vote_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_movies_by_title(&self, keywords: &[String], limit: i64) -> DbResult<Vec<Movie>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("SELECT {} FROM movies WHERE ", MOVIE_COLUMNS);
        for i in 0..keywords.len() {
            if i > 0 {
                query.push_str(" OR ");
            }
            query.push_str("title LIKE ?");
        }
        let _ = write!(&mut query, " ORDER BY popularity DESC LIMIT {}", limit);

        let mut q = sqlx::query_as::<_, Movie>(&query);
        for keyword in keywords {
            q = q.bind(format!("%{}%", keyword));
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn search_movies_by_genre(&self, genres: &[String], limit: i64) -> DbResult<Vec<Movie>> {
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("SELECT {} FROM movies WHERE ", MOVIE_COLUMNS);
        for i in 0..genres.len() {
            if i > 0 {
                query.push_str(" OR ");
            }
            query.push_str("LOWER(genres) LIKE ?");
        }
        let _ = write!(&mut query, " ORDER BY popularity DESC LIMIT {}", limit);

        let mut q = sqlx::query_as::<_, Movie>(&query);
        for genre in genres {
            q = q.bind(format!("%{}%", genre.to_lowercase()));
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn top_movies_by_popularity(&self, limit: i64) -> DbResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies ORDER BY popularity DESC LIMIT ?",
            MOVIE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }
}

#[async_trait]
impl WatchlistRepo for SqliteRepository {
    async fn get_watchlist_movies(&self, user_id: i64) -> DbResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT m.{} FROM movies m
             JOIN watchlist w ON w.movie_id = m.id
             WHERE w.user_id = ?
             ORDER BY w.created DESC",
            MOVIE_COLUMNS.replace(", ", ", m.")
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn add_to_watchlist(&self, user_id: i64, movie_id: i64) -> DbResult<()> {
        sqlx::query("INSERT INTO watchlist (user_id, movie_id, created) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(movie_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::AlreadyExists(format!(
                        "Movie already in watchlist: {}/{}",
                        user_id, movie_id
                    ))
                } else {
                    DbError::Sqlx(e)
                }
            })?;
        Ok(())
    }

    async fn remove_from_watchlist(&self, user_id: i64, movie_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM watchlist WHERE user_id = ? AND movie_id = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "Movie not in watchlist: {}/{}",
                user_id, movie_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepo for SqliteRepository {
    async fn get_order(&self, order_id: &str) -> DbResult<Order> {
        let result = sqlx::query_as::<_, (String, i64, i64, OrderStatus, Option<String>)>(
            "SELECT order_id, user_id, amount, status, paid_date FROM orders WHERE order_id = ?",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Order not found: {}", order_id)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(Order {
            order_id: result.0,
            user_id: result.1,
            amount: result.2,
            status: result.3,
            paid_date: result.4.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
    }

    async fn create_order(&self, order: &Order) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO orders (order_id, user_id, amount, status, paid_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&order.order_id)
        .bind(order.user_id)
        .bind(order.amount)
        .bind(order.status)
        .bind(order.paid_date.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyExists(format!("Order already exists: {}", order.order_id))
            } else {
                DbError::Sqlx(e)
            }
        })?;
        Ok(())
    }

    async fn settle_order_and_upgrade_user(
        &self,
        order_id: &str,
        user_id: i64,
    ) -> DbResult<PaidTransition> {
        let mut tx = self.pool.begin().await?;

        // Act on the current user row, not whatever the auth context read earlier.
        let user = sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(DbError::NotFound(format!("User not found: {}", user_id)));
        }

        let result = sqlx::query(
            "UPDATE orders SET status = 'paid', paid_date = ? WHERE order_id = ? AND status = 'pending'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(PaidTransition::AlreadyPaid);
        }

        sqlx::query("UPDATE users SET status = 'premium' WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(PaidTransition::Applied)
    }
}

impl Repository for SqliteRepository {
    fn close(&self) {}
}
