pub mod auth;
pub mod error;
pub mod movies;
pub mod payment;
pub mod recommend;
pub mod types;
pub mod users;
pub mod watchlist;

pub use auth::*;
pub use error::*;
pub use types::*;
