use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::ai::AiClient;
use crate::api;
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::payment::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub ai: Arc<AiClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<SqliteRepository>,
        gateway: Arc<dyn PaymentGateway>,
        ai: Arc<AiClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            gateway,
            ai,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/login/google", post(api::auth::google_login));

    let authed_routes = Router::new()
        .route("/movies", get(api::movies::list_movies))
        .route("/movies/:id", get(api::movies::get_movie))
        .route("/genres", get(api::movies::list_genres))
        .route(
            "/watchlist",
            get(api::watchlist::get_watchlist).post(api::watchlist::add_to_watchlist),
        )
        .route(
            "/watchlist/:movie_id",
            delete(api::watchlist::remove_from_watchlist),
        )
        .route(
            "/users/me",
            get(api::users::get_profile).put(api::users::update_profile),
        )
        .route("/users/me/upgrade", patch(api::payment::upgrade_user))
        .route(
            "/payment/midtrans/initiate",
            get(api::payment::initiate_payment),
        )
        .route("/recommendations", get(api::recommend::get_recommendations))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(public_routes)
        .merge(authed_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    // CORS preflights to unknown paths still need a 200; headers come from
    // the CorsLayer.
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
