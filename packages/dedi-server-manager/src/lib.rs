use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::sessions::routes())
        .merge(routes::servers::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
