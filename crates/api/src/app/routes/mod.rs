use axum::Router;

pub mod items;
pub mod system;

/// Router for all inventory endpoints.
pub fn router() -> Router {
    Router::new().merge(items::router())
}
