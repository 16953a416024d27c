use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::app::ServiceContext;

use super::handlers;

pub fn create_router(ctx: Arc<ServiceContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/v1/contact-form/submit", post(handlers::submit))
        .route("/v1/spam/{token}/{action}", get(handlers::spam_action))
        .route("/v1/calendar/blocked-dates", get(handlers::blocked_dates))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
