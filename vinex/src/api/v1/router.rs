use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .route(
            "/documents:extract",
            post(handlers::documents::extract_document)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/translations", post(handlers::translations::translate))
        .route(
            "/consignees:generate",
            post(handlers::consignees::generate_consignee),
        )
        .route(
            "/responses:recover",
            post(handlers::recovery::recover_response),
        )
        .route("/schemas", get(handlers::recovery::list_schemas))
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
