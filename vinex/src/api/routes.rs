use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::v1;
use super::AppState;
use crate::config::StorageBackend;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = v1::router::v1_router(state.clone());
    let mut router = Router::new().nest("/api/v1", v1);

    // Local objects are fetched back by the generator through `/files`.
    if state.config.storage.backend == StorageBackend::Local {
        router = router.nest_service("/files", ServeDir::new(&state.config.storage.local_dir));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
