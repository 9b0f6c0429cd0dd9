use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vinex API",
        version = "1.0.0",
        description = "Registration document enhancement and structured field extraction.",
    ),
    paths(
        handlers::health::health_check,
        handlers::documents::extract_document,
        handlers::translations::translate,
        handlers::consignees::generate_consignee,
        handlers::recovery::recover_response,
        handlers::recovery::list_schemas,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Documents
        dto::documents::ExtractDocumentResponse,
        crate::models::VinFields,
        // Translations
        dto::translations::TranslateRequest,
        dto::translations::TranslateResponse,
        // Consignees
        dto::consignees::GenerateConsigneeRequest,
        dto::consignees::GenerateConsigneeResponse,
        crate::models::Country,
        crate::models::ConsigneeRecord,
        // Recovery
        dto::recovery::RecoverRequest,
        dto::recovery::RecoverResponse,
        dto::recovery::ListSchemasResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::ModelStatus,
        handlers::health::LlmStatus,
        handlers::health::StorageStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "documents", description = "Document enhancement and field extraction"),
        (name = "translations", description = "Listing text translation"),
        (name = "consignees", description = "Synthetic consignee records"),
        (name = "recovery", description = "Replaying raw generator replies through recovery"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
