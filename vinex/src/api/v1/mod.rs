pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tower::ServiceExt;

    use super::test_support::{test_state, ScriptedGenerator};
    use crate::api::routes::create_router;
    use crate::enhance::preprocessing;
    use crate::llm::Generator;

    const KEY: &str = "test-key";
    const BOUNDARY: &str = "vinex-test-boundary";

    fn app(generator: Arc<dyn Generator>) -> axum::Router {
        create_router(test_state(vec![KEY.to_string()], generator))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {KEY}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn test_png() -> Vec<u8> {
        let image = GrayImage::from_fn(48, 32, |x, y| Luma([(40 + x * 3 + y * 2) as u8]));
        preprocessing::encode_png(&image).unwrap()
    }

    fn upload(file: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"card.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/documents:extract")
            .header("Authorization", format!("Bearer {KEY}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn protected_route_requires_auth() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/translations")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"source":"ru","text":"x","targets":["en"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn health_is_public_and_reports_components() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json.get("error").is_none());
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["model"]["backend"], "native");
        assert_eq!(json["data"]["model"]["output"], "residual");
        assert_eq!(json["data"]["llm"]["status"], "unavailable");
        assert_eq!(json["data"]["storage"]["backend"], "inline");
    }

    #[tokio::test]
    async fn openapi_json_is_public_and_valid() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let version = json["openapi"]
            .as_str()
            .expect("openapi field should be a string");
        assert!(version.starts_with('3'), "got: {version}");
        assert!(json["paths"].get("/api/v1/documents:extract").is_some());
    }

    #[tokio::test]
    async fn extract_returns_recovered_fields() {
        let generator = ScriptedGenerator::replying(
            "Sure!\n```json\n{\"vin\": \"KMHD84LF5JU123456\", \"manufacturer\": \"Hyundai\"}\n```",
        );
        let response = app(generator).oneshot(upload(&test_png())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = &json["data"];
        assert_eq!(data["filename"], "card.png");
        assert_eq!(data["fields"]["vin"], "KMHD84LF5JU123456");
        assert_eq!(data["fields"]["manufacturer"], "Hyundai");
        assert_eq!(data["fields"]["weight"], serde_json::Value::Null);
        assert!(data["imageUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert!(data["rawResponse"].as_str().unwrap().contains("```json"));
    }

    #[tokio::test]
    async fn extract_unrecoverable_reply_is_upstream_error_with_raw_text() {
        let generator = ScriptedGenerator::replying("The image is too blurry to read.");
        let response = app(generator).oneshot(upload(&test_png())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "upstream_error");
        assert_eq!(json["error"]["details"]["kind"], "no_json_found");
        assert_eq!(
            json["error"]["details"]["rawResponse"],
            "The image is too blurry to read."
        );
    }

    #[tokio::test]
    async fn extract_without_generator_is_not_implemented() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(upload(&test_png()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn extract_rejects_non_image() {
        let generator = ScriptedGenerator::replying("{}");
        let response = app(generator)
            .oneshot(upload(b"definitely not an image"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn translation_with_only_source_target_echoes_text() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(post_json(
                "/api/v1/translations",
                json!({"source": "ru", "text": "Киа Соренто", "targets": ["ru"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["translations"], json!({"ru": "Киа Соренто"}));
    }

    #[tokio::test]
    async fn translation_repairs_missing_targets() {
        let generator = ScriptedGenerator::replying("{\"en\": \"Kia Sorento\"}");
        let response = app(generator)
            .oneshot(post_json(
                "/api/v1/translations",
                json!({"source": "ru", "text": "Киа Соренто", "targets": ["en", "uz"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["data"]["translations"],
            json!({"en": "Kia Sorento", "uz": ""})
        );
    }

    #[tokio::test]
    async fn translation_rejects_unknown_language() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(post_json(
                "/api/v1/translations",
                json!({"source": "de", "text": "Auto", "targets": ["en"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_json_field_is_invalid_request() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(post_json("/api/v1/responses:recover", json!({"schema": "vin_fields"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Missing required field: text");
    }

    #[tokio::test]
    async fn consignee_generation_uses_country_formats() {
        let generator = ScriptedGenerator::replying(
            "{\"consignee_name\": \"Dilshod Karimov\", \"consignee_address\": \"Amir Temur 5, Tashkent\"}",
        );
        let response = app(generator)
            .oneshot(post_json(
                "/api/v1/consignees:generate",
                json!({"country": "Uzbekistan"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["country"], "Uzbekistan");
        assert_eq!(json["data"]["data"]["consignee_name"], "Dilshod Karimov");
        assert_eq!(
            json["data"]["data"]["consignee_iin"].as_str().unwrap().len(),
            14
        );
        assert!(json["data"]["data"]["consignee_tel"]
            .as_str()
            .unwrap()
            .starts_with("+998"));
    }

    #[tokio::test]
    async fn consignee_rejects_unknown_country() {
        let response = app(ScriptedGenerator::replying("{}"))
            .oneshot(post_json(
                "/api/v1/consignees:generate",
                json!({"country": "Mongolia"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Country must be one of"));
    }

    #[tokio::test]
    async fn recover_replays_stored_reply() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(post_json(
                "/api/v1/responses:recover",
                json!({
                    "schema": "vehicle_listing",
                    "text": "{\"text\": {\"title\": {\"en\": \"Sorento\"}}, \"specs\": {\"year\": 2019}}"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let record = &json["data"]["record"];
        assert_eq!(record["text"]["title"]["en"], "Sorento");
        assert_eq!(record["text"]["title"]["ko"], "");
        assert_eq!(record["specs"]["year"], 2019);
        assert_eq!(record["options"], json!([]));
    }

    #[tokio::test]
    async fn recover_unknown_schema_is_not_found() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(post_json(
                "/api/v1/responses:recover",
                json!({"schema": "invoice", "text": "{}"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn schemas_lists_builtins() {
        let response = app(ScriptedGenerator::unavailable())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/schemas")
                    .header("Authorization", format!("Bearer {KEY}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let names: Vec<&str> = json["data"]["schemas"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(names.contains(&"vin_fields"));
        assert!(names.contains(&"translation"));
    }
}
