//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST API under `/api/v1/...` (generation + read-only catalog views)
/// - `/` service banner and `/health` for liveness checks
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(http::http_root))
        .route("/health", get(http::http_health))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/generate", post(http::http_post_generate))
        .route("/api/v1/exam-types", get(http::http_get_exam_types))
        .route("/api/v1/exam-types/:exam_type", get(http::http_get_exam_type))
        .route("/api/v1/templates", get(http::http_get_templates))
        .route("/api/v1/providers", get(http::http_get_providers))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;
    use crate::llm::LlmError;
    use crate::logic::testing::{state_with, FakeGateway, Script};

    async fn call(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn router_with(script: Script) -> (Router, Arc<FakeGateway>) {
        let fake = FakeGateway::new(script);
        (build_router(Arc::new(state_with(fake.clone()))), fake)
    }

    #[tokio::test]
    async fn generate_success_envelope() {
        let (router, fake) = router_with(Script::Reply("A short passage about office work."));
        let (status, v) = call(
            router,
            Method::POST,
            "/api/v1/generate",
            Some(json!({"exam_type": "TOEIC", "topic": "Office Work", "difficulty_score": "Beginner"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert!(v["message"].as_str().unwrap().contains("TOEIC"));
        let data = &v["data"];
        assert_eq!(data["article"], "A short passage about office work.");
        assert_eq!(data["target_word_count"], 150);
        assert_eq!(data["paragraph_count"], 3);
        assert_eq!(data["actual_word_count"], 6);
        assert_eq!(data["usage"]["prompt_tokens"], 120);
        assert_eq!(data["usage"]["total_tokens"], 150);
        assert!(data["generated_at"].is_string());
        assert!(data["generation_time_seconds"].is_number());
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn gre_numeric_difficulty_over_http() {
        let (router, fake) = router_with(Script::Reply("Philosophical text."));
        let (status, v) = call(
            router,
            Method::POST,
            "/api/v1/generate",
            Some(json!({"exam_type": "gre", "topic": "Philosophy", "difficulty_score": 160,
                        "word_count": 300, "paragraph_count": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{v}");
        assert_eq!(v["data"]["exam_type"], "GRE");
        assert_eq!(v["data"]["difficulty_score"], "160");
        let system = fake.last_system.lock().unwrap().clone().unwrap();
        assert!(system.contains("GRE reading comprehension"));
        assert!(!system.contains("TOEIC Part VII"));
    }

    #[tokio::test]
    async fn invalid_exam_type_is_400_and_skips_gateway() {
        let (router, fake) = router_with(Script::Reply("unused"));
        let (status, v) = call(
            router,
            Method::POST,
            "/api/v1/generate",
            Some(json!({"exam_type": "INVALID_EXAM", "topic": "Office Work", "difficulty_score": "Beginner"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "INVALID_EXAM_TYPE");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn oversized_word_count_reports_bound() {
        let (router, fake) = router_with(Script::Reply("unused"));
        let (status, v) = call(
            router,
            Method::POST,
            "/api/v1/generate",
            Some(json!({"exam_type": "TOEIC", "topic": "Office Work", "difficulty_score": "Beginner", "word_count": 2000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"]["code"], "INVALID_WORD_COUNT");
        assert_eq!(v["error"]["details"]["max_count"], 500);
        assert_eq!(v["error"]["details"]["violated_bound"], "word_count_max");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_failures_map_to_gateway_statuses() {
        let (router, _) = router_with(Script::Fail(|| LlmError::Timeout { timeout_secs: 30 }));
        let body = json!({"exam_type": "TOEIC", "topic": "Travel", "difficulty_score": "Advanced"});
        let (status, v) = call(router, Method::POST, "/api/v1/generate", Some(body.clone())).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(v["error"]["code"], "GENERATION_TIMEOUT");
        assert_eq!(v["error"]["details"]["timeout_seconds"], 30);

        let (router, _) = router_with(Script::Fail(|| LlmError::Transport("connection refused".into())));
        let (status, v) = call(router, Method::POST, "/api/v1/generate", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(v["error"]["code"], "PROVIDER_ERROR");
    }

    #[tokio::test]
    async fn too_many_focus_points_are_rejected() {
        let (router, fake) = router_with(Script::Reply("unused"));
        let points: Vec<String> = (1..=12).map(|i| format!("point {i}")).collect();
        let (status, v) = call(
            router,
            Method::POST,
            "/api/v1/generate",
            Some(json!({"exam_type": "TOEIC", "topic": "Travel", "difficulty_score": "Beginner", "focus_points": points})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"]["code"], "INVALID_FOCUS_POINTS");
        assert_eq!(v["error"]["details"]["max_count"], 10);
        assert_eq!(v["error"]["details"]["focus_points_count"], 12);
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn integral_float_difficulty_matches_label() {
        let (router, _) = router_with(Script::Reply("text"));
        let (status, v) = call(
            router,
            Method::POST,
            "/api/v1/generate",
            Some(json!({"exam_type": "GRE", "topic": "Philosophy", "difficulty_score": 160.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{v}");
        assert_eq!(v["data"]["difficulty_score"], "160");
    }

    #[tokio::test]
    async fn malformed_body_uses_error_envelope() {
        let (router, fake) = router_with(Script::Reply("unused"));
        let (status, v) = call(router, Method::POST, "/api/v1/generate", Some(json!({"exam_type": "TOEIC"}))).await;
        assert!(status.is_client_error());
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "INVALID_REQUEST");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn exam_type_listing_and_detail() {
        let (router, _) = router_with(Script::Reply("unused"));
        let (status, v) = call(router.clone(), Method::GET, "/api/v1/exam-types", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["exam_types"], json!(["TOEIC", "GRE", "IELTS", "SAT"]));

        let (status, v) = call(router.clone(), Method::GET, "/api/v1/exam-types/gre", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["exam_type"], "GRE");
        assert_eq!(v["full_name"], "Graduate Record Examinations");
        assert_eq!(v["validation_rules"]["word_count_min"], 250);
        assert!(v["common_topics"].as_array().unwrap().contains(&json!("Philosophy")));

        let (status, v) = call(router, Method::GET, "/api/v1/exam-types/INVALID", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"]["code"], "INVALID_EXAM_TYPE");
    }

    #[tokio::test]
    async fn templates_providers_and_health() {
        let (router, _) = router_with(Script::Reply("unused"));
        let (_, v) = call(router.clone(), Method::GET, "/api/v1/templates", None).await;
        for code in ["TOEIC", "GRE", "IELTS", "SAT"] {
            assert_eq!(v["available_templates"][code]["has_template"], true);
            assert!(!v["available_templates"][code]["topics"].as_array().unwrap().is_empty());
        }

        let (_, v) = call(router.clone(), Method::GET, "/api/v1/providers", None).await;
        assert_eq!(v["default_provider"], "openai");
        assert_eq!(v["available_providers"], json!(["openai", "gemini"]));
        assert_eq!(v["provider_info"]["gemini"]["model"], "gemini-2.5-flash");

        let (status, v) = call(router.clone(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["status"], "healthy");
        assert_eq!(v["app_name"], "ArticleGenerator");

        let (status, v) = call(router, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["message"], "Welcome to ArticleGenerator");
        assert_eq!(v["status"], "running");
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
    }
}
