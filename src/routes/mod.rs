use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, CONFIG};
use crate::database::StoreClient;
use crate::middleware::panic_response;

pub mod post;
pub mod user;

/// Full application router over `client`
pub fn app(client: Arc<dyn StoreClient>) -> Router {
    router(client, &CONFIG)
}

pub fn router(client: Arc<dyn StoreClient>, config: &AppConfig) -> Router {
    let health_client = client.clone();

    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route(
            "/health",
            get(move || {
                let client = health_client.clone();
                async move { health(client.as_ref()).await }
            }),
        )
        // Resources
        .merge(user::routes(client.as_ref()))
        .merge(post::routes(client.as_ref()))
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(panic_response));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "crud-rest-api",
        "version": version,
        "description": "REST CRUD API for users and posts",
        "endpoints": {
            "health": "GET /health",
            "user": "GET|POST /api/user, POST /api/user/find, GET|PATCH|DELETE /api/user/:id",
            "post": "GET|POST /api/post, POST /api/post/find, GET|PATCH|DELETE /api/post/:id",
        }
    }))
}

async fn health(client: &dyn StoreClient) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match client.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_json, send, MemoryClient};
    use serde_json::json;

    fn test_app(client: MemoryClient) -> (Router, Arc<MemoryClient>) {
        let client = Arc::new(client);
        (app(client.clone()), client)
    }

    #[tokio::test]
    async fn root_describes_the_service() {
        let (app, _) = test_app(MemoryClient::new());
        let res = send(app, "GET", "/", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["name"], "crud-rest-api");
    }

    #[tokio::test]
    async fn health_reflects_the_store() {
        let (app, _) = test_app(MemoryClient::new());
        let res = send(app, "GET", "/health", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["database"], "ok");

        let (app, _) = test_app(MemoryClient { healthy: false, ..MemoryClient::new() });
        let res = send(app, "GET", "/health", None).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn user_lifecycle_over_the_full_router() {
        let (app, client) = test_app(MemoryClient::new());

        let res = send(app.clone(), "POST", "/api/user", Some(r#"{"email":"ada@example.com"}"#)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let user = body_json(res).await;
        let id = user["id"].as_str().unwrap().to_string();
        assert_eq!(user["name"], Value::Null);

        let res = send(app.clone(), "GET", &format!("/api/user/{}", id), None).await;
        assert_eq!(body_json(res).await["email"], "ada@example.com");

        let res = send(app.clone(), "PATCH", &format!("/api/user/{}", id), Some(r#"{"name":"Ada"}"#)).await;
        assert_eq!(body_json(res).await["name"], "Ada");

        let res = send(app.clone(), "GET", "/api/user", None).await;
        assert_eq!(body_json(res).await["data"].as_array().unwrap().len(), 1);

        let res = send(app.clone(), "DELETE", &format!("/api/user/{}", id), None).await;
        assert_eq!(body_json(res).await, json!({ "success": true }));
        assert_eq!(client.users.len(), 0);
    }

    #[tokio::test]
    async fn oversized_page_numbers_still_list() {
        let (app, _) = test_app(MemoryClient::new());

        // where={"page":1e30}
        let res = send(app.clone(), "GET", "/api/post?where=%7B%22page%22%3A1e30%7D", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["pagination"]["page"], 1);

        // where={"page":1000000000000000000}
        let res = send(app, "GET", "/api/post?where=%7B%22page%22%3A1000000000000000000%7D", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["pagination"]["skip"], i64::MAX);
    }

    #[tokio::test]
    async fn post_routes_are_mounted() {
        let (app, client) = test_app(MemoryClient::new());
        let author = client.users.seed(json!({ "email": "a@example.com", "name": null }));
        let body = json!({ "title": "Hi", "content": "There", "authorId": author["id"] });

        let res = send(app.clone(), "POST", "/api/post", Some(&body.to_string())).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = send(app, "POST", "/api/post/find", Some(r#"{"where":{"title":"Hi"}}"#)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"][0]["title"], "Hi");
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let mut config = AppConfig::from_env();
        config.api.max_request_size_bytes = 16;
        let app = router(Arc::new(MemoryClient::new()), &config);

        let res = send(app, "POST", "/api/user", Some(r#"{"email":"someone@example.com"}"#)).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
