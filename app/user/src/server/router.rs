use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::response::Json;
use axum::routing::{get, MethodRouter};
use axum::Router;
use http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info_span, Span};

use super::server::HttpServer;
use crate::biz::{UserInput, UserRepo};
use crate::service::user_service::health_check;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 用 uuid v4 作为请求 ID
#[derive(Clone, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = uuid::Uuid::new_v4().to_string();
        Some(RequestId::new(request_id.parse().ok()?))
    }
}

impl<R: UserRepo + 'static> HttpServer<R> {
    pub fn create_router(&self) -> Router {
        let prefix = self.cfg.route_prefix();
        let users = self.user_routes();
        let api = if prefix.is_empty() {
            users
        } else {
            Router::new().nest(&prefix, users)
        };

        let mut router = api
            .route("/health", get(health_check))
            // 应用中间件层, 后添加的在外层
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &axum::http::Request<_>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("");

                        info_span!(
                            "http_request",
                            "http.method" = %request.method(),
                            "http.route" = %request.uri().path(),
                            "request.id" = %request_id,
                        )
                    })
                    .on_response(
                        |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                            tracing::info!(
                                "http.response.status_code" = %response.status(),
                                duration_ms = %latency.as_millis(),
                                "HTTP request completed"
                            );
                        },
                    )
                    .on_failure(
                        |error: tower_http::classify::ServerErrorsFailureClass,
                         latency: Duration,
                         _span: &Span| {
                            tracing::error!(
                                error = %error,
                                duration_ms = %latency.as_millis(),
                                "HTTP request failed"
                            );
                        },
                    ),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId));

        if let Some(cors) = cors_layer(&self.cfg.cors_origins()) {
            router = router.layer(cors);
        }

        router
    }

    fn user_routes(&self) -> Router {
        let service = Arc::clone(&self.user_service);

        // POST /users/ 与 GET /users 两种写法都接受
        let collection: MethodRouter = get({
            let service = service.clone();
            move || async move { service.list_users().await }
        })
        .post({
            let service = service.clone();
            move |payload: Result<Json<UserInput>, JsonRejection>| async move {
                service.create_user(payload).await
            }
        });

        let item: MethodRouter = get({
            let service = service.clone();
            move |path: Result<Path<i64>, PathRejection>| async move {
                service.get_user(path).await
            }
        })
        .put({
            let service = service.clone();
            move |path: Result<Path<i64>, PathRejection>,
                  payload: Result<Json<UserInput>, JsonRejection>| async move {
                service.update_user(path, payload).await
            }
        })
        .delete({
            let service = service.clone();
            move |path: Result<Path<i64>, PathRejection>| async move {
                service.delete_user(path).await
            }
        });

        Router::new()
            .route("/users", collection.clone())
            .route("/users/", collection)
            .route("/users/{id}", item)
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biz::UserUseCase;
    use crate::data::{self, InMemoryUserRepo, SqliteUserRepo};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use shared::config::ServerConfig;
    use tower::ServiceExt;

    fn app_with(cfg: ServerConfig) -> Router {
        let uuc = Arc::new(UserUseCase::new(Arc::new(InMemoryUserRepo::new())));
        HttpServer::new(Arc::new(cfg), uuc).create_router()
    }

    fn app() -> Router {
        app_with(ServerConfig::default_for_test())
    }

    async fn sqlite_app() -> Router {
        let cfg = ServerConfig::default_for_test();
        let pool = data::connect(&cfg).await.unwrap();
        let repo = SqliteUserRepo::new(pool);
        repo.ensure_schema().await.unwrap();

        let uuc = Arc::new(UserUseCase::new(Arc::new(repo)));
        HttpServer::new(Arc::new(cfg), uuc).create_router()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ann() -> Value {
        json!({"name": "Ann", "email": "a@x.com", "age": 30})
    }

    #[tokio::test]
    async fn test_create_user_returns_201() {
        let app = app();
        let (status, body) = send_json(&app, Method::POST, "/api/v1/users/", Some(ann())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_i64());
        assert_eq!(body["name"], "Ann");
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["age"], 30);
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_create_user_schema_violation_is_422() {
        let app = app();

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/users/",
            Some(json!({"name": "Ann", "age": 30})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 1001);

        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/users/",
            Some(json!({"name": "Ann", "email": "a@x.com", "age": "thirty"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, list) = send_json(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_get_missing_user_is_404() {
        let app = app();
        let (status, body) = send_json(&app, Method::GET, "/api/v1/users/7", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
        assert_eq!(body["msg"], "User not found in the database");
    }

    #[tokio::test]
    async fn test_non_integer_id_is_422() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/v1/users/abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let app = app();
        let (_, created) = send_json(&app, Method::POST, "/api/v1/users/", Some(ann())).await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        let (status, fetched) = send_json(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_users() {
        let app = app();
        let (status, body) = send_json(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (_, first) = send_json(&app, Method::POST, "/api/v1/users/", Some(ann())).await;
        let (_, second) = send_json(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(json!({"name": "Bob", "email": "b@x.com", "age": 40})),
        )
        .await;

        let (_, body) = send_json(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(body, json!([first, second]));

        let (status, _) = send(&app, Method::GET, "/api/v1/users/", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_user() {
        let app = app();
        let (_, created) = send_json(&app, Method::POST, "/api/v1/users/", Some(ann())).await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        let change = json!({"name": "Anna", "email": "anna@x.com", "age": 31, "id": 500});
        let (status, updated) = send_json(&app, Method::PUT, &uri, Some(change.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_eq!(updated["name"], "Anna");
        assert_eq!(updated["age"], 31);

        let (_, again) = send_json(&app, Method::PUT, &uri, Some(change)).await;
        assert_eq!(again, updated);

        let (status, body) = send_json(&app, Method::PUT, "/api/v1/users/999", Some(ann())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "User not found in the database");

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let app = app();
        let (_, created) = send_json(&app, Method::POST, "/api/v1/users/", Some(ann())).await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_json(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "User not found in the database");

        let (_, list) = send_json(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_empty_prefix_serves_at_root() {
        let mut cfg = ServerConfig::default_for_test();
        cfg.api_prefix = String::new();
        let app = app_with(cfg);

        let (status, _) = send(&app, Method::POST, "/users/", Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let app = app();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_cors_allow_list() {
        let mut cfg = ServerConfig::default_for_test();
        cfg.allowed_origins = "http://a.com,http://b.com".to_string();
        let app = app_with(cfg);

        let request = Request::builder()
            .uri("/api/v1/users")
            .header("origin", "http://a.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://a.com"
        );

        let request = Request::builder()
            .uri("/api/v1/users")
            .header("origin", "http://evil.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_crud_round_trip_on_sqlite() {
        let app = sqlite_app().await;

        let (status, created) = send_json(&app, Method::POST, "/api/v1/users/", Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/v1/users/{}", created["id"]);

        let (status, fetched) = send_json(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let change = json!({"name": "Anna", "email": "anna@x.com", "age": 31});
        let (status, updated) = send_json(&app, Method::PUT, &uri, Some(change)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_eq!(updated["name"], "Anna");

        let (_, list) = send_json(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(list, json!([updated]));

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (_, list) = send_json(&app, Method::GET, "/api/v1/users", None).await;
        assert_eq!(list, json!([]));
    }
}
