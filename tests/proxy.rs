use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use httpmock::MockServer;
use serde_json::{Value, json};
use tower::ServiceExt;

use pulseboard::config::{CredentialSet, RankingSettings, UpstreamSettings};
use pulseboard::infra::http::{ApiState, build_router};
use pulseboard::infra::upstream::EvaluationClient;

fn credentials() -> CredentialSet {
    CredentialSet {
        email: "dev@example.com".to_string(),
        name: "dev".to_string(),
        roll_no: "r-1".to_string(),
        access_code: "code".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
    }
}

fn app(server: &MockServer) -> Router {
    app_with_timeout(server, Duration::from_secs(5))
}

fn app_with_timeout(server: &MockServer, timeout: Duration) -> Router {
    let settings = UpstreamSettings {
        base_url: Some(server.base_url()),
        timeout,
        credentials: Some(credentials()),
    };
    let upstream = Arc::new(EvaluationClient::from_settings(&settings).expect("client builds"));
    let ranking = RankingSettings {
        fan_out: NonZeroUsize::new(4).unwrap(),
        leaderboard_size: NonZeroUsize::new(5).unwrap(),
    };
    build_router(ApiState::new(upstream, &ranking))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is json")
    };
    (status, value)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request builds")
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn mock_auth(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method("POST").path("/auth");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"token_type": "Bearer", "access_token": "tok-1", "expires_in": 3600}));
    })
}

#[tokio::test]
async fn token_is_fetched_once_across_proxied_calls() {
    let server = MockServer::start();
    let auth = mock_auth(&server);
    let users = server.mock(|when, then| {
        when.method("GET")
            .path("/users")
            .header("authorization", "Bearer tok-1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"users": {"1": "Alice"}}));
    });

    let router = app(&server);
    let (first, _) = send(&router, get("/users")).await;
    let (second, _) = send(&router, get("/users")).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(auth.hits(), 1);
    assert_eq!(users.hits(), 2);
}

#[tokio::test]
async fn users_body_is_relayed_verbatim() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"users": {"1": "Alice", "2": "Bob"}}));
    });

    let router = app(&server);
    let (status, body) = send(&router, get("/users")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"users": {"1": "Alice", "2": "Bob"}}));
}

#[tokio::test]
async fn upstream_error_status_and_payload_are_mirrored() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users/99/posts");
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({"message": "no such user"}));
    });

    let router = app(&server);
    let (status, body) = send(&router, get("/users/99/posts")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": {"message": "no such user"}}));
}

// A token exchange that yields no usable token is an authentication
// failure, kept distinct from transport-level unavailability: the typed
// surface reports `auth_failed`, not `upstream_unavailable`, because the
// operator remedy differs (fix credentials vs. wait out an outage).
#[tokio::test]
async fn auth_without_access_token_fails_both_surfaces() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/auth");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"token_type": "Bearer"}));
    });

    let router = app(&server);

    let (proxy_status, proxy_body) = send(&router, get("/users")).await;
    assert_eq!(proxy_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(proxy_body.get("error").is_some());

    let (api_status, api_body) = send(&router, get("/api/v1/analytics/top-users")).await;
    assert_eq!(api_status, StatusCode::BAD_GATEWAY);
    assert_eq!(api_body["error"]["code"], "auth_failed");
}

#[tokio::test]
async fn failed_auth_exchange_mirrors_the_upstream_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/auth");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"message": "bad clientID"}));
    });

    let router = app(&server);
    let (status, body) = send(&router, get("/users")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": {"message": "bad clientID"}}));
}

#[tokio::test]
async fn register_is_forwarded_without_a_token() {
    let server = MockServer::start();
    let register = server.mock(|when, then| {
        when.method("POST")
            .path("/register")
            .json_body(json!({"email": "new@example.com", "name": "New"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"clientID": "c-2", "clientSecret": "s-2"}));
    });

    let router = app(&server);
    let (status, body) = send(
        &router,
        post_json("/register", json!({"email": "new@example.com", "name": "New"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientID"], "c-2");
    assert_eq!(register.hits(), 1);
}

#[tokio::test]
async fn explicit_auth_refresh_replaces_the_cached_token() {
    let server = MockServer::start();
    let auth = mock_auth(&server);

    let router = app(&server);
    let (status, body) = send(&router, post_json("/auth", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "tok-1");
    assert_eq!(auth.hits(), 1);
}

#[tokio::test]
async fn top_users_ranks_and_breaks_ties_by_enumeration_order() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"users": {"1": "Alice", "2": "Bob", "3": "Cara"}}"#);
    });
    for (user_id, count) in [("1", 2), ("2", 5), ("3", 5)] {
        let posts: Vec<Value> = (0..count)
            .map(|n| json!({"id": n, "userId": user_id.parse::<i64>().unwrap(), "content": "p"}))
            .collect();
        server.mock(|when, then| {
            when.method("GET").path(format!("/users/{user_id}/posts"));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"posts": posts}));
        });
    }

    let router = app(&server);
    let (status, body) = send(&router, get("/api/v1/analytics/top-users")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["users"]
        .as_array()
        .expect("users array")
        .iter()
        .map(|u| u["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["Bob", "Cara", "Alice"]);
    assert_eq!(body["users"][0]["postCount"], 5);
}

#[tokio::test]
async fn unreachable_posts_rank_the_user_with_zero() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"users": {"1": "Alice", "2": "Bob"}}"#);
    });
    server.mock(|when, then| {
        when.method("GET").path("/users/1/posts");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"posts": [{"id": 1, "userId": 1, "content": "p"}]}));
    });
    server.mock(|when, then| {
        when.method("GET").path("/users/2/posts");
        then.status(503).body("unavailable");
    });

    let router = app(&server);
    let (status, body) = send(&router, get("/api/v1/analytics/top-users")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"][0]["name"], "Alice");
    assert_eq!(body["users"][1]["name"], "Bob");
    assert_eq!(body["users"][1]["postCount"], 0);
}

#[tokio::test]
async fn malformed_users_body_is_a_bad_gateway_on_the_typed_surface() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"users": {"1": 42}}));
    });

    let router = app(&server);
    let (status, body) = send(&router, get("/api/v1/analytics/top-users")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "malformed_upstream_response");
}

#[tokio::test]
async fn comment_expansion_always_reflects_the_current_upstream_state() {
    let server = MockServer::start();
    mock_auth(&server);
    let mut initial = server.mock(|when, then| {
        when.method("GET").path("/posts/7/comments");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"comments": [{"id": 1, "postId": 7, "content": "nice"}]}));
    });

    let router = app(&server);
    let (first, body) = send(&router, get("/api/v1/posts/7/comments")).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(body["comments"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["comments"][0]["postId"], 7);

    // A comment lands upstream between two expansions; the service holds no
    // memo of its own, so the next view sees it.
    initial.delete();
    server.mock(|when, then| {
        when.method("GET").path("/posts/7/comments");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"comments": [
                {"id": 1, "postId": 7, "content": "nice"},
                {"id": 2, "postId": 7, "content": "late reply"}
            ]}));
    });

    let (second, body) = send(&router, get("/api/v1/posts/7/comments")).await;
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["comments"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn upstream_timeout_surfaces_as_unavailable() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_secs(2))
            .json_body(json!({"users": {"1": "Alice"}}));
    });

    let router = app_with_timeout(&server, Duration::from_millis(250));

    let (api_status, api_body) = send(&router, get("/api/v1/analytics/top-users")).await;
    assert_eq!(api_status, StatusCode::BAD_GATEWAY);
    assert_eq!(api_body["error"]["code"], "upstream_unavailable");

    let (proxy_status, proxy_body) = send(&router, get("/users")).await;
    assert_eq!(proxy_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(proxy_body.get("error").is_some());
}

#[tokio::test]
async fn concurrent_first_calls_share_one_token_exchange() {
    let server = MockServer::start();
    let auth = server.mock(|when, then| {
        when.method("POST").path("/auth");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(150))
            .json_body(json!({"access_token": "tok-1"}));
    });
    let users = server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"users": {"1": "Alice"}}));
    });

    let router = app(&server);
    let (left, right) = tokio::join!(send(&router, get("/users")), send(&router, get("/users")));

    assert_eq!(left.0, StatusCode::OK);
    assert_eq!(right.0, StatusCode::OK);
    assert_eq!(auth.hits(), 1);
    assert_eq!(users.hits(), 2);
}

#[tokio::test]
async fn health_answers_without_touching_the_upstream() {
    let server = MockServer::start();
    let auth = mock_auth(&server);

    let router = app(&server);
    let (status, _) = send(&router, get("/healthz")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(auth.hits(), 0);
}

#[tokio::test]
async fn typed_user_posts_surface_returns_the_wire_shape() {
    let server = MockServer::start();
    mock_auth(&server);
    server.mock(|when, then| {
        when.method("GET").path("/users/3/posts");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"posts": [{"id": 10, "userId": 3, "content": "hello"}]}));
    });

    let router = app(&server);
    let (status, body) = send(&router, get("/api/v1/users/3/posts")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"posts": [{"id": 10, "userId": 3, "content": "hello"}]}));
}
