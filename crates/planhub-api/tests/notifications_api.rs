//! Router-level tests against the in-memory repositories.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use planhub_api::{AppState, build_app};
use planhub_auth::jwt::{JwtEncoder, TokenRole};
use planhub_core::config::AppConfig;
use planhub_database::Repositories;
use planhub_database::repositories::{NotificationRepository, UserRepository};
use planhub_entity::user::{User, UserRole};

struct TestApp {
    state: AppState,
    router: Router,
    encoder: JwtEncoder,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let state = AppState::new(config.clone(), Repositories::in_memory());
        let router = build_app(state.clone(), &config.server.cors);
        Self {
            state,
            router,
            encoder: JwtEncoder::new(&config.auth),
        }
    }

    async fn user(&self, name: &str, role: UserRole) -> (User, String) {
        let user = User::new(name, role);
        self.state.repositories.users.insert(&user).await.unwrap();
        let (token, _) = self.encoder.issue(user.id, TokenRole::from(role), name).unwrap();
        (user, token)
    }

    fn system_token(&self) -> String {
        self.encoder.issue_system("scheduler").unwrap().0
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn message_for(user: &User) -> Value {
    json!({
        "target_user_id": user.id,
        "category": "message",
        "title": "New message",
        "body": "Are we still on for Friday?",
        "link": "/plans/42/chat",
    })
}

#[tokio::test]
async fn test_create_list_and_mark_read() {
    let app = TestApp::new();
    let (member, token) = app.user("ada", UserRole::Member).await;
    let system = app.system_token();

    let (status, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(message_for(&member)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["skipped"], false);
    assert_eq!(body["data"]["delivered"], 0);
    let id = body["data"]["notification"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.send("GET", "/api/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_count"], 1);
    assert_eq!(body["data"]["unread_count"], 1);
    assert_eq!(body["data"]["items"][0]["id"], id.as_str());
    assert_eq!(body["data"]["items"][0]["is_read"], false);

    let uri = format!("/api/notifications/{id}/read");
    let (status, body) = app.send("PUT", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);
    let first_read_at = body["data"]["read_at"].clone();

    let (status, body) = app.send("PUT", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["read_at"], first_read_at);

    let (_, body) = app
        .send("GET", "/api/notifications/unread-count", Some(&token), None)
        .await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = TestApp::new();
    let (member, _) = app.user("ben", UserRole::Member).await;

    let (status, body) = app
        .send("POST", "/api/notifications", None, Some(message_for(&member)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION");

    let (status, _) = app
        .send("POST", "/api/notifications", Some("not-a-jwt"), Some(message_for(&member)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_privileged_category_needs_system_or_admin() {
    let app = TestApp::new();
    let (target, _) = app.user("cleo", UserRole::Member).await;
    let (_, member_token) = app.user("dev", UserRole::Member).await;
    let (_, admin_token) = app.user("root", UserRole::Admin).await;

    let mut body = message_for(&target);
    body["category"] = json!("system");

    let (status, resp) = app
        .send("POST", "/api/notifications", Some(&member_token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["error"], "AUTHORIZATION");

    let (status, _) = app
        .send("POST", "/api/notifications", Some(&admin_token), Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send("POST", "/api/notifications", Some(&member_token), Some(message_for(&target)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_rejections() {
    let app = TestApp::new();
    let (member, _) = app.user("eve", UserRole::Member).await;
    let system = app.system_token();

    let mut missing = message_for(&member);
    missing.as_object_mut().unwrap().remove("title");
    let (status, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(missing))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_FIELD");
    assert!(body["message"].as_str().unwrap().contains("title"));

    let mut bad_category = message_for(&member);
    bad_category["category"] = json!("party");
    let (status, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(bad_category))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_CATEGORY");

    let ghost = User::new("ghost", UserRole::Member);
    let (status, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(message_for(&ghost)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "UNKNOWN_USER");

    assert_eq!(app.state.repositories.notifications.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_disabled_category_is_skipped() {
    let app = TestApp::new();
    let (member, token) = app.user("fay", UserRole::Member).await;
    let system = app.system_token();

    let (status, body) = app
        .send(
            "PUT",
            "/api/notifications/preferences",
            Some(&token),
            Some(json!({ "preferences": { "like": false } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["preferences"]["like"], false);
    assert_eq!(body["data"]["preferences"]["message"], true);

    let mut like = message_for(&member);
    like["category"] = json!("like");
    let (status, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(like))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["skipped"], true);
    assert_eq!(body["data"]["skip_reason"], "preference_disabled");
    assert!(body["data"].get("notification").is_none());

    let (_, body) = app.send("GET", "/api/notifications", Some(&token), None).await;
    assert_eq!(body["data"]["total_count"], 0);

    let (status, body) = app
        .send(
            "PUT",
            "/api/notifications/preferences",
            Some(&token),
            Some(json!({ "preferences": { "party": false } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_CATEGORY");
}

#[tokio::test]
async fn test_mark_read_ownership() {
    let app = TestApp::new();
    let (owner, _) = app.user("gus", UserRole::Member).await;
    let (_, other_token) = app.user("hal", UserRole::Member).await;
    let system = app.system_token();

    let (_, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(message_for(&owner)))
        .await;
    let id = body["data"]["notification"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send("PUT", &format!("/api/notifications/{id}/read"), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unknown = uuid::Uuid::new_v4();
    let (status, body) = app
        .send("PUT", &format!("/api/notifications/{unknown}/read"), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_paging_and_filters() {
    let app = TestApp::new();
    let (member, token) = app.user("ivy", UserRole::Member).await;
    let system = app.system_token();

    for _ in 0..3 {
        app.send("POST", "/api/notifications", Some(&system), Some(message_for(&member)))
            .await;
    }
    let (_, body) = app.send("GET", "/api/notifications?limit=1", Some(&token), None).await;
    let first = body["data"]["items"][0]["id"].as_str().unwrap().to_string();
    app.send("PUT", &format!("/api/notifications/{first}/read"), Some(&token), None)
        .await;

    let (status, body) = app
        .send("GET", "/api/notifications?page=2&limit=2", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total_count"], 3);
    assert_eq!(body["data"]["page"], 2);

    let (_, body) = app
        .send("GET", "/api/notifications?unread_only=true", Some(&token), None)
        .await;
    assert_eq!(body["data"]["total_count"], 2);
    assert_eq!(body["data"]["unread_count"], 2);

    let (_, body) = app
        .send("GET", "/api/notifications?limit=1000", Some(&token), None)
        .await;
    assert_eq!(body["data"]["limit"], 100);

    let (status, body) = app
        .send("GET", "/api/notifications?page=0", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");

    let (status, body) = app
        .send("PUT", "/api/notifications/read-all", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 2);
}

#[tokio::test]
async fn test_user_endpoints_reject_system_tokens() {
    let app = TestApp::new();
    let system = app.system_token();

    let (status, _) = app.send("GET", "/api/notifications", Some(&system), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_created_notification_is_pushed_to_open_connections() {
    let app = TestApp::new();
    let (member, _) = app.user("jo", UserRole::Member).await;
    let system = app.system_token();

    let connections = &app.state.realtime.connections;
    let (handle, mut rx) = connections.open();
    let (token, _) = app.encoder.issue(member.id, TokenRole::Member, "jo").unwrap();
    let hello = json!({ "type": "authenticate", "user_id": member.id, "token": token });
    connections.handle_inbound(&handle, &hello.to_string()).await;
    let ack: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(ack["type"], "auth_success");

    let (status, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(message_for(&member)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["delivered"], 1);

    let pushed: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(pushed["type"], "notification");
    assert_eq!(pushed["id"], body["data"]["notification"]["id"]);
    assert_eq!(pushed["title"], "New message");

    connections.close(&handle);
    let (_, body) = app
        .send("POST", "/api/notifications", Some(&system), Some(message_for(&member)))
        .await;
    assert_eq!(body["data"]["delivered"], 0);
}

#[tokio::test]
async fn test_broadcast_and_health() {
    let app = TestApp::new();
    let (_, member_token) = app.user("kai", UserRole::Member).await;
    let (_, admin_token) = app.user("lee", UserRole::Admin).await;
    let broadcast = json!({ "title": "Maintenance", "message": "Back at 23:00", "severity": "warning" });

    let (status, _) = app
        .send("POST", "/api/admin/broadcast", Some(&member_token), Some(broadcast.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("POST", "/api/admin/broadcast", Some(&admin_token), Some(broadcast))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["delivered"], 0);

    let (status, body) = app
        .send(
            "POST",
            "/api/admin/broadcast",
            Some(&admin_token),
            Some(json!({ "title": "", "message": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");

    let (status, body) = app.send("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (_, body) = app.send("GET", "/api/health/detailed", None, None).await;
    assert_eq!(body["data"]["database"], "connected");
    assert_eq!(body["data"]["metrics"]["broadcasts"], 1);
}
