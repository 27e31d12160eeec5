use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::types::Uuid;
use tower::ServiceExt;

use promptdraw_api::{api_routes, GlobalState, USER_ID_HEADER, USER_ROLE_HEADER};
use promptdraw_runtime::store::MemoryDrawStore;
use promptdraw_runtime::{
    AccessRule, Card, CardPool, CardStatus, DrawEngine, DrawEngineEnv, DrawEvents, PityConfig,
    PoolType, RarityTier, User, UserQuota, UserRole,
};

struct TestApp {
    router: Router,
    user: User,
    admin: User,
}

fn test_app(quota: i32) -> TestApp {
    let store = Arc::new(MemoryDrawStore::new());
    for (id, p) in [(1, 0.5), (2, 0.3), (3, 0.15), (4, 0.03), (5, 0.015), (6, 0.005)] {
        store.add_tier(RarityTier::new(id, format!("tier-{id}"), p));
    }

    let pool = CardPool {
        id: Uuid::new_v4(),
        name: "standard".into(),
        pool_type: PoolType::Standard,
        active: true,
        access_rule: AccessRule::Public,
        created_at: 1,
        ..Default::default()
    };
    store.add_pool(pool.clone());
    for tier_id in 1..=6 {
        store.add_card(pool.id, Card {
            id: Uuid::new_v4(),
            rarity_tier_id: tier_id,
            status: CardStatus::Approved,
            title: format!("tier {tier_id} prompt"),
            content: "a prompt".into(),
            ..Default::default()
        }, None);
    }

    let user = User::new("drawer", UserRole::User);
    store.add_user(user.clone(), UserQuota::new(user.id, quota));
    let admin = User::new("admin", UserRole::Admin);
    store.add_user(admin.clone(), UserQuota::new(admin.id, 0));

    let env = DrawEngineEnv {
        pity: PityConfig::default(),
        rarity_cache_ttl_secs: 300,
        draw_timeout_secs: 5,
        event_buffer: 16,
    };
    let engine = DrawEngine::new(store, &env, DrawEvents::disabled());
    let router = api_routes::<MemoryDrawStore>().with_state(GlobalState::from_engine(engine));

    TestApp { router, user, admin }
}

fn request(method: &str, uri: &str, user: Option<&User>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder
            .header(USER_ID_HEADER, user.id.to_string())
            .header(USER_ROLE_HEADER, user.role.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_draw_requires_user_header() {
    let app = test_app(1);
    let (status, body) = send(&app, request("POST", "/draw", None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let bad = Request::builder()
        .method("POST")
        .uri("/draw")
        .header(USER_ID_HEADER, "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_draw_then_quota_exhausted() {
    let app = test_app(1);

    let (status, body) = send(&app, request("POST", "/draw", Some(&app.user), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remaining_draws"], 0);
    assert!(body["data"]["card"]["rarity_name"].as_str().unwrap().starts_with("tier-"));
    assert!(body["data"].get("pity_degraded").is_none());

    let (status, body) = send(&app, request("POST", "/draw", Some(&app.user), "{}")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["data"]["kind"], "insufficient_quota");
    assert_eq!(body["data"]["retryable"], false);

    let (status, body) = send(&app, request("GET", "/draw/history?limit=5", Some(&app.user), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_draw_rejects_unknown_pool_and_bad_body() {
    let app = test_app(2);

    let body = format!("{{\"pool_id\":\"{}\"}}", Uuid::new_v4());
    let (status, body) = send(&app, request("POST", "/draw", Some(&app.user), &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["kind"], "pool_not_found");

    let (status, _) = send(&app, request("POST", "/draw", Some(&app.user), "{\"pool_id\": 3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pity_status() {
    let app = test_app(1);
    let (status, body) = send(&app, request("GET", "/draw/pity", Some(&app.user), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pity"]["total_draws"], 0);
    assert!(body["data"]["config"].is_object());
}

#[tokio::test]
async fn test_tier_refresh_is_admin_only() {
    let app = test_app(1);

    let (status, body) = send(&app, request("GET", "/rarity/tiers", None, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);

    let (status, _) = send(&app, request("POST", "/rarity/tiers/refresh", None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("POST", "/rarity/tiers/refresh", Some(&app.user), "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("POST", "/rarity/tiers/refresh", Some(&app.admin), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_pools_health_and_metrics() {
    let app = test_app(1);

    let (status, body) = send(&app, request("GET", "/pools", Some(&app.user), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app.router.clone()
        .oneshot(request("GET", "/health", None, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // record at least one draw so the counters are registered with samples
    send(&app, request("POST", "/draw", Some(&app.user), "")).await;
    let response = app.router.clone()
        .oneshot(request("GET", "/metrics", None, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&text).contains("draws_total"));
}
