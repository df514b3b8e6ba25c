//! Integration tests for the creator rewards service
//!
//! These tests exercise the reward ledger against the in-memory store,
//! the automatic sweep, analytics, and the HTTP API end to end.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use creator_rewards::audit::AuditLogger;
use creator_rewards::database::RewardFilter;
use creator_rewards::models::{
    Content, ContentStatus, ContentType, Creator, CreatorTier, Platform, RewardStatus,
};
use creator_rewards::rewards::Timeframe;
use creator_rewards::{
    ApiState, AppError, DisabledGateway, MemoryStore, RewardLedger, RewardSweeper, ScoringConfig,
    SecurityMiddlewareConfig, SecurityState, Store, TransitionPolicy, create_app,
};

const ADMIN_KEY: &str = "test-admin-key";

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    store: Arc<MemoryStore>,
    ledger: Arc<RewardLedger>,
    creator: Creator,
}

async fn create_fixture(policy: TransitionPolicy) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let mut creator = Creator::new(Uuid::new_v4(), "CRTEST0001".to_string());
    creator.tier = CreatorTier::Gold;
    store.insert_creator(&creator).await.unwrap();

    let ledger = Arc::new(RewardLedger::new(
        store.clone(),
        ScoringConfig::default(),
        policy,
        Arc::new(AuditLogger::new()),
    ));
    Fixture {
        store,
        ledger,
        creator,
    }
}

/// Published content with the given counters
async fn create_published_content(
    store: &MemoryStore,
    creator_id: Uuid,
    title: &str,
    views: i64,
    likes: i64,
) -> Content {
    let mut content = Content::new(
        creator_id,
        title.to_string(),
        ContentType::Video,
        Platform::Youtube,
    );
    content.status = ContentStatus::Published;
    content.published_at = Some(chrono::Utc::now());
    content.views = views;
    content.likes = likes;
    content.recompute_engagement_rate();
    store.insert_content(&content).await.unwrap();
    content
}

/// Assert `pending = Σ pending/approved` and `total = Σ paid` for the creator
async fn assert_balance_invariant(fixture: &Fixture) {
    let rewards = fixture
        .ledger
        .list(&RewardFilter {
            creator_id: Some(fixture.creator.id),
            ..RewardFilter::default()
        })
        .await
        .unwrap();

    let outstanding: Decimal = rewards
        .iter()
        .filter(|r| matches!(r.status, RewardStatus::Pending | RewardStatus::Approved))
        .map(|r| r.amount)
        .sum();
    let paid: Decimal = rewards
        .iter()
        .filter(|r| r.status == RewardStatus::Paid)
        .map(|r| r.amount)
        .sum();

    let balance = fixture
        .store
        .get_creator(fixture.creator.id)
        .await
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(balance.pending_earnings, outstanding);
    assert_eq!(balance.total_earnings, paid);
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

// ============================================================================
// Ledger Invariants
// ============================================================================

#[tokio::test]
async fn test_balances_track_every_transition() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let ledger = &fixture.ledger;
    let creator_id = fixture.creator.id;

    let a = ledger
        .create_milestone_reward(creator_id, "100 followers".to_string(), dec("25.00"), None)
        .await
        .unwrap();
    let b = ledger
        .create_engagement_bonus(creator_id, dec("12.50"), "week".to_string(), None)
        .await
        .unwrap();
    let c = ledger
        .create_milestone_reward(creator_id, "first video".to_string(), dec("5.25"), None)
        .await
        .unwrap();
    let d = ledger
        .create_engagement_bonus(creator_id, dec("7.75"), "month".to_string(), None)
        .await
        .unwrap();
    assert_balance_invariant(&fixture).await;

    ledger.approve(a.id, None).await.unwrap();
    assert_balance_invariant(&fixture).await;

    ledger
        .mark_paid(a.id, Some("tx-a".to_string()), None)
        .await
        .unwrap();
    assert_balance_invariant(&fixture).await;

    // pending -> paid is open without require_approval
    ledger.mark_paid(b.id, None, None).await.unwrap();
    assert_balance_invariant(&fixture).await;

    ledger
        .reject(c.id, "duplicate claim".to_string(), None)
        .await
        .unwrap();
    assert_balance_invariant(&fixture).await;

    ledger.approve(d.id, None).await.unwrap();
    ledger
        .cancel(d.id, Some("creator left".to_string()), None)
        .await
        .unwrap();
    assert_balance_invariant(&fixture).await;

    let balance = fixture
        .store
        .get_creator(creator_id)
        .await
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(balance.total_earnings, dec("37.50"));
    assert_eq!(balance.pending_earnings, Decimal::ZERO);
}

#[tokio::test]
async fn test_create_then_reject_restores_pending() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let ledger = &fixture.ledger;
    let creator_id = fixture.creator.id;

    ledger
        .create_milestone_reward(creator_id, "seed".to_string(), dec("10.00"), None)
        .await
        .unwrap();
    let before = fixture
        .store
        .get_creator(creator_id)
        .await
        .unwrap()
        .unwrap()
        .balance;

    let reward = ledger
        .create_engagement_bonus(creator_id, Decimal::from(50), "day".to_string(), None)
        .await
        .unwrap();
    let during = fixture
        .store
        .get_creator(creator_id)
        .await
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(
        during.pending_earnings,
        before.pending_earnings + Decimal::from(50)
    );

    ledger
        .reject(reward.id, "not eligible".to_string(), None)
        .await
        .unwrap();
    let after = fixture
        .store
        .get_creator(creator_id)
        .await
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_duplicate_transition_leaves_balances_unchanged() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let ledger = &fixture.ledger;

    let reward = ledger
        .create_milestone_reward(
            fixture.creator.id,
            "1k views".to_string(),
            dec("20.00"),
            None,
        )
        .await
        .unwrap();
    ledger.mark_paid(reward.id, None, None).await.unwrap();
    let paid_balance = fixture
        .store
        .get_creator(fixture.creator.id)
        .await
        .unwrap()
        .unwrap()
        .balance;

    let err = ledger.mark_paid(reward.id, None, None).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: RewardStatus::Paid,
            to: RewardStatus::Paid
        }
    ));
    let err = ledger
        .reject(reward.id, "too late".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let balance = fixture
        .store
        .get_creator(fixture.creator.id)
        .await
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(balance, paid_balance);
    assert_balance_invariant(&fixture).await;
}

#[tokio::test]
async fn test_concurrent_transitions_do_not_lose_updates() {
    let fixture = create_fixture(TransitionPolicy::default()).await;

    let mut ids = Vec::new();
    for i in 0..20 {
        let reward = fixture
            .ledger
            .create_milestone_reward(
                fixture.creator.id,
                format!("milestone {}", i),
                dec("1.50"),
                None,
            )
            .await
            .unwrap();
        ids.push(reward.id);
    }

    let mut handles = Vec::new();
    for (i, id) in ids.into_iter().enumerate() {
        let ledger = fixture.ledger.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                ledger.mark_paid(id, None, None).await
            } else {
                ledger.reject(id, "batch rejection".to_string(), None).await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let balance = fixture
        .store
        .get_creator(fixture.creator.id)
        .await
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(balance.total_earnings, dec("15.00"));
    assert_eq!(balance.pending_earnings, Decimal::ZERO);
    assert_balance_invariant(&fixture).await;
}

// ============================================================================
// Automatic Sweep
// ============================================================================

#[tokio::test]
async fn test_sweep_rewards_each_item_once() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let store = &fixture.store;
    let creator_id = fixture.creator.id;

    let popular = create_published_content(store, creator_id, "Popular", 500, 40).await;
    let liked = create_published_content(store, creator_id, "Liked", 5, 2).await;
    let quiet = create_published_content(store, creator_id, "Quiet", 10, 1).await;

    let sweeper = RewardSweeper::new(store.clone(), fixture.ledger.clone());

    let first = sweeper.run().await.unwrap();
    assert_eq!(first.scanned, 3);
    assert_eq!(first.eligible, 2);
    assert_eq!(first.rewarded, 2);
    assert_eq!(first.failed, 0);

    let second = sweeper.run().await.unwrap();
    assert_eq!(second.rewarded, 0);

    let rewards = fixture.ledger.list(&RewardFilter::default()).await.unwrap();
    assert_eq!(rewards.len(), 2);
    for content_id in [popular.id, liked.id] {
        let count = rewards
            .iter()
            .filter(|r| r.content_id == Some(content_id))
            .count();
        assert_eq!(count, 1);
        let stamped = store.get_content(content_id).await.unwrap().unwrap();
        assert!(stamped.is_rewarded());
    }
    let untouched = store.get_content(quiet.id).await.unwrap().unwrap();
    assert!(!untouched.is_rewarded());

    assert_eq!(
        first.total_amount,
        rewards.iter().map(|r| r.amount).sum::<Decimal>()
    );
    assert_balance_invariant(&fixture).await;
}

#[tokio::test]
async fn test_sweep_skips_manually_rewarded_content() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let content =
        create_published_content(&fixture.store, fixture.creator.id, "Manual first", 100, 10)
            .await;

    fixture
        .ledger
        .create_content_reward(content.id, None)
        .await
        .unwrap();

    let sweeper = RewardSweeper::new(fixture.store.clone(), fixture.ledger.clone());
    let report = sweeper.run().await.unwrap();
    assert_eq!(report.rewarded, 0);

    let rewards = fixture.ledger.list(&RewardFilter::default()).await.unwrap();
    assert_eq!(rewards.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_sweeps_reward_each_item_once() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let mut eligible = Vec::new();
    for i in 0..20 {
        let title = format!("Clip {}", i);
        let content =
            create_published_content(&fixture.store, fixture.creator.id, &title, 100, 5).await;
        eligible.push(content);
    }

    let sweeper = Arc::new(RewardSweeper::new(
        fixture.store.clone(),
        fixture.ledger.clone(),
    ));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let sweeper = sweeper.clone();
        handles.push(tokio::spawn(async move { sweeper.run().await }));
    }

    let mut rewarded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(report) => rewarded += report.rewarded,
            Err(e) => assert!(matches!(e, AppError::Conflict(_)), "unexpected error: {}", e),
        }
    }
    assert_eq!(rewarded, eligible.len());

    let rewards = fixture.ledger.list(&RewardFilter::default()).await.unwrap();
    assert_eq!(rewards.len(), eligible.len());
    for content in &eligible {
        let count = rewards
            .iter()
            .filter(|r| r.content_id == Some(content.id))
            .count();
        assert_eq!(count, 1);
    }
    assert_balance_invariant(&fixture).await;
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn test_analytics_aggregates_by_status_and_type() {
    let fixture = create_fixture(TransitionPolicy::default()).await;
    let ledger = &fixture.ledger;
    let creator_id = fixture.creator.id;

    let paid = ledger
        .create_milestone_reward(creator_id, "launch".to_string(), dec("30.00"), None)
        .await
        .unwrap();
    ledger.mark_paid(paid.id, None, None).await.unwrap();
    let approved = ledger
        .create_engagement_bonus(creator_id, dec("10.00"), "week".to_string(), None)
        .await
        .unwrap();
    ledger.approve(approved.id, None).await.unwrap();
    ledger
        .create_engagement_bonus(creator_id, dec("2.50"), "day".to_string(), None)
        .await
        .unwrap();

    let analytics = ledger
        .analytics(Some(creator_id), Some(Timeframe::Week))
        .await
        .unwrap();
    assert_eq!(analytics.total_rewards, 3);
    assert_eq!(analytics.total_amount, dec("42.50"));
    assert_eq!(analytics.paid_amount, dec("30.00"));
    assert_eq!(analytics.approved_amount, dec("10.00"));
    assert_eq!(analytics.pending_amount, dec("2.50"));
    assert_eq!(
        analytics.rewards_by_type.get("engagement_bonus"),
        Some(&dec("12.50"))
    );
    assert_eq!(analytics.recent_rewards.len(), 3);

    let other = ledger
        .analytics(Some(Uuid::new_v4()), None)
        .await
        .unwrap();
    assert_eq!(other.total_rewards, 0);
    assert_eq!(other.total_amount, Decimal::ZERO);
}

// ============================================================================
// HTTP API
// ============================================================================

fn create_test_app(enable_auth: bool) -> Router {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = ApiState::new(
        store,
        ScoringConfig::default(),
        TransitionPolicy::default(),
        Arc::new(DisabledGateway),
        Some(ADMIN_KEY.to_string()),
    );
    let security = SecurityState::new(SecurityMiddlewareConfig {
        enable_auth,
        api_keys: vec!["client-key".to_string()],
        ..SecurityMiddlewareConfig::default()
    });
    create_app(state, security)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, admin: bool) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header("x-admin-key", ADMIN_KEY);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn json_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => dec(s),
        Value::Number(n) => dec(&n.to_string()),
        other => panic!("not a decimal: {}", other),
    }
}

/// Registers a user and creator profile through the API, returning the creator id
async fn register_creator(app: &Router, email: &str) -> (String, String) {
    let (status, user) = send(
        app,
        "POST",
        "/users",
        Some(json!({
            "email": email,
            "username": email.split('@').next().unwrap(),
            "password": "secret123",
        })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = user["id"].as_str().unwrap().to_string();

    let (status, creator) = send(
        app,
        "POST",
        "/creators",
        Some(json!({ "user_id": user_id })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(creator["creator_code"].as_str().unwrap().starts_with("CR"));
    (user_id, creator["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_test_app(true);
    let (status, body) = send(&app, "GET", "/health", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/rewards", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_admin_operations_require_admin_key() {
    let app = create_test_app(false);
    let (status, body) = send(&app, "POST", "/rewards/process-automatic", None, false).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, report) = send(&app, "POST", "/rewards/process-automatic", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["rewarded"], 0);
}

#[tokio::test]
async fn test_content_to_paid_reward_flow() {
    let app = create_test_app(false);
    let (_user_id, creator_id) = register_creator(&app, "maker@example.com").await;

    let (status, content) = send(
        &app,
        "POST",
        "/content",
        Some(json!({
            "creator_id": creator_id,
            "title": "Studio tour",
            "platform": "youtube",
        })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(content["status"], "draft");
    let content_id = content["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/content/{}/stats", content_id),
        Some(json!({ "views": 1000, "likes": 50, "shares": 10, "comments": 5 })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, published) = send(
        &app,
        "PATCH",
        &format!("/content/{}/status", content_id),
        Some(json!({ "status": "published" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["status"], "published");

    let (status, quote) = send(
        &app,
        "GET",
        &format!("/rewards/calculate/{}", content_id),
        None,
        false,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let quoted = json_decimal(&quote["amount"]);
    assert!(quoted > Decimal::ZERO);

    let (status, report) = send(&app, "POST", "/rewards/process-automatic", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["rewarded"], 1);

    let (_, report) = send(&app, "POST", "/rewards/process-automatic", None, true).await;
    assert_eq!(report["rewarded"], 0);

    let (status, rewards) = send(
        &app,
        "GET",
        &format!("/rewards?creator_id={}", creator_id),
        None,
        false,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rewards = rewards.as_array().unwrap();
    assert_eq!(rewards.len(), 1);
    let reward_id = rewards[0]["id"].as_str().unwrap().to_string();
    assert_eq!(json_decimal(&rewards[0]["amount"]), quoted);

    let (_, creator) = send(&app, "GET", &format!("/creators/{}", creator_id), None, false).await;
    assert_eq!(json_decimal(&creator["pending_earnings"]), quoted);

    let (status, paid) = send(
        &app,
        "PATCH",
        &format!("/rewards/{}/status", reward_id),
        Some(json!({ "status": "paid", "transaction_reference": "bank-123" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["transaction_reference"], "bank-123");

    let (_, creator) = send(&app, "GET", &format!("/creators/{}", creator_id), None, false).await;
    assert_eq!(json_decimal(&creator["pending_earnings"]), Decimal::ZERO);
    assert_eq!(json_decimal(&creator["total_earnings"]), quoted);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/rewards/{}/approve", reward_id),
        None,
        true,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn test_status_endpoint_validates_target() {
    let app = create_test_app(false);
    let (_user_id, creator_id) = register_creator(&app, "bonus@example.com").await;

    let (status, reward) = send(
        &app,
        "POST",
        "/rewards/milestone",
        Some(json!({ "creator_id": creator_id, "milestone": "10k subs", "amount": "15.00" })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reward_id = reward["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/rewards/{}/status", reward_id),
        Some(json!({ "status": "pending" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/rewards/{}/status", reward_id),
        Some(json!({ "status": "rejected" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, rejected) = send(
        &app,
        "PATCH",
        &format!("/rewards/{}/status", reward_id),
        Some(json!({ "status": "rejected", "reason": "fake milestone" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");

    let (_, creator) = send(&app, "GET", &format!("/creators/{}", creator_id), None, false).await;
    assert_eq!(json_decimal(&creator["pending_earnings"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_content_update_requires_owner() {
    let app = create_test_app(false);
    let (owner_id, creator_id) = register_creator(&app, "owner@example.com").await;
    let (other_id, _) = register_creator(&app, "other@example.com").await;

    let (_, content) = send(
        &app,
        "POST",
        "/content",
        Some(json!({ "creator_id": creator_id, "title": "Mine", "platform": "tiktok" })),
        false,
    )
    .await;
    let uri = format!("/content/{}", content["id"].as_str().unwrap());

    let request = |user: Option<&str>| {
        let mut builder = Request::builder()
            .method("PATCH")
            .uri(&uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        builder
            .body(Body::from(json!({ "title": "Renamed" }).to_string()))
            .unwrap()
    };

    let response = app.clone().oneshot(request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(request(Some(&other_id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(request(Some(&owner_id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blockchain_disabled_reports_failure() {
    let app = create_test_app(false);
    let (_user_id, creator_id) = register_creator(&app, "chain@example.com").await;
    let (_, reward) = send(
        &app,
        "POST",
        "/rewards/engagement-bonus",
        Some(json!({ "creator_id": creator_id, "amount": 4, "period": "week" })),
        false,
    )
    .await;
    let reward_id = reward["id"].as_str().unwrap().to_string();

    let (status, outcome) = send(
        &app,
        "POST",
        "/blockchain/process-reward",
        Some(json!({ "reward_id": reward_id })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["success"], false);
    assert!(outcome["error"].is_string());

    let (_, unchanged) = send(&app, "GET", &format!("/rewards/{}", reward_id), None, false).await;
    assert_eq!(unchanged["status"], "pending");

    let (status, _) = send(&app, "GET", "/blockchain/stats", None, false).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let app = create_test_app(false);
    let missing = Uuid::new_v4();
    for uri in [
        format!("/rewards/{}", missing),
        format!("/creators/{}", missing),
        format!("/content/{}", missing),
        format!("/transactions/{}", missing),
    ] {
        let (status, body) = send(&app, "GET", &uri, None, false).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "not_found");
    }
}
