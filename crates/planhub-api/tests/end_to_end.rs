//! Full loop over real sockets: server, HTTP client, realtime listener and cache.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use planhub_api::{AppState, build_app};
use planhub_auth::Principal;
use planhub_auth::jwt::{JwtEncoder, TokenRole};
use planhub_client::{
    FetchOutcome, HttpNotificationApi, PushDisposition, RealtimeListener, ReconciliationCache,
};
use planhub_core::config::{AppConfig, ClientConfig};
use planhub_database::Repositories;
use planhub_database::repositories::UserRepository;
use planhub_entity::user::{User, UserRole};
use planhub_service::RequestContext;
use planhub_service::notification::NewNotification;

async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn test_push_reaches_client_cache_and_read_state_syncs_back() {
    let config = AppConfig::default();
    let state = AppState::new(config.clone(), Repositories::in_memory());
    let app = build_app(state.clone(), &config.server.cors);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let user = User::new("mia", UserRole::Member);
    state.repositories.users.insert(&user).await.unwrap();
    let (token, _) = JwtEncoder::new(&config.auth)
        .issue(user.id, TokenRole::Member, "mia")
        .unwrap();

    let client_config = ClientConfig {
        base_url: format!("http://{addr}"),
        ..ClientConfig::default()
    };
    let api = HttpNotificationApi::new(&client_config, Some(token.clone())).unwrap();
    let cache = Arc::new(ReconciliationCache::new(Arc::new(api), &client_config));
    cache.set_user(user.id);

    let stop = CancellationToken::new();
    let listener = RealtimeListener::new(format!("ws://{addr}/ws"), user.id, Some(token), cache.clone());
    let run = {
        let stop = stop.clone();
        tokio::spawn(async move { listener.run(stop).await })
    };

    // The listener's catch-up fetch marks the cache loaded.
    eventually("initial fetch", || cache.snapshot().loaded).await;
    assert_eq!(state.realtime.registry.connection_count(), 1);

    let ctx = RequestContext::new(Principal::System, "scheduler");
    let receipt = state
        .pipeline
        .create(
            Some(&ctx),
            NewNotification {
                target_user_id: Some(user.id),
                category: Some("reminder".into()),
                title: Some("Plan starts soon".into()),
                body: Some("Hiking trip in 1 hour".into()),
                link: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(receipt.delivery.unwrap().delivered, 1);
    let created = receipt.outcome.notification().unwrap().clone();

    eventually("push in cache", || cache.snapshot().items.len() == 1).await;
    let snap = cache.snapshot();
    assert_eq!(snap.items[0].id, created.id);
    assert_eq!(snap.unread_count, 1);
    assert_eq!(cache.apply_push(created.clone()), PushDisposition::Duplicate);

    cache.mark_as_read(created.id).await.unwrap();
    assert_eq!(cache.unread_count(), 0);
    assert_eq!(
        state.notification_service.unread_count(user.id).await.unwrap(),
        0
    );

    stop.cancel();
    run.await.unwrap().unwrap();
    eventually("connection cleanup", || {
        state.realtime.registry.connection_count() == 0
    })
    .await;
}

#[tokio::test]
async fn test_refresh_keeps_newest_when_history_exceeds_page_size() {
    let config = AppConfig::default();
    let state = AppState::new(config.clone(), Repositories::in_memory());
    let app = build_app(state.clone(), &config.server.cors);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let user = User::new("noor", UserRole::Member);
    state.repositories.users.insert(&user).await.unwrap();
    let (token, _) = JwtEncoder::new(&config.auth)
        .issue(user.id, TokenRole::Member, "noor")
        .unwrap();

    let ctx = RequestContext::new(Principal::System, "scheduler");
    let create = |title: &str| NewNotification {
        target_user_id: Some(user.id),
        category: Some("message".into()),
        title: Some(title.into()),
        body: Some("Who is bringing snacks?".into()),
        link: None,
    };
    for i in 0..3 {
        state.pipeline.create(Some(&ctx), create(&format!("old{i}"))).await.unwrap();
    }

    let client_config = ClientConfig {
        base_url: format!("http://{addr}"),
        page_size: 2,
        ..ClientConfig::default()
    };
    let api = HttpNotificationApi::new(&client_config, Some(token)).unwrap();
    let cache = ReconciliationCache::new(Arc::new(api), &client_config);
    cache.set_user(user.id);

    assert_eq!(cache.fetch().await.unwrap(), FetchOutcome::Fetched);
    let titles = |cache: &ReconciliationCache| -> Vec<String> {
        cache.snapshot().items.into_iter().map(|n| n.title).collect()
    };
    assert_eq!(titles(&cache), vec!["old1", "old2"]);

    let receipt = state.pipeline.create(Some(&ctx), create("newest")).await.unwrap();
    let newest = receipt.outcome.notification().unwrap().clone();
    assert_eq!(cache.apply_push(newest), PushDisposition::Merged);

    assert_eq!(cache.request_refresh().await.unwrap(), FetchOutcome::Fetched);
    let snap = cache.snapshot();
    assert_eq!(titles(&cache), vec!["old2", "newest"]);
    assert_eq!(snap.total_count, 4);
    assert_eq!(snap.unread_count, 4);
}
