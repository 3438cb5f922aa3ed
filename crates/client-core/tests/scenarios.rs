mod common;

use client_core::{
    global, install, Capabilities, ClientCore, ClientError, ClientEvent, CoreOptions,
    FavouriteTarget, ReconcileError, SessionError, SessionState,
};
use client_config_and_utils::{Config, Paths};
use common::{core_with, user_for, FakeBackend, PASSWORD};
use remote_capabilities::{CounterAction, EventKind};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn wrong_password_keeps_user_signed_out() {
    let core = core_with(Arc::new(FakeBackend::new()));
    let view = core.view();

    let result = core.sign_in("a@b.com", "wrong").await;
    assert!(matches!(result, Err(SessionError::InvalidCredentials(_))));
    assert_eq!(view.session_state(), SessionState::Unauthenticated);
    assert!(view.current_user().is_none());
    assert!(view.last_error().is_some_and(|e| !e.is_empty()));

    core.clear_error();
    assert!(view.last_error().is_none());
    assert_eq!(view.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn sign_in_then_sign_out() {
    let backend = Arc::new(FakeBackend::new());
    let core = core_with(backend.clone());
    let view = core.view();

    core.sign_in("a@b.com", PASSWORD).await.unwrap();
    assert!(view.is_authenticated());
    assert_eq!(view.current_user(), Some(user_for("a@b.com")));

    core.sign_out().await.unwrap();
    assert!(!view.is_authenticated());
    assert!(view.current_user().is_none());
    assert!(!backend.has_remote_session());
}

#[tokio::test]
async fn failed_sign_out_keeps_session() {
    let backend = Arc::new(FakeBackend::new());
    let core = core_with(backend.clone());
    core.sign_in("a@b.com", PASSWORD).await.unwrap();
    backend.fail_sign_out.store(true, Ordering::SeqCst);

    let result = core.sign_out().await;
    assert!(matches!(result, Err(SessionError::SignOutFailed(_))));

    let snapshot = core.view().session_snapshot();
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(snapshot.user, Some(user_for("a@b.com")));
    assert!(snapshot.last_error.is_some());
    assert!(backend.has_remote_session());
}

#[tokio::test]
async fn check_session_restores_previous_login() {
    let core = core_with(Arc::new(FakeBackend::with_existing_session("a@b.com")));

    assert!(core.check_session().await.unwrap());
    assert!(core.view().is_authenticated());
    // Idempotent once authenticated.
    assert!(core.check_session().await.unwrap());
}

#[tokio::test]
async fn sign_up_passes_metadata_through() {
    let core = core_with(Arc::new(FakeBackend::new()));

    let user = core
        .sign_up("new@b.com", "pw", serde_json::json!({ "nickname": "ala" }))
        .await
        .unwrap();
    assert_eq!(user.metadata["nickname"], "ala");
    assert_eq!(core.view().current_user(), Some(user));
}

#[tokio::test]
async fn failed_toggle_rolls_back_to_exact_prior_state() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail_counter.store(true, Ordering::SeqCst);
    backend.hold_counter.store(true, Ordering::SeqCst);
    let core = Arc::new(core_with(backend.clone()));
    let view = core.view();
    let c1 = FavouriteTarget::new("c1", 5);

    let toggle = tokio::spawn({
        let core = core.clone();
        let c1 = c1.clone();
        async move { core.toggle_favourite(&c1).await }
    });
    backend.counter_started.notified().await;

    assert!(view.is_favourited("c1"));
    assert_eq!(view.favourite_count_of("c1", 5), 6);
    assert!(view.is_mutation_pending("c1"));

    // A second toggle while pending is refused and changes nothing.
    assert_eq!(
        core.toggle_favourite(&c1).await,
        Err(ReconcileError::MutationInProgress("c1".into()))
    );
    assert_eq!(view.favourite_count_of("c1", 5), 6);

    backend.counter_release.notify_one();
    assert!(matches!(
        toggle.await.unwrap(),
        Err(ReconcileError::RolledBack { .. })
    ));

    assert!(!view.is_favourited("c1"));
    assert_eq!(view.favourite_count_of("c1", 5), 5);
    assert!(!view.is_mutation_pending("c1"));
    assert_eq!(backend.counter_calls.lock().len(), 1);
}

#[tokio::test]
async fn toggle_failure_does_not_touch_session_or_other_entities() {
    let backend = Arc::new(FakeBackend::new());
    let core = core_with(backend.clone());
    core.sign_in("a@b.com", PASSWORD).await.unwrap();

    core.toggle_favourite(&FavouriteTarget::new("c2", 1))
        .await
        .unwrap();
    backend.fail_counter.store(true, Ordering::SeqCst);
    let _ = core.toggle_favourite(&FavouriteTarget::new("c1", 5)).await;

    let view = core.view();
    assert!(view.is_authenticated());
    assert!(view.is_favourited("c2"));
    assert_eq!(view.favourite_count_of("c2", 1), 2);
    assert_eq!(view.favourites(), vec!["c2".to_string()]);
}

#[tokio::test]
async fn counter_actions_and_telemetry_follow_toggles() {
    let backend = Arc::new(FakeBackend::new());
    let core = core_with(backend.clone());
    let c1 = FavouriteTarget::new("c1", 3);

    core.record_click("c1");
    core.toggle_favourite(&c1).await.unwrap();
    core.toggle_favourite(&c1).await.unwrap();

    assert_eq!(
        *backend.counter_calls.lock(),
        vec![
            ("c1".to_string(), CounterAction::Increment),
            ("c1".to_string(), CounterAction::Decrement),
        ]
    );
    assert_eq!(
        *backend.events.lock(),
        vec![
            ("c1".to_string(), EventKind::Click),
            ("c1".to_string(), EventKind::AddToFavourite),
            ("c1".to_string(), EventKind::RemoveFromFavourite),
        ]
    );
    assert_eq!(core.view().favourite_count_of("c1", 3), 3);
}

#[tokio::test]
async fn remote_refresh_retires_override() {
    let core = core_with(Arc::new(FakeBackend::new()));
    core.toggle_favourite(&FavouriteTarget::new("c1", 5))
        .await
        .unwrap();

    core.apply_remote_count("c1", 11);
    let entity = core.view().favourite_entity("c1").unwrap();
    assert_eq!(entity.remote_count, 11);
    assert_eq!(entity.local_override, None);
    assert!(entity.is_favourited);
}

#[tokio::test]
async fn events_are_published_for_session_and_favourites() {
    let core = core_with(Arc::new(FakeBackend::new()));
    let mut events = core.subscribe();

    core.sign_in("a@b.com", PASSWORD).await.unwrap();
    core.toggle_favourite(&FavouriteTarget::new("c1", 0))
        .await
        .unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    let session_states: Vec<_> = received
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Session(change) => Some(change.state),
            ClientEvent::Favourite(_) => None,
        })
        .collect();
    assert_eq!(
        session_states,
        vec![SessionState::Authenticating, SessionState::Authenticated]
    );

    let favourite_pending: Vec<_> = received
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Favourite(change) => Some(change.pending),
            ClientEvent::Session(_) => None,
        })
        .collect();
    assert_eq!(favourite_pending, vec![true, false]);
}

#[tokio::test]
async fn favourites_survive_restart() {
    let dir = tempdir().unwrap();
    let paths = Paths::with_base_dir(dir.path().to_path_buf());
    let config = Config {
        min_feedback_delay_ms: 0,
        ..Config::default()
    };

    {
        let core = ClientCore::from_config(
            &config,
            &paths,
            Capabilities::from_backend(Arc::new(FakeBackend::new())),
        )
        .unwrap();
        core.toggle_favourite(&FavouriteTarget::new("c7", 0))
            .await
            .unwrap();
        core.toggle_favourite(&FavouriteTarget::new("c3", 0))
            .await
            .unwrap();
    }

    let restarted = ClientCore::from_config(
        &config,
        &paths,
        Capabilities::from_backend(Arc::new(FakeBackend::new())),
    )
    .unwrap();
    assert_eq!(
        restarted.view().favourites(),
        vec!["c3".to_string(), "c7".to_string()]
    );
    assert!(paths.store_file().exists());
}

#[test]
fn process_wide_handle_installs_once() {
    let options = CoreOptions::default();
    let make = || {
        ClientCore::new(
            Capabilities::from_backend(Arc::new(FakeBackend::new())),
            client_storage::FavouriteSetStore::new(Box::new(client_storage::MemoryStorage::new())),
            options.clone(),
        )
    };

    assert!(global().is_none());
    let installed = install(make()).unwrap();
    assert!(Arc::ptr_eq(&installed, &global().unwrap()));

    assert!(matches!(install(make()), Err(ClientError::AlreadyInstalled)));
}
