//! Session-observation behavior through the public API.


use classgate_core::access::{GuardOutcome, IdentityProvider, Role, SessionObserver};

use common::{seeded, view};

#[tokio::test]
async fn test_handle_reads_without_enforcing_redirects() {
    let fx = seeded();
    let handle = fx.observer.handle();

    // A navigation bar branches on this without triggering navigation.
    assert!(handle.session().is_none());
    assert!(!handle.is_resolving());

    fx.sign_in("thandi@school.example").await;
    let snapshot = handle.snapshot();
    assert_eq!(
        snapshot.session.unwrap().get_email(),
        "thandi@school.example"
    );
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_token_refresh_updates_observers_in_place() {
    let fx = seeded();
    fx.sign_in("lindiwe@school.example").await;
    let handle = fx.observer.handle();
    assert!(!handle.session().unwrap().is_email_verified());

    let uid = fx.provider.uid_for("lindiwe@school.example").unwrap();
    fx.provider.mark_email_verified(&uid).await.unwrap();

    let session = handle.session().unwrap();
    assert!(session.is_email_verified());
    assert_eq!(session.get_uid(), uid);
}

#[tokio::test]
async fn test_detached_observer_stops_following_the_provider() {
    let fx = seeded();
    let second = SessionObserver::attach(fx.provider.as_ref());
    let handle = second.handle();
    drop(second);

    fx.sign_in("thandi@school.example").await;

    // The primary observer follows; the dropped one is frozen.
    assert!(fx.observer.session().is_some());
    assert!(handle.session().is_none());
}

#[tokio::test]
async fn test_guard_decision_follows_session_changes() {
    let fx = seeded();
    let guard = fx.guard();

    assert!(matches!(
        guard.guard(Some(Role::Admin), view("admin")).await,
        GuardOutcome::Redirect(_)
    ));

    fx.sign_in("thandi@school.example").await;
    assert!(guard.guard(Some(Role::Admin), view("admin")).await.is_render());

    fx.provider.sign_out().await.unwrap();
    assert!(matches!(
        guard.guard(Some(Role::Admin), view("admin")).await,
        GuardOutcome::Redirect(_)
    ));
}
