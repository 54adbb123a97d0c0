//! End-to-end account lifecycle: sign-up through verification to an
//! authorized guard evaluation.


use classgate_core::access::{
    AccessDecision, AccessError, ActivationStatus, DenialMessage, EmailKind, GuardOutcome,
    IdentityProvider, Role, RetryConfig, SignUpRequest,
};

use common::{seeded, view, PASSWORD};

fn signup(email: &str, name: &str, role: Role) -> SignUpRequest {
    SignUpRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        display_name: name.to_string(),
        role,
    }
}

#[tokio::test]
async fn test_new_educator_is_denied_until_verified() {
    let fx = seeded();
    let accounts = fx.accounts();
    let guard = fx.guard();

    let profile = accounts
        .sign_up(signup("zanele@school.example", "Zanele Khumalo", Role::Educator))
        .await
        .unwrap();
    assert_eq!(profile.get_status(), ActivationStatus::Pending);

    // Fresh accounts start signed out; the sign-up confirmation email is
    // on its way.
    assert!(fx.provider.current_session().is_none());
    assert_eq!(
        fx.provider.sent_emails().last().unwrap().kind,
        EmailKind::Verification
    );

    // Signing in before verifying the email is denied with the verify
    // prompt, not a role denial.
    accounts.sign_in("zanele@school.example", PASSWORD).await.unwrap();
    let outcome = guard.guard(Some(Role::Educator), view("educator view")).await;
    assert_eq!(
        outcome.as_redirect().unwrap().message(),
        DenialMessage::VerifyEmail
    );

    // The verification link lands; the profile activates and the session
    // refreshes in place.
    accounts
        .complete_email_verification(profile.get_uid())
        .await
        .unwrap();

    let outcome = guard.guard(Some(Role::Educator), view("educator view")).await;
    assert!(outcome.is_render());
}

#[tokio::test]
async fn test_new_learner_is_authorized_immediately() {
    let fx = seeded();
    let accounts = fx.accounts();

    accounts
        .sign_up(signup("karabo@school.example", "Karabo Molefe", Role::Learner))
        .await
        .unwrap();
    assert!(fx.provider.sent_emails().is_empty());

    accounts.sign_in("karabo@school.example", PASSWORD).await.unwrap();
    let outcome = fx
        .guard()
        .guard(Some(Role::Learner), view("learner view"))
        .await;
    assert!(outcome.is_render());
}

#[tokio::test]
async fn test_resend_verification_covers_the_denial_prompt() {
    let fx = seeded();
    let accounts = fx.accounts();

    fx.sign_in("lindiwe@school.example").await;
    let before = fx.provider.sent_emails().len();

    accounts.resend_verification().await.unwrap();
    let sent = fx.provider.sent_emails();
    assert_eq!(sent.len(), before + 1);
    assert_eq!(sent.last().unwrap().email, "lindiwe@school.example");
}

#[tokio::test]
async fn test_outage_degrades_to_unavailable_not_denial() {
    let fx = seeded();
    fx.sign_in("thandi@school.example").await;
    fx.store.set_unavailable(true);

    let guard = fx.guard().retry(
        RetryConfig::new()
            .max_attempts(2)
            .initial_backoff(std::time::Duration::from_millis(1))
            .jitter(false),
    );
    let outcome = guard.guard(Some(Role::Admin), view("admin view")).await;

    match &outcome {
        GuardOutcome::Unavailable(error) => {
            assert_eq!(*error, AccessError::TransientLookupFailure)
        }
        other => panic!("expected unavailable, got {:?}", other),
    }
    assert_eq!(outcome.decision(), None);

    // The store comes back; the next evaluation succeeds without any
    // sign-in round trip.
    fx.store.set_unavailable(false);
    let outcome = guard.guard(Some(Role::Admin), view("admin view")).await;
    assert!(outcome.is_render());
}

#[tokio::test]
async fn test_transient_blip_is_absorbed_by_retries() {
    let fx = seeded();
    fx.sign_in("thandi@school.example").await;

    // First attempt fails, the store recovers before the retry.
    fx.store.set_unavailable(true);
    let guard = fx.guard().retry(
        RetryConfig::new()
            .max_attempts(3)
            .initial_backoff(std::time::Duration::from_millis(20))
            .jitter(false),
    );

    let (outcome, _) = tokio::join!(guard.guard(Some(Role::Admin), view("admin view")), async {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        fx.store.set_unavailable(false);
    });

    assert!(outcome.is_render());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let fx = seeded();
    let accounts = fx.accounts();

    accounts
        .request_password_reset("pieter@school.example")
        .await
        .unwrap();
    assert_eq!(
        fx.provider.sent_emails().last().unwrap().kind,
        EmailKind::PasswordReset
    );
}

#[tokio::test]
async fn test_lazy_promotion_unlocks_the_parent_dashboard() {
    let fx = seeded();
    let accounts = fx.accounts();

    // Pieter verified his email out of band while his profile was still
    // pending. His next sign-in promotes the profile.
    let uid = fx.provider.uid_for("pieter@school.example").unwrap();
    fx.provider.mark_email_verified(&uid).await.unwrap();
    accounts.sign_in("pieter@school.example", PASSWORD).await.unwrap();

    let outcome = fx
        .guard()
        .guard(Some(Role::Parent), view("parent view"))
        .await;
    assert!(outcome.is_render());

    let profile = fx.profile_of("pieter@school.example").await;
    assert_eq!(profile.get_status(), ActivationStatus::Active);
}

#[tokio::test]
async fn test_denial_kinds_are_distinguished() {
    let fx = seeded();
    let guard = fx.guard();

    assert_eq!(
        guard.guard(None, view("x")).await.decision(),
        Some(AccessDecision::DenyUnauthenticated)
    );

    fx.sign_in("sipho@school.example").await;
    assert_eq!(
        guard.guard(Some(Role::Educator), view("x")).await.decision(),
        Some(AccessDecision::DenyWrongRole)
    );
}
