//! Audit-trail coverage across whole flows.


use classgate_core::access::{
    AccessEventSeverity, AccessEventType, ActivationStatus, Role, SignUpRequest,
};

use common::{seeded, PASSWORD};

#[tokio::test]
async fn test_sign_up_flow_is_fully_audited() {
    let fx = seeded();
    let accounts = fx.accounts();

    let profile = accounts
        .sign_up(SignUpRequest {
            email: "zanele@school.example".to_string(),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
            display_name: "Zanele Khumalo".to_string(),
            role: Role::Educator,
        })
        .await
        .unwrap();

    let kinds: Vec<AccessEventType> = fx
        .events
        .events()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            AccessEventType::ProfileCreated,
            AccessEventType::VerificationEmailSent,
            AccessEventType::SignUpCompleted,
        ]
    );

    let for_user = fx.events.events_for_uid(profile.get_uid());
    assert_eq!(for_user.len(), 3);
}

#[tokio::test]
async fn test_session_lifecycle_events() {
    let fx = seeded();
    let accounts = fx.accounts();

    let _ = accounts.sign_in("thandi@school.example", "wrong").await;
    accounts
        .sign_in("thandi@school.example", PASSWORD)
        .await
        .unwrap();
    accounts.sign_out().await.unwrap();

    let events = fx.events.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event_type, AccessEventType::SignInFailure);
    assert_eq!(events[0].severity, AccessEventSeverity::Warning);
    assert_eq!(events[1].event_type, AccessEventType::SignInSuccess);
    assert_eq!(events[2].event_type, AccessEventType::SignOut);
}

#[tokio::test]
async fn test_administrative_mutations_record_the_actor() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;
    let target = fx.provider.uid_for("lindiwe@school.example").unwrap();

    admin
        .set_role(&actor, &target, Role::Admin)
        .await
        .unwrap();
    admin
        .set_status(&actor, &target, ActivationStatus::Active)
        .await
        .unwrap();
    admin.delete_user(&actor, &target).await.unwrap();

    let events = fx.events.events();
    assert_eq!(events.len(), 3);
    for event in &events {
        assert_eq!(event.detail["actor"], actor.get_uid());
        assert_eq!(event.uid.as_deref(), Some(target.as_str()));
    }
    assert_eq!(events[0].event_type, AccessEventType::RoleChanged);
    assert_eq!(events[2].event_type, AccessEventType::ProfileDeleted);
}

#[tokio::test]
async fn test_verification_flow_events() {
    let fx = seeded();
    let accounts = fx.accounts();
    let uid = fx.provider.uid_for("pieter@school.example").unwrap();

    accounts.complete_email_verification(&uid).await.unwrap();

    let verified = fx.events.events_of_type(&AccessEventType::EmailVerified);
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].uid.as_deref(), Some(uid.as_str()));
}
