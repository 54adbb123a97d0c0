//! Administrative management against live guard evaluations: because
//! roles are resolved fresh on every check, an administrative change is
//! visible to the very next evaluation.


use classgate_core::access::{
    AccessDecision, ActivationStatus, AdminError, DenialMessage, IdentityProvider, NewUserRequest,
    Role,
};

use common::{seeded, view, PASSWORD};

#[tokio::test]
async fn test_role_change_takes_effect_on_next_evaluation() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;

    // Activate the educator first so only the role gate is in play.
    let uid = fx.provider.uid_for("lindiwe@school.example").unwrap();
    admin
        .set_status(&actor, &uid, ActivationStatus::Active)
        .await
        .unwrap();
    fx.provider.mark_email_verified(&uid).await.unwrap();
    fx.sign_in("lindiwe@school.example").await;

    let guard = fx.guard();
    assert!(guard
        .guard(Some(Role::Educator), view("educator view"))
        .await
        .is_render());

    // Promotion to admin: the educator view is no longer hers, the admin
    // view is, with no sign-out in between.
    admin.set_role(&actor, &uid, Role::Admin).await.unwrap();

    let outcome = guard.guard(Some(Role::Educator), view("educator view")).await;
    assert_eq!(
        outcome.as_redirect().unwrap().decision(),
        AccessDecision::DenyWrongRole
    );
    assert!(guard
        .guard(Some(Role::Admin), view("admin view"))
        .await
        .is_render());
}

#[tokio::test]
async fn test_learner_exemption_covers_every_status() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;

    let uid = fx.provider.uid_for("naledi@school.example").unwrap();
    fx.sign_in("naledi@school.example").await;

    let guard = fx.guard();
    assert!(guard
        .guard(Some(Role::Learner), view("learner view"))
        .await
        .is_render());

    // Learners are exempt from activation gating altogether; locking one
    // out takes deletion, not a status change.
    admin
        .set_status(&actor, &uid, ActivationStatus::Suspended)
        .await
        .unwrap();

    let outcome = guard.guard(Some(Role::Learner), view("learner view")).await;
    assert!(outcome.is_render());
}

#[tokio::test]
async fn test_suspended_parent_is_denied() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;

    let uid = fx.provider.uid_for("pieter@school.example").unwrap();
    admin
        .set_status(&actor, &uid, ActivationStatus::Suspended)
        .await
        .unwrap();
    fx.sign_in("pieter@school.example").await;

    let outcome = fx
        .guard()
        .guard(Some(Role::Parent), view("parent view"))
        .await;
    let redirect = outcome.as_redirect().unwrap();
    assert_eq!(redirect.decision(), AccessDecision::DenyWrongRole);
    assert_eq!(redirect.message(), DenialMessage::AccountNotActive);
}

#[tokio::test]
async fn test_only_administrative_actors_may_mutate() {
    let fx = seeded();
    let admin = fx.admin();
    let parent = fx.profile_of("pieter@school.example").await;
    let target = fx.provider.uid_for("naledi@school.example").unwrap();

    assert!(matches!(
        admin
            .set_role(&parent, &target, Role::Educator)
            .await
            .unwrap_err(),
        AdminError::NotAuthorized
    ));
    assert!(matches!(
        admin.delete_user(&parent, &target).await.unwrap_err(),
        AdminError::NotAuthorized
    ));
    assert!(matches!(
        admin.list_users(&parent).await.unwrap_err(),
        AdminError::NotAuthorized
    ));
}

#[tokio::test]
async fn test_actor_cannot_change_own_role() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;

    let err = admin
        .set_role(&actor, actor.get_uid(), Role::Principal)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::SelfRoleChange));

    // The declared role is untouched.
    let after = fx.profile_of("thandi@school.example").await;
    assert_eq!(after.get_role(), Role::Admin);
}

#[tokio::test]
async fn test_admin_created_user_can_reset_and_sign_in() {
    let fx = seeded();
    let admin = fx.admin();
    let accounts = fx.accounts();
    let actor = fx.profile_of("thandi@school.example").await;

    let created = admin
        .create_user(
            &actor,
            NewUserRequest {
                email: "zinhle@school.example".to_string(),
                password: "temporary".to_string(),
                display_name: "Zinhle Mthembu".to_string(),
                role: Role::Educator,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.get_status(), ActivationStatus::Pending);
    // Creating a user does not leave its session behind.
    assert!(fx.provider.current_session().is_none());

    accounts
        .request_password_reset("zinhle@school.example")
        .await
        .unwrap();
    accounts.sign_in("zinhle@school.example", "temporary").await.unwrap();
}

#[tokio::test]
async fn test_deleted_user_loses_access_on_next_evaluation() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;

    let uid = fx.provider.uid_for("naledi@school.example").unwrap();
    fx.sign_in("naledi@school.example").await;

    let guard = fx.guard();
    assert!(guard
        .guard(Some(Role::Learner), view("learner view"))
        .await
        .is_render());

    admin.delete_user(&actor, &uid).await.unwrap();

    let outcome = guard.guard(Some(Role::Learner), view("learner view")).await;
    assert_eq!(
        outcome.as_redirect().unwrap().decision(),
        AccessDecision::DenyWrongRole
    );
}

#[tokio::test]
async fn test_list_users_sees_every_profile() {
    let fx = seeded();
    let admin = fx.admin();
    let actor = fx.profile_of("thandi@school.example").await;

    let all = admin.list_users(&actor).await.unwrap();
    assert_eq!(all.len(), 4);
}
