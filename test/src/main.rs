//! Classgate demo walkthrough.
//!
//! Seeds the in-memory identity provider and profile store, then walks
//! the access guard through the situations it exists for: signed out,
//! signed in with the right role, signed in with a pending account.

use std::sync::Arc;

use classgate_core::access::{
    AccessGuard, AccountService, ActivationStatus, AuditLogger, GuardOutcome,
    IdentityProvider, InMemoryIdentityProvider, InMemoryProfileStore, Profile, ProfileManager,
    ProfileStore, Role, RoleResolver, SessionObserver, StdoutHandler,
};
use futures_util::future::LocalBoxFuture;

fn page(name: &'static str) -> impl FnOnce() -> LocalBoxFuture<'static, &'static str> {
    move || Box::pin(async move { name })
}

fn describe<V: std::fmt::Display>(label: &str, outcome: &GuardOutcome<V>) {
    match outcome {
        GuardOutcome::Loading => println!("{}: loading...", label),
        GuardOutcome::Render(view) => println!("{}: rendered {}", label, view),
        GuardOutcome::Redirect(redirect) => println!(
            "{}: redirect to {} ({})",
            label,
            redirect.target(),
            redirect.message().as_user_text()
        ),
        GuardOutcome::Unavailable(error) => println!("{}: {}", label, error),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new()
            .with_account("thandi@school.example", "admin-pass", true)
            .with_account("pieter@school.example", "parent-pass", false),
    );

    let thandi = provider.uid_for("thandi@school.example").unwrap();
    let pieter = provider.uid_for("pieter@school.example").unwrap();

    let mut admin = Profile::new(&thandi, "thandi@school.example", Role::Admin)
        .display_name("Thandi Dlamini");
    admin.set_status(ActivationStatus::Active);
    let parent = Profile::new(&pieter, "pieter@school.example", Role::Parent)
        .display_name("Pieter van Wyk");

    let store = Arc::new(
        InMemoryProfileStore::new()
            .with_profile(admin)
            .with_profile(parent),
    );

    let observer = SessionObserver::attach(provider.as_ref());
    let guard = AccessGuard::new(
        observer.handle(),
        RoleResolver::new(Arc::clone(&store) as Arc<dyn ProfileStore>),
    );
    let accounts = AccountService::new(
        Arc::clone(&provider) as Arc<dyn IdentityProvider>,
        Arc::clone(&store) as Arc<dyn ProfileManager>,
    )
    .audit(AuditLogger::new().with_handler(StdoutHandler));

    let outcome = guard.guard(Some(Role::Admin), page("admin dashboard")).await;
    describe("signed out", &outcome);

    accounts
        .sign_in("thandi@school.example", "admin-pass")
        .await
        .unwrap();
    let outcome = guard.guard(Some(Role::Admin), page("admin dashboard")).await;
    describe("thandi (active admin)", &outcome);

    accounts.sign_out().await.unwrap();
    accounts
        .sign_in("pieter@school.example", "parent-pass")
        .await
        .unwrap();
    let outcome = guard.guard(Some(Role::Parent), page("parent dashboard")).await;
    describe("pieter (unverified parent)", &outcome);

    accounts.sign_out().await.unwrap();
}
