/// End-to-end session behaviour: login, restore, logout and route gating
/// across the three portals.
use chrono::Utc;
use proptest::prelude::*;

use portal::credentials::AccountDirectory;
use portal::routing::{RouteDecision, RouteTable, authorize_route, menu_for_role, role_home};
use portal::session::{
    FileTokenStore, Gate, MemoryTokenStore, SessionAuthority, SessionStatus, TokenCodec,
    TokenStore,
};
use shared::types::{Identity, LoginData, ProfileAttributes, Role};

const SECRET: &str = "integration-test-secret-0123456789abcdef";

fn identity(id: i64, role: Role) -> Identity {
    Identity {
        id,
        name: format!("{} user", role),
        email: format!("{}@example.com", role),
        role,
        profile: ProfileAttributes::default(),
    }
}

async fn seeded_directory() -> AccountDirectory {
    let directory = AccountDirectory::new();
    for (id, role, password) in [
        (1, Role::Admin, "admin123"),
        (2, Role::Doctor, "doctor123"),
        (3, Role::Patient, "patient123"),
    ] {
        directory
            .add_account(identity(id, role), password)
            .await
            .unwrap();
    }
    directory
}

fn codec() -> TokenCodec {
    TokenCodec::new(SECRET, 3600, true)
}

fn login(role: Role, password: &str) -> LoginData {
    LoginData {
        email: format!("{}@example.com", role),
        password: password.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn each_role_lands_on_its_home_and_sees_its_menu() {
    for (role, password) in [
        (Role::Admin, "admin123"),
        (Role::Doctor, "doctor123"),
        (Role::Patient, "patient123"),
    ] {
        let auth = SessionAuthority::new(MemoryTokenStore::new(), seeded_directory().await, codec());
        auth.initialize().await;

        let ok = auth.login(&login(role, password)).await.unwrap();
        assert_eq!(ok.redirect, role_home(role));
        assert_eq!(auth.view().menu().await, menu_for_role(role));

        let table = RouteTable::portal_routes();
        assert_eq!(
            auth.view().check(&table, role_home(role)).await,
            Gate::Ready(RouteDecision::Allow)
        );
    }
}

#[tokio::test]
async fn login_is_case_insensitive_on_email() {
    let auth = SessionAuthority::new(MemoryTokenStore::new(), seeded_directory().await, codec());
    auth.initialize().await;
    let data = LoginData {
        email: "  Doctor@Example.com ".into(),
        password: "doctor123".into(),
    };
    let ok = auth.login(&data).await.unwrap();
    assert_eq!(ok.identity.role, Role::Doctor);
}

#[tokio::test]
async fn logout_then_any_protected_route_redirects_to_sign_in() {
    let auth = SessionAuthority::new(MemoryTokenStore::new(), seeded_directory().await, codec());
    auth.initialize().await;
    auth.login(&login(Role::Admin, "admin123")).await.unwrap();
    auth.logout().await;

    let table = RouteTable::portal_routes();
    let view = auth.view();
    for rule in table.rules() {
        let path = rule.path.replace(":id", "42");
        assert_eq!(
            view.check(&table, &path).await,
            Gate::Ready(RouteDecision::RedirectToSignIn),
            "{}",
            path
        );
    }
    assert_eq!(view.status().await, SessionStatus::Anonymous);
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_token_survives_a_new_authority() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session").join("token");

    let first = SessionAuthority::new(FileTokenStore::new(&path), seeded_directory().await, codec());
    first.initialize().await;
    first.login(&login(Role::Patient, "patient123")).await.unwrap();
    drop(first);

    let second =
        SessionAuthority::new(FileTokenStore::new(&path), AccountDirectory::new(), codec());
    match second.initialize().await {
        SessionStatus::Authenticated(identity) => {
            assert_eq!(identity.id, 3);
            assert_eq!(identity.role, Role::Patient);
        }
        other => panic!("expected a restored session, got {:?}", other),
    }
}

#[tokio::test]
async fn expired_token_restores_to_anonymous() {
    let issued = Utc::now().timestamp() - 10 * 3600;
    let minted = codec().mint_at(&identity(3, Role::Patient), issued).unwrap();
    let store = MemoryTokenStore::with_token(minted.token);

    let auth = SessionAuthority::new(store.clone(), seeded_directory().await, codec());
    assert_eq!(auth.initialize().await, SessionStatus::Anonymous);
    assert_eq!(store.read().await.unwrap(), None);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected_when_verifying() {
    let foreign = TokenCodec::new("another-secret-another-secret-0000", 3600, true);
    let minted = foreign.mint(&identity(1, Role::Admin)).unwrap();

    let auth = SessionAuthority::new(
        MemoryTokenStore::with_token(minted.token),
        seeded_directory().await,
        codec(),
    );
    assert_eq!(auth.initialize().await, SessionStatus::Anonymous);
}

// ---------------------------------------------------------------------------
// Authorization properties
// ---------------------------------------------------------------------------

fn any_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::Doctor), Just(Role::Patient)]
}

fn any_roles() -> impl Strategy<Value = Vec<Role>> {
    proptest::sample::subsequence(Role::ALL.to_vec(), 0..=3)
}

proptest! {
    #[test]
    fn excluded_role_is_sent_home(role in any_role(), required in any_roles()) {
        prop_assume!(!required.is_empty() && !required.contains(&role));
        let decision = authorize_route(&required, Some(&identity(7, role)));
        prop_assert_eq!(decision, RouteDecision::RedirectToRoleHome(role));
    }

    #[test]
    fn no_identity_always_signs_in(required in any_roles()) {
        prop_assert_eq!(authorize_route(&required, None), RouteDecision::RedirectToSignIn);
    }

    #[test]
    fn empty_requirement_allows_everyone(role in any_role()) {
        prop_assert_eq!(authorize_route(&[], Some(&identity(7, role))), RouteDecision::Allow);
    }

    #[test]
    fn garbage_tokens_never_restore(token in "[A-Za-z0-9._-]{0,64}") {
        let status = tokio_test::block_on(async {
            let auth = SessionAuthority::new(
                MemoryTokenStore::with_token(token),
                AccountDirectory::new(),
                codec(),
            );
            auth.initialize().await
        });
        prop_assert_eq!(status, SessionStatus::Anonymous);
    }
}

#[test]
fn every_menu_entry_is_reachable_by_its_role_only() {
    let table = RouteTable::portal_routes();
    for role in Role::ALL {
        let me = identity(1, role);
        for entry in menu_for_role(role) {
            assert_eq!(table.authorize(entry.path, Some(&me)), RouteDecision::Allow);
            for other in Role::ALL.into_iter().filter(|r| *r != role) {
                assert_eq!(
                    table.authorize(entry.path, Some(&identity(2, other))),
                    RouteDecision::RedirectToRoleHome(other)
                );
            }
        }
    }
}
