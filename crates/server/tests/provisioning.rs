//! Database integration tests for invitations and provisioning.
//!
//! These tests require a running `PostgreSQL` database with migrations
//! applied (`cargo run -p tablecraft-cli -- migrate`) and `DATABASE_URL`
//! set. They are `#[ignore]`d so the default test run stays hermetic:
//!
//! ```bash
//! cargo test -p tablecraft-server -- --ignored
//! ```

use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use tablecraft_core::{Role, TelegramId, Username};
use tablecraft_server::config::AdminBootstrapConfig;
use tablecraft_server::db::{
    self, InvitationRepository, NewRestaurant, PendingRegistration, RestaurantRepository,
    UserRepository,
};
use tablecraft_server::services::provisioning::{self, AdminBootstrap, RegistrationRequest};
use tablecraft_server::services::{auth, invites};

const BOT: &str = "tablecraft_test_bot";

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to the test database")
}

/// A username that is unique per test run.
fn unique_username(prefix: &str) -> Username {
    let tag = Uuid::new_v4().simple().to_string();
    Username::parse(&format!("{prefix}_{}", &tag[..10])).expect("generated username is valid")
}

async fn create_user(pool: &PgPool, role: Role) -> tablecraft_server::db::User {
    let username = unique_username(match role {
        Role::Admin => "adm",
        Role::Manager => "mgr",
        Role::Waiter => "wtr",
    });
    let hash = auth::hash_password("secret1").expect("hashing succeeds");
    UserRepository::new(pool)
        .create(&username, &hash, role, None, None)
        .await
        .expect("user insert succeeds")
}

fn code_from_link(link: &str) -> &str {
    link.split("start=invite_")
        .nth(1)
        .expect("deep link carries an invite payload")
}

#[tokio::test]
#[ignore = "needs a running Postgres with migrations applied"]
async fn waiter_link_get_or_create_is_idempotent() {
    let pool = pool().await;
    let manager = create_user(&pool, Role::Manager).await;

    let first = invites::get_or_create_waiter_link(&pool, &manager, BOT)
        .await
        .expect("link creation succeeds");
    assert!(first.contains(&format!("manager_{}_", manager.id)));

    // The second call must return the stored link, not mint a new one.
    let manager = UserRepository::new(&pool)
        .get(manager.id)
        .await
        .expect("lookup succeeds")
        .expect("manager still exists");
    let second = invites::get_or_create_waiter_link(&pool, &manager, BOT)
        .await
        .expect("link lookup succeeds");
    assert_eq!(first, second);
}

#[tokio::test]
#[ignore = "needs a running Postgres with migrations applied"]
async fn one_shot_invitation_redeems_exactly_once() {
    let pool = pool().await;
    let admin = create_user(&pool, Role::Admin).await;

    let link = invites::create_admin_manager_invite(&pool, admin.id, BOT)
        .await
        .expect("invite creation succeeds");
    let code = code_from_link(&link);

    let invitation = InvitationRepository::new(&pool)
        .get_by_code_unused(code)
        .await
        .expect("lookup succeeds")
        .expect("fresh invitation is unused");
    let registration = invites::resolve_invite(&pool, code)
        .await
        .expect("fresh code resolves");
    assert_eq!(registration.invitation_id, Some(invitation.id));

    provisioning::register(
        &pool,
        &registration,
        &RegistrationRequest {
            username: unique_username("mgr").as_str(),
            password: "secret1",
            telegram: None,
        },
    )
    .await
    .expect("first redemption provisions a manager");

    // The conditional UPDATE already consumed the row, so a second
    // registration through the same invitation must fail.
    let second = provisioning::register(
        &pool,
        &registration,
        &RegistrationRequest {
            username: unique_username("mgr").as_str(),
            password: "secret1",
            telegram: None,
        },
    )
    .await;
    assert!(matches!(
        second,
        Err(tablecraft_server::error::AppError::InvalidInvitation)
    ));
    assert!(
        InvitationRepository::new(&pool)
            .get_by_code_unused(code)
            .await
            .expect("lookup succeeds")
            .is_none(),
        "a consumed code must no longer resolve as unused"
    );
}

#[tokio::test]
#[ignore = "needs a running Postgres with migrations applied"]
async fn manager_self_registration_needs_no_invitation() {
    let pool = pool().await;
    let registration = PendingRegistration {
        role: Role::Manager,
        manager_id: None,
        invitation_id: None,
    };

    let manager = provisioning::register(
        &pool,
        &registration,
        &RegistrationRequest {
            username: unique_username("mgr").as_str(),
            password: "secret1",
            telegram: None,
        },
    )
    .await
    .expect("self-registration succeeds without an invitation");
    assert_eq!(manager.role, Role::Manager);
    assert!(manager.manager_id.is_none());
}

#[tokio::test]
#[ignore = "needs a running Postgres with migrations applied"]
async fn first_waiter_wins_the_restaurant_assignment() {
    let pool = pool().await;
    let manager = create_user(&pool, Role::Manager).await;
    let restaurant = RestaurantRepository::new(&pool)
        .create(&NewRestaurant {
            name: format!("Assignment test {}", manager.id),
            concept: None,
            manager_id: Some(manager.id),
        })
        .await
        .expect("restaurant insert succeeds");
    assert!(restaurant.waiter_id.is_none());

    let registration = PendingRegistration {
        role: Role::Waiter,
        manager_id: Some(manager.id),
        invitation_id: None,
    };
    let first = provisioning::register(
        &pool,
        &registration,
        &RegistrationRequest {
            username: unique_username("wtr").as_str(),
            password: "secret1",
            telegram: None,
        },
    )
    .await
    .expect("first waiter registers");
    let second = provisioning::register(
        &pool,
        &registration,
        &RegistrationRequest {
            username: unique_username("wtr").as_str(),
            password: "secret1",
            telegram: None,
        },
    )
    .await
    .expect("second waiter registers");

    let restaurant = RestaurantRepository::new(&pool)
        .get(restaurant.id)
        .await
        .expect("lookup succeeds")
        .expect("restaurant exists");
    assert_eq!(restaurant.waiter_id, Some(first.id));
    assert_ne!(restaurant.waiter_id, Some(second.id));
    assert_eq!(second.manager_id, Some(manager.id));
}

#[tokio::test]
#[ignore = "needs a running Postgres with migrations applied"]
async fn admin_bootstrap_is_idempotent() {
    let pool = pool().await;
    let config = AdminBootstrapConfig {
        telegram_id: TelegramId::new(9_000_000_000 + i64::from(rand::random::<u32>())),
        username: unique_username("adm").as_str().to_owned(),
        password: SecretString::from("bootstrap1"),
    };

    let first = provisioning::ensure_admin_provisioned(&pool, &config, None)
        .await
        .expect("bootstrap succeeds");
    assert!(matches!(first, AdminBootstrap::Created(_)));

    let second = provisioning::ensure_admin_provisioned(&pool, &config, None)
        .await
        .expect("second contact succeeds");
    assert!(matches!(second, AdminBootstrap::Existing(_)));
    assert_eq!(first.user().id, second.user().id);
}

#[tokio::test]
#[ignore = "needs a running Postgres with migrations applied"]
async fn manager_link_registration_end_to_end() {
    let pool = pool().await;
    let manager = create_user(&pool, Role::Manager).await;
    let link = invites::get_or_create_waiter_link(&pool, &manager, BOT)
        .await
        .expect("link creation succeeds");
    let code = code_from_link(&link);

    let registration = invites::resolve_invite(&pool, code)
        .await
        .expect("stored link resolves");
    assert_eq!(registration.role, Role::Waiter);
    assert_eq!(registration.manager_id, Some(manager.id));
    assert!(registration.invitation_id.is_none());

    let waiter = provisioning::register(
        &pool,
        &registration,
        &RegistrationRequest {
            username: unique_username("wtr").as_str(),
            password: "secret1",
            telegram: None,
        },
    )
    .await
    .expect("registration succeeds");
    assert_eq!(waiter.role, Role::Waiter);
    assert_eq!(waiter.manager_id, Some(manager.id));
}
