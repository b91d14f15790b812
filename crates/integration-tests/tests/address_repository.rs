//! Address repository tests against a real database.
//!
//! Requires a migrated database (`waybill-cli migrate`) named by
//! `WAYBILL_DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;
use waybill_core::UserId;
use waybill_integration_tests::{create_user, database_pool};
use waybill_storefront::db::AddressRepository;
use waybill_storefront::models::{Address, AddressInput};

fn input(street: &str) -> AddressInput {
    AddressInput {
        full_name: "Bart Simpson".to_owned(),
        street: street.to_owned(),
        city: "Springfield".to_owned(),
        zip: "49007".to_owned(),
        country: "USA".to_owned(),
        ..AddressInput::default()
    }
}

async fn primaries(pool: &PgPool, user: UserId) -> Vec<Address> {
    AddressRepository::new(pool)
        .list_for_user(user)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.is_primary)
        .collect()
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_concurrent_first_addresses_leave_one_primary() {
    let pool = database_pool().await;
    let user = create_user(&pool, "bart").await;
    let repo = AddressRepository::new(&pool);

    let first = input("742 Evergreen Terrace");
    let second = input("1 Treehouse Lane");
    let (a, b) = tokio::join!(repo.create(user, &first), repo.create(user, &second));

    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.is_primary ^ b.is_primary);
    assert_eq!(primaries(&pool, user).await.len(), 1);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_concurrent_primary_switches_both_succeed() {
    let pool = database_pool().await;
    let user = create_user(&pool, "bart").await;
    let repo = AddressRepository::new(&pool);

    let home = repo.create(user, &input("742 Evergreen Terrace")).await.unwrap();
    let school = repo.create(user, &input("Springfield Elementary")).await.unwrap();
    let arcade = repo.create(user, &input("Noiseland Arcade")).await.unwrap();
    assert!(home.is_primary);

    let (a, b) = tokio::join!(
        repo.set_primary(user, school.id),
        repo.set_primary(user, arcade.id)
    );

    a.unwrap();
    b.unwrap();
    let primary = primaries(&pool, user).await;
    assert_eq!(primary.len(), 1);
    let winner = primary.first().unwrap().id;
    assert!(winner == school.id || winner == arcade.id);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_create_as_primary_races_with_switch() {
    let pool = database_pool().await;
    let user = create_user(&pool, "bart").await;
    let repo = AddressRepository::new(&pool);

    repo.create(user, &input("742 Evergreen Terrace")).await.unwrap();
    let other = repo.create(user, &input("Moe's Tavern")).await.unwrap();
    let promoted = AddressInput {
        is_primary: true,
        ..input("Kwik-E-Mart")
    };

    let (created, switched) = tokio::join!(
        repo.create(user, &promoted),
        repo.set_primary(user, other.id)
    );

    created.unwrap();
    switched.unwrap();
    assert_eq!(primaries(&pool, user).await.len(), 1);
}
