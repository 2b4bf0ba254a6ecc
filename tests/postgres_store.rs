//! Credential store tests against a real Postgres, one fresh database per test

use sqlx::{Connection, Executor, PgConnection, PgPool};

use account_service::configuration::{get_configuration, DatabaseSettings};
use account_service::credential_store::{CredentialStore, PgCredentialStore};
use account_service::error::DatabaseError;
use account_service::user::NewUser;

pub async fn configure_database(config: &DatabaseSettings) -> PgCredentialStore {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    let store = PgCredentialStore::new(connection_pool);
    store.migrate().await.expect("Failed to migrate the database.");
    store
}

async fn spawn_store() -> PgCredentialStore {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    configure_database(&configuration.database).await
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        full_name: "Alice Liddell".to_string(),
        avatar: "https://media.local/uploads/1".to_string(),
        cover_image: String::new(),
        password_hash: "$2b$04$hash".to_string(),
    }
}

#[tokio::test]
async fn create_then_lookup_by_username_and_by_email() {
    let store = spawn_store().await;
    let created = store.create(new_user("alice", "alice@x.com")).await.unwrap();
    assert!(created.refresh_token.is_none());

    let by_username = store
        .find_by_username_or_email(Some("alice"), None)
        .await
        .unwrap()
        .expect("user should be found by username");
    assert_eq!(by_username.id, created.id);

    let by_email = store
        .find_by_username_or_email(None, Some("alice@x.com"))
        .await
        .unwrap()
        .expect("user should be found by email");
    assert_eq!(by_email.id, created.id);

    let by_id = store.find_by_id(created.id).await.unwrap();
    assert_eq!(by_id.map(|u| u.email), Some("alice@x.com".to_string()));
}

#[tokio::test]
async fn lookup_with_no_criteria_matches_nothing() {
    let store = spawn_store().await;
    store.create(new_user("alice", "alice@x.com")).await.unwrap();

    let found = store.find_by_username_or_email(None, None).await.unwrap();
    assert!(found.is_none());

    let found = store
        .find_by_username_or_email(Some("bob"), Some("bob@x.com"))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn duplicate_username_or_email_is_a_unique_violation() {
    let store = spawn_store().await;
    store.create(new_user("alice", "alice@x.com")).await.unwrap();

    let same_username = store.create(new_user("alice", "other@x.com")).await;
    assert!(matches!(
        same_username,
        Err(DatabaseError::UniqueConstraintViolation(_))
    ));

    let same_email = store.create(new_user("bob", "alice@x.com")).await;
    assert!(matches!(
        same_email,
        Err(DatabaseError::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn rotation_only_replaces_the_current_token() {
    let store = spawn_store().await;
    let user = store.create(new_user("alice", "alice@x.com")).await.unwrap();

    // nothing stored yet
    assert!(!store.rotate_refresh_token(user.id, "first", "second").await.unwrap());

    store.update_refresh_token(user.id, Some("first")).await.unwrap();
    assert!(store.rotate_refresh_token(user.id, "first", "second").await.unwrap());

    // replaying the retired token changes nothing
    assert!(!store.rotate_refresh_token(user.id, "first", "third").await.unwrap());
    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("second"));

    store.update_refresh_token(user.id, None).await.unwrap();
    assert!(!store.rotate_refresh_token(user.id, "second", "fourth").await.unwrap());
    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token.is_none());
}

#[tokio::test]
async fn password_and_avatar_updates() {
    let store = spawn_store().await;
    let user = store.create(new_user("alice", "alice@x.com")).await.unwrap();

    store.update_password(user.id, "$2b$04$other").await.unwrap();
    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "$2b$04$other");

    let updated = store
        .update_avatar(user.id, "https://media.local/uploads/2")
        .await
        .unwrap()
        .expect("existing user should be updated");
    assert_eq!(updated.avatar, "https://media.local/uploads/2");

    let missing = store
        .update_avatar(uuid::Uuid::new_v4(), "https://media.local/uploads/3")
        .await
        .unwrap();
    assert!(missing.is_none());
}
