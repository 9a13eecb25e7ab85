//! Integration tests for the User repository using in-memory SurrealDB.

use permdir_core::error::PermdirError;
use permdir_core::models::user::{CreateUser, UpdateUser};
use permdir_core::repository::UserRepository;
use permdir_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    permdir_db::run_migrations(&db).await.unwrap();
    db
}

fn alice() -> CreateUser {
    CreateUser {
        username: "alice".into(),
        email: Some("alice@example.com".into()),
        first_name: Some("Alice".into()),
        last_name: Some("Liddell".into()),
        language: None,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(alice()).await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.language, "en");
    assert!(user.is_active);

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched, user);

    let by_name = repo.get_by_username("alice").await.unwrap();
    assert_eq!(by_name.id, user.id);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);
    repo.create(alice()).await.unwrap();

    let err = repo.create(alice()).await.unwrap_err();
    assert!(matches!(err, PermdirError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn invalid_username_is_rejected_before_storage() {
    let repo = SurrealUserRepository::new(setup().await);
    let err = repo
        .create(CreateUser {
            username: "no spaces".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PermdirError::Validation { .. }));
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_sets_and_clears_fields() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(alice()).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                email: Some(None),
                first_name: Some(Some("Alicia".into())),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email, None);
    assert_eq!(updated.first_name.as_deref(), Some("Alicia"));
    assert_eq!(updated.last_name.as_deref(), Some("Liddell"));
    assert!(!updated.is_active);
    assert!(updated.modified_at >= user.modified_at);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let repo = SurrealUserRepository::new(setup().await);
    let id = uuid::Uuid::new_v4();

    assert!(matches!(
        repo.get_by_id(id).await,
        Err(PermdirError::NotFound { .. })
    ));
    assert!(matches!(
        repo.update(id, UpdateUser::default()).await,
        Err(PermdirError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete(id).await,
        Err(PermdirError::NotFound { .. })
    ));
}

#[tokio::test]
async fn list_orders_by_username() {
    let repo = SurrealUserRepository::new(setup().await);
    for username in ["carol", "alice", "bob"] {
        repo.create(CreateUser {
            username: username.into(),
            ..Default::default()
        })
        .await
        .unwrap();
    }
    let names: Vec<_> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
}
