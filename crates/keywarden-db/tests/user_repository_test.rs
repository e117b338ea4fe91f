//! Integration tests for the User repository using in-memory SurrealDB.

use keywarden_core::WardenError;
use keywarden_core::models::{CreateGroup, CreateUser, UpdateUser};
use keywarden_core::repository::{GroupRepository, Pagination, UserRepository};
use keywarden_db::repository::{SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    keywarden_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(username: &str) -> CreateUser {
    CreateUser {
        username: username.into(),
        name: username.into(),
        password: "secret1".into(),
        active: false,
        group_ids: Vec::new(),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(new_user("alice123")).await.unwrap();
    assert_eq!(user.username, "alice123");
    assert!(!user.active);
    assert!(user.password_hash.starts_with("$argon2id$"));

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.username, "alice123");

    let by_name = repo.get_by_username("alice123").await.unwrap();
    assert_eq!(by_name.id, user.id);
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user("alice123")).await.unwrap();
    let result = repo.create(new_user("alice123")).await;

    assert!(
        matches!(result, Err(WardenError::AlreadyExists { .. })),
        "duplicate username should be rejected, got {result:?}"
    );
}

#[tokio::test]
async fn create_assigns_initial_groups_atomically() {
    let db = setup().await;
    let groups = SurrealGroupRepository::new(db.clone());
    let users = SurrealUserRepository::new(db);

    let default = groups
        .create(CreateGroup {
            name: "users".into(),
        })
        .await
        .unwrap();

    let mut input = new_user("bob99");
    input.group_ids = vec![default.id];
    let user = users.create(input).await.unwrap();

    let memberships = groups.get_user_groups(user.id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].name, "users");
}

#[tokio::test]
async fn update_touches_only_given_fields() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(new_user("carol77")).await.unwrap();
    let original_hash = user.password_hash.clone();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                name: Some("Carol".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Carol");
    assert_eq!(updated.username, "carol77");
    assert_eq!(updated.password_hash, original_hash);

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                password: Some("another1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(updated.password_hash, original_hash);

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.active);
}

#[tokio::test]
async fn update_missing_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let result = repo
        .update(
            Uuid::new_v4(),
            UpdateUser {
                name: Some("ghost".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(WardenError::NotFound { .. })));
}

#[tokio::test]
async fn delete_removes_user_and_memberships_but_not_groups() {
    let db = setup().await;
    let groups = SurrealGroupRepository::new(db.clone());
    let users = SurrealUserRepository::new(db);

    let team = groups
        .create(CreateGroup {
            name: "team".into(),
        })
        .await
        .unwrap();

    let mut input = new_user("dave456");
    input.group_ids = vec![team.id];
    let user = users.create(input).await.unwrap();

    users.delete(user.id).await.unwrap();

    assert!(matches!(
        users.get_by_id(user.id).await,
        Err(WardenError::NotFound { .. })
    ));
    // The group survives; only the membership edge went away.
    let group = groups.get_by_id(team.id).await.unwrap();
    assert_eq!(group.name, "team");
    assert!(groups.get_members(team.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_missing_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    assert!(matches!(
        repo.get_by_id(Uuid::new_v4()).await,
        Err(WardenError::NotFound { .. })
    ));
    assert!(matches!(
        repo.get_by_username("nobody").await,
        Err(WardenError::NotFound { .. })
    ));
}

#[tokio::test]
async fn list_paginates_and_counts() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    for i in 0..5 {
        repo.create(new_user(&format!("user-{i}"))).await.unwrap();
    }

    let page1 = repo
        .list(
            None,
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(
            None,
            Pagination {
                offset: 3,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);

    let beyond = repo
        .list(
            None,
            Pagination {
                offset: 30,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);
}

#[tokio::test]
async fn search_matches_username_substring_case_insensitively() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user("Alice.Smith")).await.unwrap();
    repo.create(new_user("bob.jones")).await.unwrap();

    let hits = repo
        .list(Some("ALICE".into()), Pagination::default())
        .await
        .unwrap();
    assert_eq!(hits.items.len(), 1);
    assert_eq!(hits.items[0].username, "Alice.Smith");

    let none = repo
        .list(Some("zzz".into()), Pagination::default())
        .await
        .unwrap();
    assert!(none.items.is_empty());
    assert_eq!(none.total, 0);
}
