//! Integration tests for the Group repository using in-memory
//! SurrealDB: membership set semantics, wholesale replacement, and
//! association-only delete cascades.

use keywarden_core::WardenError;
use keywarden_core::models::{CreateGroup, CreatePermission, CreateUser, UpdateGroup};
use keywarden_core::repository::{
    GroupRepository, Pagination, PermissionRepository, UserRepository,
};
use keywarden_db::repository::{
    SurrealGroupRepository, SurrealPermissionRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> (
    Surreal<surrealdb::engine::local::Db>,
    Uuid, // user_a
    Uuid, // user_b
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    keywarden_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let user_a = users
        .create(CreateUser {
            username: "alice123".into(),
            name: "Alice".into(),
            password: "secret1".into(),
            active: false,
            group_ids: Vec::new(),
        })
        .await
        .unwrap();
    let user_b = users
        .create(CreateUser {
            username: "bob4567".into(),
            name: "Bob".into(),
            password: "secret1".into(),
            active: false,
            group_ids: Vec::new(),
        })
        .await
        .unwrap();

    (db, user_a.id, user_b.id)
}

#[tokio::test]
async fn create_get_update_group() {
    let (db, _, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo
        .create(CreateGroup {
            name: "editors".into(),
        })
        .await
        .unwrap();
    assert_eq!(group.name, "editors");

    let fetched = repo.get_by_id(group.id).await.unwrap();
    assert_eq!(fetched.name, "editors");
    assert_eq!(repo.get_by_name("editors").await.unwrap().id, group.id);

    let renamed = repo
        .update(
            group.id,
            UpdateGroup {
                name: Some("writers".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "writers");
    assert_eq!(renamed.id, group.id);
}

#[tokio::test]
async fn duplicate_name_rejected() {
    let (db, _, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.create(CreateGroup {
        name: "unique-group".into(),
    })
    .await
    .unwrap();

    let result = repo
        .create(CreateGroup {
            name: "unique-group".into(),
        })
        .await;
    assert!(matches!(result, Err(WardenError::AlreadyExists { .. })));
}

#[tokio::test]
async fn membership_has_set_semantics() {
    let (db, user_a, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo
        .create(CreateGroup {
            name: "team".into(),
        })
        .await
        .unwrap();

    repo.add_member(user_a, group.id).await.unwrap();
    // Re-adding the same member must be a no-op, not a duplicate edge.
    repo.add_member(user_a, group.id).await.unwrap();

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username, "alice123");
}

#[tokio::test]
async fn add_member_checks_both_endpoints() {
    let (db, user_a, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo
        .create(CreateGroup {
            name: "team".into(),
        })
        .await
        .unwrap();

    assert!(matches!(
        repo.add_member(Uuid::new_v4(), group.id).await,
        Err(WardenError::NotFound { .. })
    ));
    assert!(matches!(
        repo.add_member(user_a, Uuid::new_v4()).await,
        Err(WardenError::NotFound { .. })
    ));
}

#[tokio::test]
async fn remove_member() {
    let (db, user_a, user_b) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo
        .create(CreateGroup {
            name: "team".into(),
        })
        .await
        .unwrap();
    repo.add_member(user_a, group.id).await.unwrap();
    repo.add_member(user_b, group.id).await.unwrap();

    repo.remove_member(user_a, group.id).await.unwrap();

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username, "bob4567");
}

#[tokio::test]
async fn set_user_groups_replaces_wholesale() {
    let (db, user_a, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let g1 = repo
        .create(CreateGroup { name: "one1".into() })
        .await
        .unwrap();
    let g2 = repo
        .create(CreateGroup { name: "two2".into() })
        .await
        .unwrap();
    let g3 = repo
        .create(CreateGroup {
            name: "three".into(),
        })
        .await
        .unwrap();

    repo.add_member(user_a, g1.id).await.unwrap();
    repo.add_member(user_a, g2.id).await.unwrap();

    repo.set_user_groups(user_a, vec![g3.id]).await.unwrap();

    let groups = repo.get_user_groups(user_a).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "three");
}

#[tokio::test]
async fn replace_permissions_is_not_additive() {
    let (db, _, _) = setup().await;
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db);

    let group = groups
        .create(CreateGroup {
            name: "editors".into(),
        })
        .await
        .unwrap();
    let p1 = permissions
        .create(CreatePermission {
            name: "iam_users_manage".into(),
            description: None,
        })
        .await
        .unwrap();
    let p2 = permissions
        .create(CreatePermission {
            name: "iam_group_manage".into(),
            description: None,
        })
        .await
        .unwrap();

    groups.replace_permissions(group.id, vec![p1.id]).await.unwrap();
    let granted = permissions.get_for_group(group.id).await.unwrap();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].name, "iam_users_manage");

    // Second replacement drops the first grant entirely.
    groups.replace_permissions(group.id, vec![p2.id]).await.unwrap();
    let granted = permissions.get_for_group(group.id).await.unwrap();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].name, "iam_group_manage");
}

#[tokio::test]
async fn delete_group_keeps_users_and_permissions() {
    let (db, user_a, _) = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db);

    let group = groups
        .create(CreateGroup {
            name: "doomed".into(),
        })
        .await
        .unwrap();
    let permission = permissions
        .create(CreatePermission {
            name: "some_permission".into(),
            description: None,
        })
        .await
        .unwrap();

    groups.add_member(user_a, group.id).await.unwrap();
    groups
        .replace_permissions(group.id, vec![permission.id])
        .await
        .unwrap();

    groups.delete(group.id).await.unwrap();

    assert!(matches!(
        groups.get_by_id(group.id).await,
        Err(WardenError::NotFound { .. })
    ));
    // Association-only cascade: both related entities survive.
    assert!(users.get_by_id(user_a).await.is_ok());
    assert!(permissions.get_by_id(permission.id).await.is_ok());
    assert!(groups.get_user_groups(user_a).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_with_search_and_pagination() {
    let (db, _, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    for i in 0..4 {
        repo.create(CreateGroup {
            name: format!("crew-{i}"),
        })
        .await
        .unwrap();
    }
    repo.create(CreateGroup {
        name: "other".into(),
    })
    .await
    .unwrap();

    let hits = repo
        .list(Some("CREW".into()), Pagination { offset: 0, limit: 3 })
        .await
        .unwrap();
    assert_eq!(hits.total, 4);
    assert_eq!(hits.items.len(), 3);

    let all = repo.list(None, Pagination { offset: 0, limit: 10 }).await.unwrap();
    assert_eq!(all.total, 5);
}
