//! Integration tests for the Permission repository using in-memory
//! SurrealDB.

use keywarden_core::WardenError;
use keywarden_core::models::{CreateGroup, CreatePermission, UpdatePermission};
use keywarden_core::repository::{GroupRepository, Pagination, PermissionRepository};
use keywarden_db::repository::{SurrealGroupRepository, SurrealPermissionRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    keywarden_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_and_get_permission() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    let permission = repo
        .create(CreatePermission {
            name: "iam_users_manage".into(),
            description: Some("Allows to manage any user account".into()),
        })
        .await
        .unwrap();

    let fetched = repo.get_by_id(permission.id).await.unwrap();
    assert_eq!(fetched.name, "iam_users_manage");
    assert_eq!(
        fetched.description.as_deref(),
        Some("Allows to manage any user account")
    );

    let by_name = repo.get_by_name("iam_users_manage").await.unwrap();
    assert_eq!(by_name.id, permission.id);
}

#[tokio::test]
async fn description_is_optional() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    let permission = repo
        .create(CreatePermission {
            name: "bare_permission".into(),
            description: None,
        })
        .await
        .unwrap();
    assert!(permission.description.is_none());
}

#[tokio::test]
async fn duplicate_name_rejected() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    repo.create(CreatePermission {
        name: "only_once".into(),
        description: None,
    })
    .await
    .unwrap();

    let result = repo
        .create(CreatePermission {
            name: "only_once".into(),
            description: None,
        })
        .await;
    assert!(matches!(result, Err(WardenError::AlreadyExists { .. })));
}

#[tokio::test]
async fn update_is_partial() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    let permission = repo
        .create(CreatePermission {
            name: "renameme".into(),
            description: Some("before".into()),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            permission.id,
            UpdatePermission {
                description: Some("after".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "renameme");
    assert_eq!(updated.description.as_deref(), Some("after"));
}

#[tokio::test]
async fn delete_cascades_grants_only() {
    let db = setup().await;
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db);

    let group = groups
        .create(CreateGroup {
            name: "holders".into(),
        })
        .await
        .unwrap();
    let permission = permissions
        .create(CreatePermission {
            name: "ephemeral".into(),
            description: None,
        })
        .await
        .unwrap();
    groups
        .replace_permissions(group.id, vec![permission.id])
        .await
        .unwrap();

    permissions.delete(permission.id).await.unwrap();

    assert!(matches!(
        permissions.get_by_id(permission.id).await,
        Err(WardenError::NotFound { .. })
    ));
    // The holding group survives with an empty grant set.
    assert!(groups.get_by_id(group.id).await.is_ok());
    assert!(permissions.get_for_group(group.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_is_quietly_ok_but_get_is_not_found() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    // The repository's delete is idempotent; the REST layer answers
    // 404 by locating the entity first.
    repo.delete(Uuid::new_v4()).await.unwrap();
    assert!(matches!(
        repo.get_by_id(Uuid::new_v4()).await,
        Err(WardenError::NotFound { .. })
    ));
}

#[tokio::test]
async fn groups_holding_a_permission() {
    let db = setup().await;
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db);

    let g1 = groups
        .create(CreateGroup {
            name: "first".into(),
        })
        .await
        .unwrap();
    let g2 = groups
        .create(CreateGroup {
            name: "second".into(),
        })
        .await
        .unwrap();
    let permission = permissions
        .create(CreatePermission {
            name: "shared".into(),
            description: None,
        })
        .await
        .unwrap();

    groups.replace_permissions(g1.id, vec![permission.id]).await.unwrap();
    groups.replace_permissions(g2.id, vec![permission.id]).await.unwrap();

    let holders = permissions.get_groups_holding(permission.id).await.unwrap();
    let names: Vec<&str> = holders.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(holders.len(), 2);
    assert!(names.contains(&"first"));
    assert!(names.contains(&"second"));
}

#[tokio::test]
async fn list_search_is_case_insensitive_substring() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    for name in ["iam_users_manage", "iam_group_manage", "reports_read"] {
        repo.create(CreatePermission {
            name: name.into(),
            description: None,
        })
        .await
        .unwrap();
    }

    let hits = repo
        .list(Some("MANAGE".into()), Pagination::default())
        .await
        .unwrap();
    assert_eq!(hits.total, 2);

    let all = repo.list(None, Pagination::default()).await.unwrap();
    assert_eq!(all.total, 3);
}
