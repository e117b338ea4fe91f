//! Response projections.
//!
//! Two shapes per entity: `short` (no relations, used in listings) and
//! `full` (short plus the short shapes of directly related entities,
//! used for single-entity reads). All projection functions are pure;
//! relations are loaded by the caller. The user's full view is its
//! identity-claims shape ([`crate::rbac::IdentityClaims`]).

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Group, Permission, User};

#[derive(Debug, Clone, Serialize)]
pub struct UserShort {
    pub id: Uuid,
    pub active: bool,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupShort {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionShort {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFull {
    pub id: Uuid,
    pub name: String,
    pub users: Vec<UserShort>,
    pub permissions: Vec<PermissionShort>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionFull {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub groups: Vec<GroupShort>,
}

pub fn user_short(user: &User) -> UserShort {
    UserShort {
        id: user.id,
        active: user.active,
        username: user.username.clone(),
        name: user.name.clone(),
    }
}

pub fn group_short(group: &Group) -> GroupShort {
    GroupShort {
        id: group.id,
        name: group.name.clone(),
    }
}

pub fn permission_short(permission: &Permission) -> PermissionShort {
    PermissionShort {
        id: permission.id,
        name: permission.name.clone(),
        description: permission.description.clone(),
    }
}

pub fn group_full(group: &Group, members: &[User], permissions: &[Permission]) -> GroupFull {
    GroupFull {
        id: group.id,
        name: group.name.clone(),
        users: members.iter().map(user_short).collect(),
        permissions: permissions.iter().map(permission_short).collect(),
    }
}

pub fn permission_full(permission: &Permission, groups: &[Group]) -> PermissionFull {
    PermissionFull {
        id: permission.id,
        name: permission.name.clone(),
        description: permission.description.clone(),
        groups: groups.iter().map(group_short).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_group() -> Group {
        Group {
            id: Uuid::new_v4(),
            name: "editors".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            active: true,
            username: "alice123".into(),
            name: "Alice".into(),
            password_hash: "$argon2id$stub".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_permission() -> Permission {
        Permission {
            id: Uuid::new_v4(),
            name: "iam_users_manage".into(),
            description: Some("Manage users".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn short_shapes_never_expose_the_password_hash() {
        let json = serde_json::to_value(user_short(&sample_user())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice123");
    }

    #[test]
    fn group_full_embeds_member_and_permission_shorts() {
        let group = sample_group();
        let full = group_full(&group, &[sample_user()], &[sample_permission()]);

        let json = serde_json::to_value(full).unwrap();
        assert_eq!(json["name"], "editors");
        assert_eq!(json["users"][0]["username"], "alice123");
        assert!(json["users"][0].get("groups").is_none());
        assert_eq!(json["permissions"][0]["name"], "iam_users_manage");
    }

    #[test]
    fn permission_full_embeds_group_shorts() {
        let permission = sample_permission();
        let full = permission_full(&permission, &[sample_group()]);

        let json = serde_json::to_value(full).unwrap();
        assert_eq!(json["groups"][0]["name"], "editors");
        assert!(json["groups"][0].get("users").is_none());
    }
}
