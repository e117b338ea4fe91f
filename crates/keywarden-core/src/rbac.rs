//! RBAC resolution: deriving a user's effective permission set and the
//! identity claims embedded in tokens.
//!
//! Everything here is pure — the group/permission graph is loaded by
//! the caller and passed in. The authorization layer trusts only the
//! [`IdentityClaims`] projection; claims are computed at token issuance
//! and re-computed on refresh, never re-validated per request.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Group, Permission, User};

/// One group a user belongs to, with the permissions granted to it.
#[derive(Debug, Clone)]
pub struct GroupGrants {
    pub group: Group,
    pub permissions: Vec<Permission>,
}

/// Union of permission names across all of the user's groups:
/// duplicate-free and independent of group ordering.
pub fn effective_permissions(grants: &[GroupGrants]) -> BTreeSet<String> {
    grants
        .iter()
        .flat_map(|g| g.permissions.iter().map(|p| p.name.clone()))
        .collect()
}

/// The signed payload embedded in tokens: the only view of a user the
/// authorization layer ever trusts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub id: Uuid,
    pub active: bool,
    pub username: String,
    pub name: String,
    /// Names of the groups the user belonged to at issuance time.
    pub groups: Vec<String>,
    /// Effective permission set at issuance time, deduplicated and
    /// sorted so equal claim sets serialize identically.
    pub permissions: Vec<String>,
}

impl IdentityClaims {
    /// Project a user and its loaded grants graph into claims.
    pub fn resolve(user: &User, grants: &[GroupGrants]) -> Self {
        Self {
            id: user.id,
            active: user.active,
            username: user.username.clone(),
            name: user.name.clone(),
            groups: grants.iter().map(|g| g.group.name.clone()).collect(),
            permissions: effective_permissions(grants).into_iter().collect(),
        }
    }

    /// Membership test against the effective permission set.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(name: &str) -> Group {
        Group {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn permission(name: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            active: false,
            username: username.into(),
            name: username.into(),
            password_hash: "$argon2id$stub".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn effective_set_is_the_union_over_groups() {
        let grants = vec![
            GroupGrants {
                group: group("editors"),
                permissions: vec![permission("posts_edit"), permission("posts_read")],
            },
            GroupGrants {
                group: group("readers"),
                permissions: vec![permission("posts_read")],
            },
        ];

        let perms = effective_permissions(&grants);
        assert_eq!(perms.len(), 2);
        assert!(perms.contains("posts_edit"));
        assert!(perms.contains("posts_read"));
    }

    #[test]
    fn effective_set_is_order_independent() {
        let a = GroupGrants {
            group: group("a"),
            permissions: vec![permission("x"), permission("y")],
        };
        let b = GroupGrants {
            group: group("b"),
            permissions: vec![permission("y"), permission("z")],
        };

        let forward = effective_permissions(&[a.clone(), b.clone()]);
        let backward = effective_permissions(&[b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_grants_yield_empty_set() {
        assert!(effective_permissions(&[]).is_empty());
    }

    #[test]
    fn claims_carry_group_names_and_deduplicated_permissions() {
        let u = user("alice123");
        let grants = vec![
            GroupGrants {
                group: group("users"),
                permissions: vec![permission("iam_users_manage")],
            },
            GroupGrants {
                group: group("admins"),
                permissions: vec![permission("iam_users_manage"), permission("iam_group_manage")],
            },
        ];

        let claims = IdentityClaims::resolve(&u, &grants);
        assert_eq!(claims.username, "alice123");
        assert!(!claims.active);
        assert_eq!(claims.groups, vec!["users".to_string(), "admins".to_string()]);
        assert_eq!(claims.permissions.len(), 2);
        assert!(claims.has_permission("iam_group_manage"));
        assert!(!claims.has_permission("iam_permission_manage"));
    }
}
