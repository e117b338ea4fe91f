//! Authentication service — login and token refresh orchestration.

use keywarden_core::error::{WardenError, WardenResult};
use keywarden_core::models::User;
use keywarden_core::rbac::{GroupGrants, IdentityClaims};
use keywarden_core::repository::{GroupRepository, PermissionRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Signed JWT refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U, G, P>
where
    U: UserRepository,
    G: GroupRepository,
    P: PermissionRepository,
{
    users: U,
    groups: G,
    permissions: P,
    config: AuthConfig,
}

impl<U, G, P> AuthService<U, G, P>
where
    U: UserRepository,
    G: GroupRepository,
    P: PermissionRepository,
{
    pub fn new(users: U, groups: G, permissions: P, config: AuthConfig) -> Self {
        Self {
            users,
            groups,
            permissions,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Load the user's group/permission graph and project it into
    /// identity claims.
    pub async fn resolve_claims(&self, user: &User) -> WardenResult<IdentityClaims> {
        let groups = self.groups.get_user_groups(user.id).await?;

        let mut grants = Vec::with_capacity(groups.len());
        for group in groups {
            let permissions = self.permissions.get_for_group(group.id).await?;
            grants.push(GroupGrants { group, permissions });
        }

        Ok(IdentityClaims::resolve(user, &grants))
    }

    /// Authenticate a user by username + password and issue a token
    /// pair.
    ///
    /// An unknown username and a wrong password both fail with
    /// `InvalidCredentials` — the response never reveals which.
    pub async fn login(&self, username: &str, password: &str) -> WardenResult<LoginOutput> {
        let user = match self.users.get_by_username(username).await {
            Ok(user) => user,
            Err(WardenError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid =
            password::verify_password(password, &user.password_hash, self.config.pepper.as_deref())
                .map_err(WardenError::from)?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let claims = self.resolve_claims(&user).await?;

        let access_token = token::issue_access_token(&claims, &self.config)?;
        let refresh_token = token::issue_refresh_token(&claims, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Mint a fresh access token from a presented bearer artifact
    /// (access or refresh).
    ///
    /// The user is re-fetched from the store and the claims rebuilt,
    /// so group/permission changes since issuance take effect here. A
    /// user deleted since issuance fails as invalid credentials.
    pub async fn refresh(&self, bearer: &str) -> WardenResult<String> {
        let presented = token::decode_token(bearer, &self.config).map_err(WardenError::from)?;

        let user = match self.users.get_by_id(presented.identity.id).await {
            Ok(user) => user,
            Err(WardenError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let claims = self.resolve_claims(&user).await?;
        Ok(token::issue_access_token(&claims, &self.config)?)
    }
}
