use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use super::permissions::{Permission, UserRole};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Replaces the user's authentication credentials.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns an auth token given its value.
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token, returning the deleted token.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Stamps the token's last_used with the current time.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns a user's handle given the user id.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns a user's id given the handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    /// Returns all users' handles.
    fn get_all_user_handles(&self) -> Result<Vec<String>>;

    /// Returns all roles assigned to a user.
    fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>>;

    /// Assigns a role to a user.
    fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    /// Removes a role from a user.
    fn remove_user_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    /// Resolves the permissions granted by all of a user's roles.
    fn resolve_user_permissions(&self, user_id: usize) -> Result<Vec<Permission>>;
}
