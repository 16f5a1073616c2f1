use super::{
    auth::SagraHasher, AuthToken, AuthTokenValue, Permission, UserAuthCredentials, UserRole,
    UserStore, UsernamePasswordCredentials,
};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::SystemTime;

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T) -> Result<usize> {
        if user_handle.as_ref().is_empty() {
            bail!("The user handle cannot be empty.")
        }
        if self.user_store.get_user_id(user_handle.as_ref())?.is_some() {
            bail!("User handle already exists.");
        }
        self.user_store.create_user(user_handle.as_ref())
    }

    pub fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        self.user_store.get_user_id(user_handle)
    }

    pub fn get_all_user_handles(&self) -> Result<Vec<String>> {
        self.user_store.get_all_user_handles()
    }

    pub fn get_user_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        self.user_store.get_user_auth_credentials(user_handle)
    }

    pub fn generate_auth_token(&self, credentials: &UserAuthCredentials) -> Result<AuthToken> {
        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn delete_auth_token(&self, user_id: usize, token_value: &AuthTokenValue) -> Result<()> {
        match self.user_store.delete_user_auth_token(token_value)? {
            Some(removed) => {
                if removed.user_id == user_id {
                    Ok(())
                } else {
                    // Token belonged to someone else, restore it.
                    let _ = self.user_store.add_user_auth_token(removed.clone());
                    bail!(
                        "Tried to delete auth token of user {}, but the authenticated user {} was not its owner.",
                        removed.user_id,
                        user_id
                    )
                }
            }
            None => bail!("Auth token not found"),
        }
    }

    pub fn get_user_permissions(&self, user_id: usize) -> Result<Vec<Permission>> {
        self.user_store.resolve_user_permissions(user_id)
    }

    pub fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>> {
        self.user_store.get_user_roles(user_id)
    }

    pub fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        self.user_store.add_user_role(user_id, role)
    }

    fn create_hashed_password(
        user_id: usize,
        password: &str,
    ) -> Result<UsernamePasswordCredentials> {
        let hasher = SagraHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(UsernamePasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_tried: None,
            last_used: None,
        })
    }

    pub fn create_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        if let Some(credentials) = self.user_store.get_user_auth_credentials(user_handle)? {
            if credentials.username_password.is_some() {
                bail!(
                    "User {} already has a password. Maybe you want to update it?",
                    user_handle
                );
            }
        }

        let user_id = self
            .user_store
            .get_user_id(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;

        self.user_store
            .update_user_auth_credentials(UserAuthCredentials {
                user_id,
                username_password: Some(Self::create_hashed_password(user_id, password)?),
            })
    }

    pub fn update_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        if credentials.username_password.is_none() {
            bail!(
                "Cannot update password of user {} since it never had one.",
                user_handle
            );
        }
        credentials.username_password = Some(Self::create_hashed_password(
            credentials.user_id,
            password,
        )?);
        self.user_store.update_user_auth_credentials(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn manager() -> (TempDir, UserManager) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteUserStore::new(dir.path().join("users.db")).unwrap());
        (dir, UserManager::new(store))
    }

    #[test]
    fn rejects_empty_and_duplicate_handles() {
        let (_dir, manager) = manager();
        assert!(manager.add_user("").is_err());
        manager.add_user("rita").unwrap();
        assert!(manager.add_user("rita").is_err());
    }

    #[test]
    fn password_lifecycle() {
        let (_dir, manager) = manager();
        manager.add_user("rita").unwrap();

        assert!(manager.update_password_credentials("rita", "x").is_err());
        manager.create_password_credentials("rita", "primo").unwrap();
        assert!(manager.create_password_credentials("rita", "dup").is_err());
        manager
            .update_password_credentials("rita", "secondo")
            .unwrap();

        let pw = manager
            .get_user_credentials("rita")
            .unwrap()
            .unwrap()
            .username_password
            .unwrap();
        assert!(pw
            .hasher
            .verify("secondo", pw.hash.as_str(), pw.salt.as_str())
            .unwrap());
    }

    #[test]
    fn cannot_delete_another_users_token() {
        let (_dir, manager) = manager();
        let owner = manager.add_user("owner").unwrap();
        let other = manager.add_user("other").unwrap();

        let credentials = UserAuthCredentials {
            user_id: owner,
            username_password: None,
        };
        let token = manager.generate_auth_token(&credentials).unwrap();

        assert!(manager.delete_auth_token(other, &token.value).is_err());
        // Token must still be usable by its owner.
        assert!(manager.get_auth_token(&token.value).unwrap().is_some());
        manager.delete_auth_token(owner, &token.value).unwrap();
        assert!(manager.get_auth_token(&token.value).unwrap().is_none());
    }
}
