//! Login, registration and token-based session resolution.

use std::sync::Arc;

use thiserror::Error;

use crate::hasher::PasswordHasher;
use crate::store::{StoreError, UserStore};
use crate::token::{TokenError, TokenService};
use crate::user::{NewUser, User};

/// Authentication failure taxonomy.
#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthnError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::AlreadyExists => AuthnError::UserAlreadyExists,
            other => AuthnError::Store(other),
        }
    }
}

/// Password login, registration and bearer-token resolution.
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Verify a username/password pair and issue an access token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthnError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthnError::UserNotFound)?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(AuthnError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username)?;
        tracing::info!(user = %user.username, "login");
        Ok((user, token))
    }

    /// Create a user account; duplicate usernames are rejected.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        is_superuser: bool,
    ) -> Result<User, AuthnError> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthnError::UserAlreadyExists);
        }

        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash: self.hasher.hash(password),
                is_superuser,
            })
            .await?;

        tracing::info!(user = %user.username, is_superuser, "registered user");
        Ok(user)
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthnError> {
        let username = self.tokens.verify(token)?;
        self.users
            .find_by_username(&username)
            .await?
            .ok_or(AuthnError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::hasher::Sha256PasswordHasher;
    use crate::store::MemoryAuthStore;
    use crate::token::Hs256TokenService;

    fn authenticator(store: &Arc<MemoryAuthStore>) -> Authenticator {
        Authenticator::new(
            store.clone(),
            Arc::new(Sha256PasswordHasher),
            Arc::new(Hs256TokenService::new(b"test-secret", Duration::minutes(5))),
        )
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let store = MemoryAuthStore::new();
        let auth = authenticator(&store);

        let registered = auth.register("olena", "s3cret", false).await.unwrap();
        assert!(!registered.is_superuser);
        // The raw secret never lands in storage.
        assert_ne!(registered.password_hash, "s3cret");

        let (user, token) = auth.login("olena", "s3cret").await.unwrap();
        assert_eq!(user.id, registered.id);

        let resolved = auth.authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, registered.id);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = MemoryAuthStore::new();
        let auth = authenticator(&store);
        auth.register("olena", "s3cret", false).await.unwrap();

        let err = auth.login("olena", "nope").await.unwrap_err();
        assert!(matches!(err, AuthnError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryAuthStore::new();
        let auth = authenticator(&store);

        let err = auth.login("ghost", "whatever").await.unwrap_err();
        assert!(matches!(err, AuthnError::UserNotFound));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let store = MemoryAuthStore::new();
        let auth = authenticator(&store);
        auth.register("olena", "s3cret", false).await.unwrap();

        let err = auth.register("olena", "again", false).await.unwrap_err();
        assert!(matches!(err, AuthnError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn garbled_token_is_rejected() {
        let store = MemoryAuthStore::new();
        let auth = authenticator(&store);

        let err = auth.authenticate("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthnError::InvalidToken(_)));
    }
}
