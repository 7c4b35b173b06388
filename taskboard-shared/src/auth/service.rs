/// Credential checks for the login endpoint

use crate::auth::password::PasswordEncoder;
use crate::error::ServiceError;
use crate::models::user::User;
use crate::repository::{Store, UnitOfWork, UserRepository};
use std::sync::Arc;
use tracing::{debug, info};

/// Looks users up by email and verifies their password
pub struct AuthService<S: Store> {
    store: Arc<S>,
    encoder: Arc<dyn PasswordEncoder>,
}

impl<S: Store> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            encoder: Arc::clone(&self.encoder),
        }
    }
}

impl<S: Store> AuthService<S> {
    pub fn new(store: Arc<S>, encoder: Arc<dyn PasswordEncoder>) -> Self {
        Self { store, encoder }
    }

    /// Returns the user owning `email` if `password` matches
    ///
    /// The email is normalized before lookup. Unknown emails and wrong
    /// passwords both yield `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = email.trim().to_lowercase();

        let mut uow = self.store.begin().await?;
        let user = uow.users().find_by_email(&email).await?;

        let Some(user) = user else {
            debug!(email = %email, "Login for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.encoder.matches(password, &user.password_hash)? {
            debug!(user_id = user.id, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = user.id, "User authenticated");
        Ok(user)
    }
}
