//! Account signup, login, and profile updates.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use store::{Role, Store, User};

use crate::error::DomainError;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// A signup request.
#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A local login request.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A profile update request.
///
/// Password change requires the current password alongside the new one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Account operations.
pub struct AccountService<S: Store> {
    store: S,
}

impl<S: Store> AccountService<S> {
    /// Creates a new account service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a local account.
    #[tracing::instrument(skip(self, signup), fields(username = %signup.username))]
    pub async fn signup(&self, signup: Signup) -> Result<User, DomainError> {
        if signup.username.trim().len() < MIN_USERNAME_LEN {
            return Err(DomainError::UsernameTooShort {
                min: MIN_USERNAME_LEN,
            });
        }
        if signup.email.trim().is_empty() {
            return Err(DomainError::MissingField("email"));
        }
        if signup.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        let username_taken = self
            .store
            .get_user_by_username(&signup.username)
            .await?
            .is_some();
        let email_taken = self.store.get_user_by_email(&signup.email).await?.is_some();
        if username_taken || email_taken {
            return Err(DomainError::UserExists);
        }

        let user = User::new(
            signup.username,
            signup.email,
            Some(hash_password(&signup.password)?),
        );
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Verifies a local login.
    ///
    /// Accounts created through a social identity provider carry no
    /// password hash and cannot log in locally.
    #[tracing::instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: Credentials) -> Result<User, DomainError> {
        let user = self
            .store
            .get_user_by_username(&credentials.username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(DomainError::InvalidCredentials)?;
        if !verify_password(&credentials.password, hash) {
            return Err(DomainError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Updates username, email, and optionally the password.
    #[tracing::instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_profile(
        &self,
        user: &User,
        update: UpdateProfile,
    ) -> Result<User, DomainError> {
        if update.username.trim().len() < MIN_USERNAME_LEN {
            return Err(DomainError::UsernameTooShort {
                min: MIN_USERNAME_LEN,
            });
        }
        if update.email.trim().is_empty() {
            return Err(DomainError::MissingField("email"));
        }

        if update.username != user.username
            && self
                .store
                .get_user_by_username(&update.username)
                .await?
                .is_some()
        {
            return Err(DomainError::UsernameTaken);
        }
        if update.email != user.email
            && self.store.get_user_by_email(&update.email).await?.is_some()
        {
            return Err(DomainError::EmailTaken);
        }

        let mut updated = user.clone();
        updated.username = update.username;
        updated.email = update.email;

        if let Some(new_password) = update.new_password.as_deref() {
            let current = update
                .current_password
                .as_deref()
                .ok_or(DomainError::MissingField("currentPassword"))?;
            let hash = user
                .password_hash
                .as_deref()
                .ok_or(DomainError::InvalidCredentials)?;
            if !verify_password(current, hash) {
                return Err(DomainError::InvalidCredentials);
            }
            if new_password.len() < MIN_PASSWORD_LEN {
                return Err(DomainError::PasswordTooShort {
                    min: MIN_PASSWORD_LEN,
                });
            }
            updated.password_hash = Some(hash_password(new_password)?);
        }

        if !self.store.update_user(&updated).await? {
            return Err(DomainError::UserNotFound);
        }
        Ok(updated)
    }

    /// Creates the admin account unless one already exists.
    ///
    /// Returns None when an admin is already on record.
    #[tracing::instrument(skip(self, password))]
    pub async fn seed_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        if self.store.admin_exists().await? {
            return Ok(None);
        }
        let mut admin = User::new(username, email, Some(hash_password(password)?));
        admin.role = Role::Admin;
        self.store.insert_user(&admin).await?;
        tracing::info!(user_id = %admin.id, "admin account created");
        Ok(Some(admin))
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
