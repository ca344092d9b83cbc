//! User registration, password login and bearer-token authentication.

mod store;
mod token;

pub use store::{CredentialStore, MemoryCredentialStore, UserRecord};
pub use token::{Claims, TokenError, TokenSigner};

use crate::config::AuthConfig;
use serde::Serialize;
use std::sync::Arc;

/// Secret used when none is provisioned. Development only.
const DEV_SECRET: &str = "typeshift-development-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username already registered")]
    DuplicateUser,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl AuthError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::DuplicateUser | Self::InvalidInput(_) => 400,
            Self::InvalidCredentials | Self::InvalidToken => 401,
            Self::Hashing(_) => 500,
        }
    }
}

/// Response body of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Registers users, checks passwords and issues/validates tokens.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    signer: TokenSigner,
    ttl_secs: u64,
    bcrypt_cost: u32,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        signer: TokenSigner,
        ttl_minutes: u64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            signer,
            ttl_secs: ttl_minutes.saturating_mul(60),
            bcrypt_cost,
        }
    }

    /// Build from config with an in-memory store.
    ///
    /// Falls back to a built-in secret, with a warning, when none is set.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = match config.secret.as_deref() {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    "No token secret configured (server.auth.secret or {}), using the built-in development secret",
                    crate::config::SECRET_ENV
                );
                DEV_SECRET
            }
        };

        Self::new(
            Arc::new(MemoryCredentialStore::new()),
            TokenSigner::new(secret, &config.previous_secrets),
            config.token_ttl_minutes,
            config.bcrypt_cost,
        )
    }

    /// Create a user. Blocks on bcrypt; call from a blocking context.
    pub fn register(&self, username: &str, password: &str, email: &str) -> Result<UserRecord, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("Username cannot be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("Password cannot be empty".into()));
        }
        if self.store.get(username).is_some() {
            return Err(AuthError::DuplicateUser);
        }

        let record = UserRecord {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: bcrypt::hash(password, self.bcrypt_cost)?,
            disabled: false,
        };
        if !self.store.insert(record.clone()) {
            return Err(AuthError::DuplicateUser);
        }

        tracing::info!(username = %record.username, "Registered user");
        Ok(record)
    }

    /// Check a password and issue a token. Blocks on bcrypt.
    pub fn login(&self, username: &str, password: &str) -> Result<AccessToken, AuthError> {
        let record = self
            .store
            .get(username.trim())
            .ok_or(AuthError::InvalidCredentials)?;

        match bcrypt::verify(password, &record.password_hash) {
            Ok(true) => Ok(self.issue_at(&record.username, now())),
            Ok(false) | Err(_) => Err(AuthError::InvalidCredentials),
        }
    }

    /// Issue a token for `username` as of `now` (Unix seconds).
    pub fn issue_at(&self, username: &str, now: u64) -> AccessToken {
        let claims = Claims {
            sub: username.to_string(),
            exp: now.saturating_add(self.ttl_secs),
        };
        AccessToken {
            access_token: self.signer.sign(&claims),
            token_type: "bearer",
        }
    }

    pub fn authenticate(&self, token: &str) -> Result<UserRecord, AuthError> {
        self.authenticate_at(token, now())
    }

    /// Validate a token as of `now` and resolve its subject.
    pub fn authenticate_at(&self, token: &str, now: u64) -> Result<UserRecord, AuthError> {
        let claims = self.signer.verify_at(token, now).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;
        self.store.get(&claims.sub).ok_or(AuthError::InvalidToken)
    }
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Generate a random token signing secret
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
