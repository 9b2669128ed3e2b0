//! Accounts
//!
//! Username/password accounts with a single active session, persisted in
//! the key-value store. Passwords are stored as Argon2id PHC strings.
//!
//! This is demo-grade auth for a single-tenant dashboard, not a security
//! boundary: anyone with the store file has every account.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};
use crate::store::{KeyValueStore, StoreExt, StoreKey};

const MAX_SUGGESTIONS: usize = 5;
const BASE_MAX_LEN: usize = 15;
const SUFFIXES: [&str; 5] = ["_x", "_dev", "_crypto", "_ai", "_pro"];

/// Stored account record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The logged-in user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

type UserTable = HashMap<String, UserProfile>;

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| AccountError::Hashing(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AccountError::Hashing(e.to_string())),
    }
}

fn normalize_username(username: &str) -> Result<String> {
    let name = username.trim().to_lowercase();
    if name.is_empty() {
        return Err(AccountError::InvalidInput("username is required".into()));
    }
    Ok(name)
}

/// Up to five free usernames derived from `base`: numbered first, then
/// fixed suffixes
fn suggestions_for(users: &UserTable, base: &str) -> Vec<String> {
    let mut normalized: String = base
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .take(BASE_MAX_LEN)
        .collect();
    if normalized.is_empty() {
        normalized = "user".into();
    }

    let numbered = (1..=MAX_SUGGESTIONS).map(|i| format!("{normalized}{i}"));
    let suffixed = SUFFIXES.iter().map(|s| format!("{normalized}{s}"));

    numbered
        .chain(suffixed)
        .filter(|candidate| !users.contains_key(candidate))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Signup, login and the current session
pub struct AuthService {
    store: Arc<dyn KeyValueStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn users(&self) -> Result<UserTable> {
        Ok(self.store.load_json(&StoreKey::Users)?.unwrap_or_default())
    }

    /// Create an account and log it in
    pub fn signup(&self, username: &str, password: &str) -> Result<SessionUser> {
        let name = normalize_username(username)?;
        if password.is_empty() {
            return Err(AccountError::InvalidInput("password is required".into()));
        }

        let password_hash = hash_password(password)?;
        self.store.update_json(&StoreKey::Users, |users: &mut UserTable| {
            if users.contains_key(&name) {
                return Err(AccountError::UsernameTaken {
                    suggestions: suggestions_for(users, &name),
                });
            }
            users.insert(
                name.clone(),
                UserProfile {
                    username: name.clone(),
                    password_hash,
                    created_at: Utc::now(),
                },
            );
            Ok(())
        })?;

        tracing::info!(username = %name, "account created");
        self.start_session(name)
    }

    /// Check credentials and log in
    pub fn login(&self, username: &str, password: &str) -> Result<SessionUser> {
        let name = username.trim().to_lowercase();
        let users = self.users()?;
        let profile = users.get(&name).ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &profile.password_hash)? {
            tracing::warn!(username = %name, "failed login");
            return Err(AccountError::InvalidCredentials);
        }
        self.start_session(name)
    }

    /// Log in without a password, after redeeming a sync code
    pub fn resume_session(&self, username: &str) -> Result<SessionUser> {
        let name = normalize_username(username)?;
        if !self.users()?.contains_key(&name) {
            return Err(AccountError::InvalidCredentials);
        }
        self.start_session(name)
    }

    fn start_session(&self, username: String) -> Result<SessionUser> {
        let user = SessionUser { username };
        self.store.save_json(&StoreKey::Session, &user)?;
        Ok(user)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.delete(&StoreKey::Session)
    }

    /// Current session, `None` when logged out or unreadable
    pub fn session_user(&self) -> Result<Option<SessionUser>> {
        self.store.load_json(&StoreKey::Session)
    }

    pub fn suggest_usernames(&self, base: &str) -> Result<Vec<String>> {
        Ok(suggestions_for(&self.users()?, base))
    }
}
