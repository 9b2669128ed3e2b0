//! Session Sync Codes
//!
//! Short one-shot codes that carry a login to another device. A code is
//! good for 24 hours and for exactly one redemption.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};
use crate::store::{KeyValueStore, StoreExt, StoreKey};

const CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncCodeRecord {
    pub username: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SyncCodeRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// What a successful redemption hands back
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemedSession {
    pub username: String,
    pub profile_photo: Option<String>,
}

/// Listing entry for an unexpired code
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActiveCode {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

type CodeTable = BTreeMap<String, SyncCodeRecord>;

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

pub struct SyncCodes {
    store: Arc<dyn KeyValueStore>,
    ttl: TimeDelta,
}

impl SyncCodes {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: TimeDelta::hours(24),
        }
    }

    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a new code for `username`, purging expired ones first
    pub fn create(&self, username: &str, profile_photo: Option<String>) -> Result<String> {
        let now = Utc::now();
        let record = SyncCodeRecord {
            username: username.to_string(),
            profile_photo,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let code = self.store.update_json(&StoreKey::SyncCodes, |codes: &mut CodeTable| {
            codes.retain(|_, r| !r.is_expired(now));
            let code = std::iter::repeat_with(generate_code)
                .find(|c| !codes.contains_key(c))
                .unwrap_or_default();
            codes.insert(code.clone(), record);
            Ok(code)
        })?;

        tracing::info!(username, "sync code issued");
        Ok(code)
    }

    /// Use a code. Valid codes are consumed; expired codes are deleted and
    /// reported as expired.
    pub fn redeem(&self, code: &str) -> Result<RedeemedSession> {
        let code = code.trim().to_uppercase();
        let now = Utc::now();

        let outcome = self.store.update_json(&StoreKey::SyncCodes, |codes: &mut CodeTable| {
            let Some(record) = codes.remove(&code) else {
                return Err(AccountError::SyncCodeInvalid);
            };
            if record.is_expired(now) {
                return Ok(Err(AccountError::SyncCodeExpired));
            }
            Ok(Ok(RedeemedSession {
                username: record.username,
                profile_photo: record.profile_photo,
            }))
        })?;

        if let Ok(session) = &outcome {
            tracing::info!(username = %session.username, "sync code redeemed");
        }
        outcome
    }

    /// Unexpired codes, keyed by code
    pub fn active(&self) -> Result<BTreeMap<String, ActiveCode>> {
        let now = Utc::now();
        let codes: CodeTable = self.store.load_json(&StoreKey::SyncCodes)?.unwrap_or_default();
        Ok(codes
            .into_iter()
            .filter(|(_, r)| r.expires_at > now)
            .map(|(code, r)| {
                (
                    code,
                    ActiveCode {
                        username: r.username,
                        created_at: r.created_at,
                        expires_at: r.expires_at,
                    },
                )
            })
            .collect())
    }

    /// Delete one code; returns whether it existed
    pub fn revoke(&self, code: &str) -> Result<bool> {
        let code = code.trim().to_uppercase();
        self.store
            .update_json(&StoreKey::SyncCodes, |codes: &mut CodeTable| Ok(codes.remove(&code).is_some()))
    }

    pub fn revoke_all(&self) -> Result<()> {
        self.store.delete(&StoreKey::SyncCodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn codes() -> SyncCodes {
        SyncCodes::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_code_shape() {
        let code = codes().create("alice", None).unwrap();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_redeem_is_one_shot() {
        let sync = codes();
        let code = sync.create("alice", Some("avatar.png".into())).unwrap();

        let session = sync.redeem(&code.to_lowercase()).unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.profile_photo.as_deref(), Some("avatar.png"));

        assert!(matches!(sync.redeem(&code), Err(AccountError::SyncCodeInvalid)));
    }

    #[test]
    fn test_expired_code_is_reported_then_gone() {
        let sync = codes().with_ttl(TimeDelta::seconds(-1));
        let code = sync.create("bob", None).unwrap();

        assert!(sync.active().unwrap().is_empty());
        assert!(matches!(sync.redeem(&code), Err(AccountError::SyncCodeExpired)));
        assert!(matches!(sync.redeem(&code), Err(AccountError::SyncCodeInvalid)));
    }

    #[test]
    fn test_create_purges_expired() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let stale = SyncCodes::new(Arc::clone(&store)).with_ttl(TimeDelta::seconds(-1));
        stale.create("old", None).unwrap();

        let fresh = SyncCodes::new(Arc::clone(&store));
        fresh.create("new", None).unwrap();

        let table: CodeTable = store.load_json(&StoreKey::SyncCodes).unwrap().unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.values().all(|r| r.username == "new"));
    }

    #[test]
    fn test_revoke() {
        let sync = codes();
        let a = sync.create("a", None).unwrap();
        let _b = sync.create("b", None).unwrap();

        assert!(sync.revoke(&a).unwrap());
        assert!(!sync.revoke(&a).unwrap());
        assert_eq!(sync.active().unwrap().len(), 1);

        sync.revoke_all().unwrap();
        assert!(sync.active().unwrap().is_empty());
    }
}
