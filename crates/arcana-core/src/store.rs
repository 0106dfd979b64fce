//! Premium token store: a single-use opaque token mapping to one captured
//! submission snapshot.
//!
//! Invariants: `load` after `delete` reports not-found, and `redeem` is
//! load+delete as one logically atomic operation per token — two concurrent
//! redemptions of the same token cannot both observe a value. Expired tokens
//! vanish: indistinguishable from tokens that never existed.

use crate::error::{ReportError, ReportResult};
use crate::submission::Submission;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

const TOKENS_TREE: &str = "premium_tokens";

/// Token row: the submission snapshot plus its expiry deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    submission: Submission,
    expires_at_ms: u64,
}

impl StoredToken {
    fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Storage interface for premium tokens. Core logic depends only on this
/// trait, never on the backing technology.
pub trait TokenStore: Send + Sync {
    /// Associates `token` with a submission snapshot, valid for `ttl_ms`.
    fn save(&self, token: &str, submission: &Submission, ttl_ms: u64) -> ReportResult<()>;

    /// Non-consuming lookup. Expired or unknown tokens are `None`.
    fn load(&self, token: &str) -> ReportResult<Option<Submission>>;

    /// Removes the token. Idempotent.
    fn delete(&self, token: &str) -> ReportResult<()>;

    /// Atomic load-and-delete: at most one caller observes a value per token.
    fn redeem(&self, token: &str) -> ReportResult<Option<Submission>>;
}

/// Sled-backed store. Atomic redeem rides on `Tree::remove` returning the
/// prior value in one operation.
pub struct SledTokenStore {
    tree: sled::Tree,
}

impl SledTokenStore {
    /// Opens (or creates) the token DB at `path`, e.g. `./data/arcana_tokens`.
    pub fn open_path(path: &Path) -> ReportResult<Self> {
        let db = sled::open(path)?;
        let tree = db.open_tree(TOKENS_TREE)?;
        Ok(Self { tree })
    }

    fn decode(&self, token: &str, bytes: &[u8]) -> ReportResult<Option<Submission>> {
        let row: StoredToken = serde_json::from_slice(bytes)
            .map_err(|e| ReportError::Store(format!("corrupt token row: {}", e)))?;
        if row.expired(now_ms()) {
            tracing::debug!(target: "arcana::store", token, "Expired token vanished");
            return Ok(None);
        }
        Ok(Some(row.submission))
    }
}

impl TokenStore for SledTokenStore {
    fn save(&self, token: &str, submission: &Submission, ttl_ms: u64) -> ReportResult<()> {
        let row = StoredToken {
            submission: submission.clone(),
            expires_at_ms: now_ms().saturating_add(ttl_ms),
        };
        let bytes = serde_json::to_vec(&row)?;
        self.tree.insert(token.as_bytes(), bytes)?;
        Ok(())
    }

    fn load(&self, token: &str) -> ReportResult<Option<Submission>> {
        match self.tree.get(token.as_bytes())? {
            None => Ok(None),
            Some(bytes) => {
                let decoded = self.decode(token, &bytes)?;
                if decoded.is_none() {
                    // Lazy sweep: expired rows are removed on first touch.
                    self.tree.remove(token.as_bytes())?;
                }
                Ok(decoded)
            }
        }
    }

    fn delete(&self, token: &str) -> ReportResult<()> {
        self.tree.remove(token.as_bytes())?;
        Ok(())
    }

    fn redeem(&self, token: &str) -> ReportResult<Option<Submission>> {
        match self.tree.remove(token.as_bytes())? {
            None => Ok(None),
            Some(bytes) => self.decode(token, &bytes),
        }
    }
}

/// In-memory store for tests and dev runs. Same semantics behind a mutex.
#[derive(Default)]
pub struct MemoryTokenStore {
    rows: Mutex<HashMap<String, StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ReportResult<std::sync::MutexGuard<'_, HashMap<String, StoredToken>>> {
        self.rows.lock().map_err(|_| ReportError::Store("token store lock poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str, submission: &Submission, ttl_ms: u64) -> ReportResult<()> {
        let row = StoredToken {
            submission: submission.clone(),
            expires_at_ms: now_ms().saturating_add(ttl_ms),
        };
        self.lock()?.insert(token.to_string(), row);
        Ok(())
    }

    fn load(&self, token: &str) -> ReportResult<Option<Submission>> {
        let mut rows = self.lock()?;
        match rows.get(token) {
            None => Ok(None),
            Some(row) if row.expired(now_ms()) => {
                rows.remove(token);
                Ok(None)
            }
            Some(row) => Ok(Some(row.submission.clone())),
        }
    }

    fn delete(&self, token: &str) -> ReportResult<()> {
        self.lock()?.remove(token);
        Ok(())
    }

    fn redeem(&self, token: &str) -> ReportResult<Option<Submission>> {
        let mut rows = self.lock()?;
        match rows.remove(token) {
            Some(row) if !row.expired(now_ms()) => Ok(Some(row.submission)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 60_000;

    fn submission() -> Submission {
        let mut sub = Submission::default();
        sub.set("email", "x@y.com");
        sub.set("question", "Will I find love?");
        sub
    }

    fn check_semantics(store: &dyn TokenStore) {
        // save / load / delete / load
        store.save("t1", &submission(), TTL).unwrap();
        assert!(store.load("t1").unwrap().is_some());
        store.delete("t1").unwrap();
        assert!(store.load("t1").unwrap().is_none());

        // redeem consumes exactly once
        store.save("t2", &submission(), TTL).unwrap();
        let first = store.redeem("t2").unwrap();
        assert_eq!(first.unwrap().field("email"), "x@y.com");
        assert!(store.redeem("t2").unwrap().is_none());
        assert!(store.load("t2").unwrap().is_none());

        // expired tokens vanish
        store.save("t3", &submission(), 0).unwrap();
        assert!(store.load("t3").unwrap().is_none());
        store.save("t4", &submission(), 0).unwrap();
        assert!(store.redeem("t4").unwrap().is_none());

        // unknown token
        assert!(store.load("never-existed").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_semantics() {
        check_semantics(&MemoryTokenStore::new());
    }

    #[test]
    fn test_sled_store_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledTokenStore::open_path(dir.path()).unwrap();
        check_semantics(&store);
    }

    #[test]
    fn test_sled_load_sweeps_expired_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledTokenStore::open_path(dir.path()).unwrap();
        store.save("t", &submission(), 0).unwrap();
        assert!(store.load("t").unwrap().is_none());
        // The row is physically gone after the lazy sweep.
        assert!(store.tree.get(b"t").unwrap().is_none());
    }
}
