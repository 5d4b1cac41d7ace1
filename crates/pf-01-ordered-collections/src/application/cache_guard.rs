//! # Cache Consistency Guard
//!
//! Read-through caching whose entries can never outlive the mutation that
//! made them stale, even when several processes share one backend.
//!
//! ## Algorithm: Epoch-Tagged Scopes
//!
//! - Every scope has a current epoch, a random token stored in the backend
//!   under [`CacheScope::epoch_key`]. A reader that finds none writes a
//!   fresh one before computing anything.
//! - Read: render the key with the current epochs, serve a hit, otherwise
//!   compute. Populate only if none of the key's epochs changed while the
//!   factory ran.
//! - Invalidate: delete the epoch key of each scope. Keys rendered under the
//!   old epoch become unreachable, since tokens are never reused, and age
//!   out of the backend through its own TTL and eviction.
//!
//! A reader writes an epoch token before the store read it guards, and
//! invalidation deletes it after the commit, so a key reachable after a
//! mutation can only hold a value computed after that commit.
//!
//! The guard keeps no per-scope state of its own. Backend failures degrade
//! to computing the value; they never fail the read or the mutation.

use super::cache_keys::{CacheKey, CacheScope};
use crate::ports::outbound::CacheBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifetime of an epoch token; longer than any entry TTL.
const EPOCH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Epoch of one scope as seen by a read.
struct ScopeEpoch {
    token: String,
    /// Written by this read because the scope had none.
    created: bool,
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Populates dropped because a scope was invalidated mid-computation.
    pub skipped_populates: u64,
    pub invalidations: u64,
}

/// Guard around a [`CacheBackend`].
pub struct CacheConsistencyGuard {
    backend: Arc<dyn CacheBackend>,
    hits: AtomicU64,
    misses: AtomicU64,
    skipped_populates: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheConsistencyGuard {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            skipped_populates: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Serve `key` from cache, or compute it with `factory` and cache it for
    /// `ttl`.
    ///
    /// Factory errors propagate unchanged and are never cached.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        factory: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Send,
    {
        let epochs = match self.current_epochs(key).await {
            Some(epochs) => epochs,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return factory().await;
            }
        };
        let tokens: Vec<&str> = epochs.iter().map(|e| e.token.as_str()).collect();
        let rendered = key.render(&tokens);

        match self.backend.get(&rendered).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(err) => {
                    warn!(key = %rendered, error = %err, "Dropping undecodable cache entry");
                    if let Err(err) = self.backend.delete(&rendered).await {
                        warn!(key = %rendered, error = %err, "Cache delete failed");
                    }
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(key = %rendered, error = %err, "Cache read failed, computing value");
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = match factory().await {
            Ok(value) => value,
            Err(err) => {
                self.discard_created(key, &epochs).await;
                return Err(err);
            }
        };

        if !self.epochs_unchanged(key, &epochs).await {
            self.skipped_populates.fetch_add(1, Ordering::Relaxed);
            debug!(key = %rendered, "Scope invalidated during computation, not caching");
            return Ok(value);
        }

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(err) = self.backend.set(&rendered, raw, ttl).await {
                    warn!(key = %rendered, error = %err, "Cache write failed");
                }
            }
            Err(err) => warn!(key = %rendered, error = %err, "Value not cacheable"),
        }

        Ok(value)
    }

    /// Make every cached read that depends on any of `scopes` unreachable.
    ///
    /// The epoch deletes run on their own task, scheduled on the first poll,
    /// so a caller dropped after a commit cannot skip them.
    pub async fn invalidate(&self, scopes: &[CacheScope]) {
        self.invalidations
            .fetch_add(scopes.len() as u64, Ordering::Relaxed);

        let backend = self.backend.clone();
        let scopes = scopes.to_vec();
        let retire = tokio::spawn(async move {
            for scope in &scopes {
                retire_scope(backend.as_ref(), scope).await;
            }
            debug!(scopes = scopes.len(), "Invalidated cache scopes");
        });

        if let Err(err) = retire.await {
            warn!(error = %err, "Cache invalidation task failed");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            skipped_populates: self.skipped_populates.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Current epoch of each of the key's scopes, starting any that are
    /// missing. `None` when the backend cannot provide them.
    async fn current_epochs(&self, key: &CacheKey) -> Option<Vec<ScopeEpoch>> {
        let mut epochs = Vec::with_capacity(key.scopes().len());
        for scope in key.scopes() {
            let epoch_key = scope.epoch_key();
            let epoch = match self.backend.get(&epoch_key).await {
                Ok(Some(token)) => ScopeEpoch {
                    token,
                    created: false,
                },
                Ok(None) => {
                    let token = fresh_token();
                    if let Err(err) = self
                        .backend
                        .set(&epoch_key, token.clone(), EPOCH_TTL)
                        .await
                    {
                        warn!(scope = %scope, error = %err, "Cache epoch write failed, bypassing cache");
                        return None;
                    }
                    ScopeEpoch {
                        token,
                        created: true,
                    }
                }
                Err(err) => {
                    warn!(scope = %scope, error = %err, "Cache epoch read failed, bypassing cache");
                    return None;
                }
            };
            epochs.push(epoch);
        }
        Some(epochs)
    }

    async fn epochs_unchanged(&self, key: &CacheKey, epochs: &[ScopeEpoch]) -> bool {
        for (scope, epoch) in key.scopes().iter().zip(epochs) {
            match self.backend.get(&scope.epoch_key()).await {
                Ok(Some(token)) if token == epoch.token => {}
                _ => return false,
            }
        }
        true
    }

    /// Drop epochs this read started when it ends up caching nothing, so
    /// reads of unknown ids leave no trace in the backend.
    async fn discard_created(&self, key: &CacheKey, epochs: &[ScopeEpoch]) {
        for (scope, epoch) in key.scopes().iter().zip(epochs) {
            if !epoch.created {
                continue;
            }
            if let Err(err) = self.backend.delete(&scope.epoch_key()).await {
                warn!(scope = %scope, error = %err, "Cache epoch delete failed");
            }
        }
    }
}

fn fresh_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Forget the current epoch of `scope`; its next reader starts a fresh one.
async fn retire_scope(backend: &dyn CacheBackend, scope: &CacheScope) {
    if let Err(err) = backend.delete(&scope.epoch_key()).await {
        // Entries under the old epoch stay reachable until their TTL.
        warn!(scope = %scope, error = %err, "Cache epoch delete failed");
    }
}
