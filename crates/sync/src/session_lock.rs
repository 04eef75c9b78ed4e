//! Heartbeat-based mutual exclusion for client-triggered bulk operations.
//!
//! Several browser sessions (or tabs) of the same origin can each ask for a
//! "sync all". The job claim protocol already makes concurrent workers safe;
//! this lock exists one layer up, so two sessions do not both *enqueue* the
//! same bulk fan-out. Lock state lives in a shared keyed store visible to
//! every session; a holder refreshes its heartbeat every second, and a lock
//! whose heartbeat goes stale is treated as abandoned and can be taken over.
//! Staleness detection is the correctness backstop for crashed holders -
//! teardown release is only best-effort.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::task::JoinHandle;

/// Heartbeat refresh interval.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// A lock whose heartbeat is older than this is considered abandoned.
const STALENESS_THRESHOLD_SECS: i64 = 5;

/// Poll interval while waiting to acquire.
const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default acquire timeout.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// One lock entry in the shared store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub owner_id: String,
    pub operation: String,
    pub acquired_at: DateTime<Utc>,
    pub heartbeat_at: DateTime<Utc>,
}

/// Shared keyed location holding lock entries, visible to all sessions of
/// the same origin.
pub trait LockStore: Send + Sync {
    fn read(&self, name: &str) -> Option<LockEntry>;
    fn write(&self, name: &str, entry: LockEntry);
    fn remove(&self, name: &str);
}

/// In-memory lock store; share one instance (via `Arc`) across the sessions
/// that must exclude each other.
#[derive(Default)]
pub struct InMemoryLockStore {
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, LockEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Lock store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl LockStore for InMemoryLockStore {
    fn read(&self, name: &str) -> Option<LockEntry> {
        self.lock_entries().get(name).cloned()
    }

    fn write(&self, name: &str, entry: LockEntry) {
        self.lock_entries().insert(name.to_string(), entry);
    }

    fn remove(&self, name: &str) {
        self.lock_entries().remove(name);
    }
}

/// Per-session lock service.
///
/// Each session constructs its own service over the shared store; the
/// service's unique owner id tags every entry it writes. Explicit service
/// object - no process-wide statics - so multiple simulated sessions can be
/// tested against one store.
pub struct SessionLockService {
    store: Arc<dyn LockStore>,
    owner_id: String,
    staleness: chrono::Duration,
    heartbeat_interval: Duration,
    heartbeats: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl SessionLockService {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self::with_config(
            store,
            chrono::Duration::seconds(STALENESS_THRESHOLD_SECS),
            HEARTBEAT_INTERVAL,
        )
    }

    pub fn with_config(
        store: Arc<dyn LockStore>,
        staleness: chrono::Duration,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            store,
            owner_id: uuid::Uuid::new_v4().to_string(),
            staleness,
            heartbeat_interval,
            heartbeats: Mutex::new(HashMap::new()),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn lock_heartbeats(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.heartbeats.lock().unwrap_or_else(|poisoned| {
            warn!("Heartbeat registry mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn is_held_by_other(&self, entry: &LockEntry) -> bool {
        entry.owner_id != self.owner_id && Utc::now() - entry.heartbeat_at < self.staleness
    }

    /// Try to take the lock once.
    ///
    /// Succeeds when no entry exists, the existing entry's heartbeat is
    /// stale, or this session already holds it. After writing, the entry is
    /// re-read to verify no other session won a write race.
    pub fn try_acquire(&self, name: &str, operation: &str) -> bool {
        if let Some(existing) = self.store.read(name) {
            if self.is_held_by_other(&existing) {
                return false;
            }
            if existing.owner_id != self.owner_id {
                debug!(
                    "Taking over stale lock '{}' from {} (operation: {})",
                    name, existing.owner_id, existing.operation
                );
            }
        }

        let now = Utc::now();
        self.store.write(
            name,
            LockEntry {
                owner_id: self.owner_id.clone(),
                operation: operation.to_string(),
                acquired_at: now,
                heartbeat_at: now,
            },
        );

        // Verify we actually won: another session may have written between
        // our read and write.
        match self.store.read(name) {
            Some(entry) if entry.owner_id == self.owner_id => {}
            _ => return false,
        }

        self.start_heartbeat(name);
        true
    }

    /// Poll [`Self::try_acquire`] until it succeeds or the timeout elapses.
    pub async fn acquire(&self, name: &str, operation: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.try_acquire(name, operation) {
                return true;
            }
            if tokio::time::Instant::now() + ACQUIRE_POLL_INTERVAL > deadline {
                return false;
            }
            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    /// Release the lock, but only if this session is the current owner.
    pub fn release(&self, name: &str) {
        if let Some(handle) = self.lock_heartbeats().remove(name) {
            handle.abort();
        }

        match self.store.read(name) {
            Some(entry) if entry.owner_id == self.owner_id => self.store.remove(name),
            Some(_) => debug!("Not releasing lock '{}': owned by another session", name),
            None => {}
        }
    }

    /// Best-effort teardown: release every lock this session holds.
    pub fn release_all(&self) {
        let names: Vec<String> = self.lock_heartbeats().keys().cloned().collect();
        for name in names {
            self.release(&name);
        }
    }

    fn start_heartbeat(&self, name: &str) {
        let mut heartbeats = self.lock_heartbeats();
        if let Some(previous) = heartbeats.remove(name) {
            previous.abort();
        }

        let store = self.store.clone();
        let owner_id = self.owner_id.clone();
        let name_owned = name.to_string();
        let interval = self.heartbeat_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                match store.read(&name_owned) {
                    Some(mut entry) if entry.owner_id == owner_id => {
                        entry.heartbeat_at = Utc::now();
                        store.write(&name_owned, entry);
                    }
                    // Lost or released: stop refreshing.
                    _ => return,
                }
            }
        });

        heartbeats.insert(name.to_string(), handle);
    }
}

impl Drop for SessionLockService {
    fn drop(&mut self) {
        // Abort heartbeats and drop owned entries so a cleanly dropped
        // session frees its locks immediately instead of via staleness.
        if let Ok(mut heartbeats) = self.heartbeats.lock() {
            for (name, handle) in heartbeats.drain() {
                handle.abort();
                if let Some(entry) = self.store.read(&name) {
                    if entry.owner_id == self.owner_id {
                        self.store.remove(&name);
                    }
                }
            }
        }
    }
}
