// File: rolegate-core/src/verification/store.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use rolegate_common::models::verification::{VerificationChallenge, VerificationKind};
use rolegate_common::traits::clock::Clock;
use rolegate_common::traits::repository_traits::ChallengePersistence;

/// Pending challenges for one verification kind, keyed by requester id.
///
/// The in-memory map is authoritative for the life of the process. Every
/// mutation writes a full snapshot through the persistence backend; a failed
/// write is logged and otherwise ignored.
pub struct VerificationStore {
    kind: VerificationKind,
    entries: Mutex<HashMap<String, VerificationChallenge>>,
    persistence: Arc<dyn ChallengePersistence>,
    clock: Arc<dyn Clock>,
}

impl VerificationStore {
    /// Creates an empty store. Call `load` to pull in persisted state.
    pub fn new(
        kind: VerificationKind,
        persistence: Arc<dyn ChallengePersistence>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
            persistence,
            clock,
        }
    }

    pub fn kind(&self) -> VerificationKind {
        self.kind
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Replaces the in-memory map with the persisted one, dropping entries
    /// whose `issued_at` is already past the timeout. Returns how many were kept.
    pub async fn load(&self) -> usize {
        let saved = match self.persistence.load().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Could not load {} verification map, starting empty: {}", self.kind, e);
                HashMap::new()
            }
        };

        let now = self.clock.now();
        let total = saved.len();
        let live: HashMap<String, VerificationChallenge> = saved
            .into_iter()
            .filter(|(_, ch)| ch.is_live_at(now))
            .collect();
        let kept = live.len();

        *self.entries.lock().await = live;
        info!(
            "Loaded {} active {}-access verification mappings ({} expired dropped)",
            kept,
            self.kind,
            total - kept
        );
        kept
    }

    pub async fn get(&self, requester_id: &str) -> Option<VerificationChallenge> {
        self.entries.lock().await.get(requester_id).cloned()
    }

    /// Overwrites whatever is stored for `requester_id`, then persists.
    pub async fn put(&self, requester_id: &str, challenge: VerificationChallenge) {
        let mut entries = self.entries.lock().await;
        entries.insert(requester_id.to_string(), challenge);
        self.persist(&entries).await;
    }

    /// Removes the entry and persists if there was one.
    pub async fn delete(&self, requester_id: &str) -> Option<VerificationChallenge> {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(requester_id);
        if removed.is_some() {
            self.persist(&entries).await;
        }
        removed
    }

    /// Drops every expired challenge. Persists only when something was removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, ch| ch.is_live_at(now));
        let cleaned = before - entries.len();

        if cleaned > 0 {
            info!("Cleaned {} expired {}-access verification codes", cleaned, self.kind);
            self.persist(&entries).await;
        } else {
            debug!("No expired {}-access verification codes", self.kind);
        }
        cleaned
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    // Called with the map lock held so snapshots hit the backend in mutation order.
    async fn persist(&self, entries: &HashMap<String, VerificationChallenge>) {
        if let Err(e) = self.persistence.save(entries).await {
            warn!("Error saving {}-access verification map: {}", self.kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::test_utils::helpers::{ManualClock, MemoryPersistence};

    fn challenge(clock: &ManualClock, account: u64) -> VerificationChallenge {
        VerificationChallenge {
            code: format!("HALF-VERIFY-{account:08}"),
            issued_at: clock.now(),
            claimed_account_id: account,
            claimed_account_label: format!("user{account}"),
            verified: false,
        }
    }

    fn store_with(persistence: Arc<MemoryPersistence>, clock: Arc<ManualClock>) -> VerificationStore {
        VerificationStore::new(VerificationKind::Half, persistence, clock)
    }

    #[tokio::test]
    async fn test_put_and_delete_persist_snapshots() {
        let clock = Arc::new(ManualClock::default());
        let persistence = Arc::new(MemoryPersistence::default());
        let store = store_with(persistence.clone(), clock.clone());

        store.put("100", challenge(&clock, 1)).await;
        assert_eq!(persistence.save_count(), 1);
        assert!(persistence.snapshot().contains_key("100"));

        assert!(store.delete("100").await.is_some());
        assert_eq!(persistence.save_count(), 2);
        assert!(persistence.snapshot().is_empty());

        // deleting nothing does not write
        assert!(store.delete("100").await.is_none());
        assert_eq!(persistence.save_count(), 2);
    }

    #[tokio::test]
    async fn test_load_discards_entries_expired_during_downtime() {
        let clock = Arc::new(ManualClock::default());
        let persistence = Arc::new(MemoryPersistence::default());

        let mut seeded = HashMap::new();
        let mut old = challenge(&clock, 1);
        old.issued_at = clock.now() - Duration::minutes(30);
        seeded.insert("stale".to_string(), old);
        let mut recent = challenge(&clock, 2);
        recent.issued_at = clock.now() - Duration::minutes(3);
        seeded.insert("fresh".to_string(), recent);
        persistence.seed(seeded);

        let store = store_with(persistence, clock);
        assert_eq!(store.load().await, 1);
        assert!(store.get("stale").await.is_none());
        assert!(store.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_purge_expired_counts_and_persists_once() {
        let clock = Arc::new(ManualClock::default());
        let persistence = Arc::new(MemoryPersistence::default());
        let store = store_with(persistence.clone(), clock.clone());

        store.put("a", challenge(&clock, 1)).await;
        clock.advance(Duration::minutes(6));
        store.put("b", challenge(&clock, 2)).await;
        let saves_before = persistence.save_count();

        assert_eq!(store.purge_expired().await, 0);
        assert_eq!(persistence.save_count(), saves_before);

        clock.advance(Duration::minutes(5));
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(persistence.save_count(), saves_before + 1);
        assert!(store.get("a").await.is_none());
        assert!(store.get("b").await.is_some());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_state() {
        let clock = Arc::new(ManualClock::default());
        let persistence = Arc::new(MemoryPersistence::failing());
        let store = store_with(persistence.clone(), clock.clone());

        store.put("a", challenge(&clock, 1)).await;
        assert_eq!(store.get("a").await.map(|c| c.claimed_account_id), Some(1));
        assert!(persistence.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_starts_empty() {
        let clock = Arc::new(ManualClock::default());
        let persistence = Arc::new(MemoryPersistence::failing());
        let store = store_with(persistence, clock);
        assert_eq!(store.load().await, 0);
        assert!(store.is_empty().await);
    }
}
