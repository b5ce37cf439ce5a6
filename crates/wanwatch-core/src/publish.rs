// ── Snapshot registry ──
//
// Latest snapshot per profile. Each slot is an `ArcSwapOption`, so a
// reader sees either the previous snapshot or the new one in full, never
// a partially written interface list. Every publish is also broadcast
// for consumers that follow changes.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::ProfileId;
use crate::model::Snapshot;

const UPDATE_CHANNEL_SIZE: usize = 64;

/// Process-wide store of the most recent snapshot for each profile.
///
/// Shared as `Arc<SnapshotRegistry>`; nothing reaches it by name.
pub struct SnapshotRegistry {
    slots: DashMap<ProfileId, ArcSwapOption<Snapshot>>,
    updates: broadcast::Sender<Arc<Snapshot>>,
}

impl Default for SnapshotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            slots: DashMap::new(),
            updates,
        }
    }

    /// Replace the profile's snapshot atomically and notify subscribers.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        debug!(
            profile = %snapshot.profile_id,
            primary = ?snapshot.resolution.primary_key,
            method = %snapshot.resolution.method,
            "publishing snapshot"
        );
        self.slots
            .entry(snapshot.profile_id.clone())
            .or_insert_with(ArcSwapOption::empty)
            .store(Some(Arc::clone(&snapshot)));
        // No receivers is fine: the slot still holds the value.
        let _ = self.updates.send(Arc::clone(&snapshot));
        snapshot
    }

    /// The latest snapshot for a profile, if one was ever published.
    pub fn current(&self, profile: &ProfileId) -> Option<Arc<Snapshot>> {
        self.slots.get(profile).and_then(|slot| slot.load_full())
    }

    /// Latest snapshots of every profile, ordered by profile id.
    pub fn all(&self) -> Vec<Arc<Snapshot>> {
        let mut snapshots: Vec<Arc<Snapshot>> = self
            .slots
            .iter()
            .filter_map(|slot| slot.value().load_full())
            .collect();
        snapshots.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        snapshots
    }

    /// Stream of every snapshot published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.updates.subscribe()
    }

    /// Drop a profile's slot.
    pub fn remove(&self, profile: &ProfileId) -> Option<Arc<Snapshot>> {
        self.slots
            .remove(profile)
            .and_then(|(_, slot)| slot.load_full())
    }
}
