//! In-memory index of the durable tier with lazily materialized values.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::storage::DiskHandle;

/// A durable-tier value: either materialized in memory or only on disk.
#[derive(Debug, Clone)]
pub enum LazyValue<V> {
    /// Value is in memory; `touched` is the last access.
    Resident {
        value: V,
        handle: DiskHandle,
        touched: Instant,
    },
    /// Value must be re-read from its entry file before use.
    OnDisk(DiskHandle),
}

impl<V> LazyValue<V> {
    /// Location of the backing entry file.
    pub fn handle(&self) -> &DiskHandle {
        match self {
            LazyValue::Resident { handle, .. } => handle,
            LazyValue::OnDisk(handle) => handle,
        }
    }

    pub fn is_resident(&self) -> bool {
        matches!(self, LazyValue::Resident { .. })
    }

    /// Demotes a resident value untouched for at least `timeout`. Returns `true` if demoted.
    pub fn demote_if_idle(&mut self, now: Instant, timeout: Duration) -> bool {
        let idle = match self {
            LazyValue::Resident { touched, .. } => {
                now.saturating_duration_since(*touched) >= timeout
            }
            LazyValue::OnDisk(_) => false,
        };
        if idle {
            let handle = self.handle().clone();
            *self = LazyValue::OnDisk(handle);
        }
        idle
    }
}

/// Outcome of probing the index for a key.
#[derive(Debug)]
pub enum Probe<V> {
    Missing,
    Resident(V),
    OnDisk { segment: u64 },
}

/// Key index plus segment membership.
///
/// New keys fill the open segment until it holds `entities_per_segment` members, then a
/// new segment is opened. Overwrites keep their original segment.
#[derive(Debug)]
pub struct TierState<K, V> {
    index: HashMap<K, LazyValue<V>>,
    segments: BTreeMap<u64, HashSet<K>>,
    open_segment: u64,
    entities_per_segment: usize,
}

impl<K, V> TierState<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(entities_per_segment: usize) -> Self {
        Self {
            index: HashMap::new(),
            segments: BTreeMap::new(),
            open_segment: 0,
            entities_per_segment: entities_per_segment.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn resident_count(&self) -> usize {
        self.index.values().filter(|v| v.is_resident()).count()
    }

    pub fn open_segment(&self) -> u64 {
        self.open_segment
    }

    /// Returns the existing handle of `key`.
    pub fn handle_of(&self, key: &K) -> Option<DiskHandle> {
        self.index.get(key).map(|slot| slot.handle().clone())
    }

    /// Returns the handle `key` would be written under, without recording anything.
    pub fn handle_for(&self, key: &K, fingerprint: String) -> DiskHandle {
        match self.index.get(key) {
            Some(slot) => slot.handle().clone(),
            None => DiskHandle::new(self.placement_segment(), fingerprint),
        }
    }

    fn placement_segment(&self) -> u64 {
        let filled = self
            .segments
            .get(&self.open_segment)
            .map_or(0, HashSet::len);
        if filled >= self.entities_per_segment {
            self.open_segment + 1
        } else {
            self.open_segment
        }
    }

    fn join_segment(&mut self, key: &K, segment: u64) {
        self.segments
            .entry(segment)
            .or_default()
            .insert(key.clone());
        self.open_segment = self.open_segment.max(segment);
    }

    /// Records a value that was just written under `handle`.
    pub fn insert_resident(&mut self, key: K, handle: DiskHandle, value: V, now: Instant) {
        if !self.index.contains_key(&key) {
            self.join_segment(&key, handle.segment());
        }
        self.index.insert(
            key,
            LazyValue::Resident {
                value,
                handle,
                touched: now,
            },
        );
    }

    /// Records a key found on disk at open time.
    ///
    /// A key present in two segments is a remove followed by a re-put that both hit disk;
    /// the higher segment holds the newer value. Returns the handle that lost, if any.
    pub fn insert_on_disk(&mut self, key: K, handle: DiskHandle) -> Option<DiskHandle> {
        let stale = match self.index.get(&key) {
            None => None,
            Some(existing) if existing.handle().segment() >= handle.segment() => {
                return Some(handle);
            }
            Some(existing) => Some(existing.handle().clone()),
        };

        if let Some(old) = &stale {
            self.leave_segment(&key, old.segment());
        }
        self.join_segment(&key, handle.segment());
        self.index.insert(key, LazyValue::OnDisk(handle));
        stale
    }

    fn leave_segment(&mut self, key: &K, segment: u64) {
        if let Some(members) = self.segments.get_mut(&segment) {
            members.remove(key);
            if members.is_empty() && segment != self.open_segment {
                self.segments.remove(&segment);
            }
        }
    }

    /// Removes `key`, returning its handle.
    pub fn remove(&mut self, key: &K) -> Option<DiskHandle> {
        let handle = self.index.remove(key)?.handle().clone();
        self.leave_segment(key, handle.segment());
        Some(handle)
    }

    /// Forgets every member of `segment`. Returns how many keys were dropped.
    pub fn drop_segment(&mut self, segment: u64) -> usize {
        let Some(members) = self.segments.remove(&segment) else {
            return 0;
        };
        for key in &members {
            self.index.remove(key);
        }
        members.len()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.segments.clear();
        self.open_segment = 0;
    }

    /// Looks up `key`, refreshing its idle timer when resident.
    pub fn probe(&mut self, key: &K, now: Instant) -> Probe<V> {
        match self.index.get_mut(key) {
            None => Probe::Missing,
            Some(LazyValue::Resident { value, touched, .. }) => {
                *touched = now;
                Probe::Resident(value.clone())
            }
            Some(LazyValue::OnDisk(handle)) => Probe::OnDisk {
                segment: handle.segment(),
            },
        }
    }

    /// Members of `segment` whose values are only on disk.
    pub fn on_disk_members(&self, segment: u64) -> Vec<(K, DiskHandle)> {
        let Some(members) = self.segments.get(&segment) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|key| match self.index.get(key) {
                Some(LazyValue::OnDisk(handle)) => Some((key.clone(), handle.clone())),
                _ => None,
            })
            .collect()
    }

    /// Replaces an on-disk slot with its loaded value. Resident slots are left alone.
    pub fn materialize(&mut self, key: &K, value: V, now: Instant) {
        if let Some(slot) = self.index.get_mut(key)
            && let LazyValue::OnDisk(handle) = &*slot
        {
            let handle = handle.clone();
            *slot = LazyValue::Resident {
                value,
                handle,
                touched: now,
            };
        }
    }

    /// Demotes every resident value idle for at least `timeout`. Returns the count.
    pub fn demote_idle(&mut self, now: Instant, timeout: Duration) -> usize {
        let mut demoted = 0;
        for slot in self.index.values_mut() {
            if slot.demote_if_idle(now, timeout) {
                demoted += 1;
            }
        }
        demoted
    }

    /// Segment ids with at least one member, ascending.
    pub fn segment_ids(&self) -> Vec<u64> {
        self.segments
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Resident `(key, value)` pairs of `segment`.
    pub fn resident_entries(&self, segment: u64) -> Vec<(K, V)> {
        let Some(members) = self.segments.get(&segment) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|key| match self.index.get(key) {
                Some(LazyValue::Resident { value, .. }) => Some((key.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }
}
