//! Ordered, thread-safe stream store.
//!
//! One [`StreamStore`] holds the readings of a single [`MeasurementKind`],
//! sorted by their [`ReadingKey`]. Stores are shared as `Arc<StreamStore>`:
//! exactly one producer writes to a store, any number of runners read from it.
//! Each operation takes the lock once, so inserts and tail queries are
//! individually atomic.

use std::collections::btree_map::{BTreeMap, Entry};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::reading::{self, MeasurementKind, Reading, ReadingKey};

/// Sorted container of readings of one kind.
pub struct StreamStore {
    kind: MeasurementKind,
    readings: RwLock<BTreeMap<ReadingKey, Reading>>,
}

impl StreamStore {
    /// Create an empty store for `kind`.
    pub fn new(kind: MeasurementKind) -> Self {
        Self {
            kind,
            readings: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    /// Insert a reading.
    ///
    /// Returns `false` and leaves the store unchanged when a reading with the
    /// same key is already present.
    pub fn insert(&self, reading: Reading) -> bool {
        let mut map = self.readings.write().unwrap();
        let key = reading.key();
        if map.contains_key(&key) {
            return false;
        }
        reading::reserve_seq(key.seq);
        map.insert(key, reading);
        true
    }

    /// Insert every reading from `readings`, returning how many were new.
    ///
    /// Readings created later in this process sort after any stored one with
    /// the same timestamp, even when `readings` came from a snapshot written
    /// by another process.
    pub fn extend(&self, readings: impl IntoIterator<Item = Reading>) -> usize {
        let mut map = self.readings.write().unwrap();
        let mut added = 0;
        for reading in readings {
            let key = reading.key();
            if let Entry::Vacant(slot) = map.entry(key) {
                reading::reserve_seq(key.seq);
                slot.insert(reading);
                added += 1;
            }
        }
        added
    }

    /// All readings with `timestamp >= cutoff`, oldest first.
    pub fn tail_from(&self, cutoff: DateTime<Utc>) -> Vec<Reading> {
        self.readings
            .read()
            .unwrap()
            .range(ReadingKey::lower_bound(cutoff)..)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Every reading in the store, oldest first.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.read().unwrap().values().cloned().collect()
    }

    /// Most recent reading, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.readings
            .read()
            .unwrap()
            .last_key_value()
            .map(|(_, r)| r.clone())
    }

    /// Drop every reading older than `cutoff`. Returns the number removed.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.readings.write().unwrap();
        let kept = map.split_off(&ReadingKey::lower_bound(cutoff));
        let removed = map.len();
        *map = kept;
        removed
    }

    pub fn len(&self) -> usize {
        self.readings.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.read().unwrap().is_empty()
    }
}

impl std::fmt::Debug for StreamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamStore")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn temp(secs: i64, value: f64) -> Reading {
        Reading::new(at(secs), "Temperature", MeasurementKind::Temperature, value)
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.latest().is_none());
        assert!(store.tail_from(DateTime::<Utc>::MIN_UTC).is_empty());
    }

    #[test]
    fn test_arbitrary_insertion_order_comes_back_sorted() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        for secs in [7, 2, 9, 0, 4, 4, 1] {
            assert!(store.insert(temp(secs, secs as f64)));
        }
        let all = store.tail_from(DateTime::<Utc>::MIN_UTC);
        assert_eq!(all.len(), 7);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        let secs: Vec<f64> = all.iter().map(|r| r.value).collect();
        assert_eq!(secs, vec![0.0, 1.0, 2.0, 4.0, 4.0, 7.0, 9.0]);
    }

    #[test]
    fn test_tail_from_is_inclusive_of_cutoff() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        for secs in 0..10 {
            store.insert(temp(secs, secs as f64));
        }
        let tail = store.tail_from(at(6));
        let values: Vec<f64> = tail.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(store.len(), 10, "tail query must not mutate");
    }

    #[test]
    fn test_tail_past_newest_is_empty_not_error() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        store.insert(temp(0, 1.0));
        assert!(store.tail_from(at(1)).is_empty());
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        let r = temp(0, 50.0);
        assert!(store.insert(r.clone()));
        let mut same_key = r.clone();
        same_key.value = 99.0;
        assert!(!store.insert(same_key));
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().unwrap().value, 50.0);
    }

    #[test]
    fn test_extend_counts_only_new_readings() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        let a = temp(0, 1.0);
        let b = temp(1, 2.0);
        store.insert(a.clone());
        assert_eq!(store.extend(vec![a, b]), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_extended_readings_keep_later_readings_unique() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        let mut reloaded = temp(0, 1.0);
        reloaded.seq = 1 << 40;
        assert_eq!(store.extend(vec![reloaded.clone()]), 1);

        let fresh = temp(0, 2.0);
        assert!(fresh.seq > reloaded.seq);
        assert!(store.insert(fresh));
        let values: Vec<f64> = store.snapshot().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_inserted_reading_reserves_its_sequence_number() {
        let store = StreamStore::new(MeasurementKind::Humidity);
        let mut reloaded = Reading::new(at(5), "Humidity", MeasurementKind::Humidity, 40.0);
        reloaded.seq = (1 << 41) + 7;
        assert!(store.insert(reloaded.clone()));
        assert!(temp(5, 0.0).seq > reloaded.seq);
    }

    #[test]
    fn test_prune_before_removes_only_older_readings() {
        let store = StreamStore::new(MeasurementKind::Temperature);
        for secs in 0..10 {
            store.insert(temp(secs, secs as f64));
        }
        assert_eq!(store.prune_before(at(3)), 3);
        assert_eq!(store.len(), 7);
        assert_eq!(store.snapshot()[0].value, 3.0);
        assert_eq!(store.latest().unwrap().value, 9.0);
    }

    #[test]
    fn test_concurrent_writer_and_readers() {
        let store = Arc::new(StreamStore::new(MeasurementKind::Temperature));
        std::thread::scope(|s| {
            let writer = Arc::clone(&store);
            s.spawn(move || {
                for secs in 0..500 {
                    writer.insert(temp(secs, secs as f64));
                }
            });
            for _ in 0..3 {
                let reader = Arc::clone(&store);
                s.spawn(move || {
                    for _ in 0..100 {
                        let tail = reader.tail_from(at(0));
                        assert!(tail.windows(2).all(|w| w[0] < w[1]));
                    }
                });
            }
        });
        assert_eq!(store.len(), 500);
    }
}
