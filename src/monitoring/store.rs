//! Idempotent, append-only collection of monitoring points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::monitoring::MonitoringPoint;
use crate::track::StormId;

/// Persisted collection of [`MonitoringPoint`]s, unique by monitor id
/// and sorted by (issue_time, storm_id).
///
/// Under normal operation points are only ever appended: merging keeps
/// existing rows untouched even when evaluation logic has changed since
/// they were written. A clobber merge replaces everything and exists
/// for explicit backfills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringStore {
    points: Vec<MonitoringPoint>,
}

impl MonitoringStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from persisted points, re-establishing the
    /// canonical sort order.
    #[must_use]
    pub fn from_points(points: Vec<MonitoringPoint>) -> Self {
        let mut store = Self { points };
        store.sort();
        store
    }

    /// True when a record with this monitor id exists. The update loop
    /// uses this to skip recomputation unless clobbering.
    #[must_use]
    pub fn contains(&self, monitor_id: &str) -> bool {
        self.points.iter().any(|p| p.monitor_id == monitor_id)
    }

    /// Merges `new_points` into this store.
    ///
    /// With `clobber` the new points fully replace the existing ones.
    /// Otherwise only points whose monitor id is absent are appended;
    /// existing rows are never mutated or removed, so re-running on
    /// identical inputs leaves the store unchanged. Monitor ids stay
    /// unique even when a batch repeats one (an upstream feed can hand
    /// back the same issuance twice): the first occurrence wins.
    #[must_use]
    pub fn merge(&self, new_points: Vec<MonitoringPoint>, clobber: bool) -> Self {
        let mut points = if clobber {
            Vec::new()
        } else {
            self.points.clone()
        };
        for point in new_points {
            if points.iter().all(|p| p.monitor_id != point.monitor_id) {
                points.push(point);
            }
        }
        let mut combined = Self { points };
        combined.sort();
        combined
    }

    /// Points in (issue_time, storm_id) order.
    #[must_use]
    pub fn points(&self) -> &[MonitoringPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the store holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points grouped by storm, each group in issuance order. The
    /// BTreeMap gives a deterministic storm order, which the
    /// first-occurrence-wins notification dedup relies on.
    #[must_use]
    pub fn by_storm(&self) -> BTreeMap<&StormId, Vec<&MonitoringPoint>> {
        let mut groups: BTreeMap<&StormId, Vec<&MonitoringPoint>> = BTreeMap::new();
        for point in &self.points {
            groups.entry(&point.storm_id).or_default().push(point);
        }
        groups
    }

    fn sort(&mut self) {
        self.points
            .sort_by(|a, b| (a.issue_time, &a.storm_id).cmp(&(b.issue_time, &b.storm_id)));
    }
}
