//! Maintenance utilities: validation, cleanup of orphaned or corrupt tracks,
//! statistics, and whole-registry backup/restore/merge.

use crate::persist::TimelineDocument;
use crate::registry::TimelineRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What `validate_and_clean_tracks` did, per (entity, property).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Tracks whose ordering was repaired by a re-sort
    pub repaired: Vec<(String, String)>,
    /// Tracks dropped for non-finite times or values
    pub dropped: Vec<(String, String)>,
    /// Total tracks examined
    pub checked: usize,
}

impl ValidationReport {
    /// Whether the scan found nothing to fix
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty() && self.dropped.is_empty()
    }
}

/// Counts of tracks and keyframes grouped by property and entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackStatistics {
    pub track_count: usize,
    pub keyframe_count: usize,
    pub tracks_by_property: HashMap<String, usize>,
    pub keyframes_by_property: HashMap<String, usize>,
    pub tracks_by_entity: HashMap<String, usize>,
    pub keyframes_by_entity: HashMap<String, usize>,
}

impl TimelineRegistry {
    /// Remove tracks with zero keyframes and tracks whose entity the host no
    /// longer resolves. Returns how many tracks were removed.
    ///
    /// The engine has no view of the host's scene graph, so resolvability is
    /// delegated to the `resolve` closure.
    pub fn cleanup_tracks(&mut self, resolve: impl Fn(&str) -> bool) -> usize {
        let doomed: Vec<(String, String)> = self
            .all_tracks()
            .filter(|(entity, _, track)| track.is_empty() || !resolve(entity))
            .map(|(entity, property, _)| (entity.to_string(), property.to_string()))
            .collect();

        for (entity, property) in &doomed {
            self.remove_track(entity, property);
            log::debug!("cleanup removed track {property} on entity {entity}");
        }
        doomed.len()
    }

    /// Scan every track for non-finite numbers and out-of-order times.
    ///
    /// Out-of-order tracks are repaired in place with a re-sort (collapsing
    /// exact-duplicate times, later record wins); tracks containing
    /// non-finite data are dropped.
    pub fn validate_and_clean_tracks(&mut self) -> ValidationReport {
        let mut report = ValidationReport {
            checked: self.track_count(),
            ..ValidationReport::default()
        };

        let keys: Vec<(String, String)> = self
            .all_tracks()
            .map(|(entity, property, _)| (entity.to_string(), property.to_string()))
            .collect();

        for (entity, property) in keys {
            let Some(track) = self.track_mut(&entity, &property) else {
                continue;
            };
            if !track.is_finite() {
                self.remove_track(&entity, &property);
                log::warn!("dropped corrupt track {property} on entity {entity}");
                report.dropped.push((entity, property));
                continue;
            }
            if !track.is_strictly_sorted() {
                track.sort_keyframes();
                track.collapse_duplicate_times();
                self.dirty = true;
                log::warn!("repaired out-of-order track {property} on entity {entity}");
                report.repaired.push((entity, property));
            }
        }
        report
    }

    /// Counts of tracks and keyframes, grouped by property and entity
    pub fn track_statistics(&self) -> TrackStatistics {
        let mut stats = TrackStatistics::default();
        for (entity, property, track) in self.all_tracks() {
            stats.track_count += 1;
            stats.keyframe_count += track.len();
            *stats.tracks_by_property.entry(property.to_string()).or_default() += 1;
            *stats
                .keyframes_by_property
                .entry(property.to_string())
                .or_default() += track.len();
            *stats.tracks_by_entity.entry(entity.to_string()).or_default() += 1;
            *stats.keyframes_by_entity.entry(entity.to_string()).or_default() += track.len();
        }
        stats
    }

    /// Snapshot the full registry state
    pub fn backup(&self) -> TimelineDocument {
        self.to_document()
    }

    /// Replace this registry's state with a snapshot.
    ///
    /// Event subscribers survive a restore; the cache is cleared and the
    /// registry comes back dirty.
    pub fn restore(&mut self, snapshot: TimelineDocument) {
        let restored = TimelineRegistry::from_document(snapshot);
        self.tracks = restored.tracks;
        self.frame_rate = restored.frame_rate;
        self.max_time = restored.max_time;
        self.current_time = restored.current_time;
        self.cache.clear();
        self.dirty = true;
    }

    /// Union-merge another registry's tracks into this one.
    ///
    /// Incoming keyframes are replayed through the tolerance-overwriting
    /// insert, so on an (entity, property, time) collision the incoming
    /// registry's keyframe wins. Returns how many keyframes were applied.
    ///
    /// Restore and merge are bulk operations: they mark the registry dirty
    /// but do not fire per-keyframe events; subscribers should rebuild their
    /// view afterwards.
    pub fn merge(&mut self, other: &TimelineRegistry) -> usize {
        let mut applied = 0;
        for (entity, property, incoming) in other.all_tracks() {
            let dest = self.add_track(entity, property);
            for kf in incoming.keyframes() {
                if dest.add_keyframe(kf.time, kf.value, kf.interpolation) {
                    applied += 1;
                }
            }
        }
        if other.max_time > self.max_time {
            self.max_time = other.max_time;
        }
        self.dirty = true;
        applied
    }
}
