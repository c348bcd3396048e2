//! The timeline registry: every track in the session, keyed by entity and
//! property, plus global timing state, the dirty flag, the precompute cache
//! and the event channel.
//!
//! All mutation flows through the registry so that the dirty flag, `max_time`
//! and event dispatch stay coherent. Events fire strictly after the track's
//! arrays are consistent. Entity ids and property names are opaque strings;
//! the registry only uses them as map keys.

use crate::cache::{CacheStatistics, PrecomputedTrack};
use crate::event::{EventChannel, EventType, KeyframeEvent};
use crate::interpolation::Interpolation;
use crate::track::{Keyframe, Track, TIME_TOLERANCE};
use crate::value::Value;
use std::collections::HashMap;

/// Default sampling rate for the precompute cache and frame conversions.
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Safety margin applied when a keyframe extends the global duration.
pub const MAX_TIME_MARGIN: f64 = 1.2;

/// Owner of all tracks for one editing session.
#[derive(Debug)]
pub struct TimelineRegistry {
    pub(crate) tracks: HashMap<String, HashMap<String, Track>>,
    pub(crate) cache: HashMap<String, HashMap<String, PrecomputedTrack>>,
    pub(crate) events: EventChannel,
    pub(crate) frame_rate: f64,
    pub(crate) max_time: f64,
    pub(crate) current_time: f64,
    pub(crate) dirty: bool,
}

impl TimelineRegistry {
    /// Create an empty registry at the default frame rate
    pub fn new() -> Self {
        Self::with_frame_rate(DEFAULT_FRAME_RATE)
    }

    /// Create an empty registry with a custom frame rate
    pub fn with_frame_rate(frame_rate: f64) -> Self {
        Self {
            tracks: HashMap::new(),
            cache: HashMap::new(),
            events: EventChannel::new(),
            frame_rate: if frame_rate.is_finite() && frame_rate > 0.0 {
                frame_rate
            } else {
                DEFAULT_FRAME_RATE
            },
            max_time: 0.0,
            current_time: 0.0,
            dirty: false,
        }
    }

    // ---- track management ----

    /// Get or lazily create the track for `(entity, property)`
    pub fn add_track(&mut self, entity: &str, property: &str) -> &mut Track {
        self.tracks
            .entry(entity.to_string())
            .or_default()
            .entry(property.to_string())
            .or_default()
    }

    /// Get the track for `(entity, property)`
    #[inline]
    pub fn track(&self, entity: &str, property: &str) -> Option<&Track> {
        self.tracks.get(entity)?.get(property)
    }

    /// Remove the track for `(entity, property)`
    pub fn remove_track(&mut self, entity: &str, property: &str) -> bool {
        let Some(props) = self.tracks.get_mut(entity) else {
            return false;
        };
        if props.remove(property).is_none() {
            return false;
        }
        if props.is_empty() {
            self.tracks.remove(entity);
        }
        if let Some(cached) = self.cache.get_mut(entity) {
            cached.remove(property);
        }
        self.dirty = true;
        true
    }

    /// Remove every track of an entity, returning how many were removed
    pub fn remove_entity(&mut self, entity: &str) -> usize {
        self.cache.remove(entity);
        match self.tracks.remove(entity) {
            Some(props) => {
                self.dirty = true;
                props.len()
            }
            None => 0,
        }
    }

    /// Flattened enumeration of every track
    pub fn all_tracks(&self) -> impl Iterator<Item = (&str, &str, &Track)> {
        self.tracks.iter().flat_map(|(entity, props)| {
            props
                .iter()
                .map(move |(property, track)| (entity.as_str(), property.as_str(), track))
        })
    }

    /// Total number of tracks
    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.values().map(HashMap::len).sum()
    }

    // ---- mutation API ----

    /// Insert a keyframe, lazily creating the track.
    ///
    /// A keyframe already within [`TIME_TOLERANCE`] of `time` is overwritten
    /// in place and reported as `KeyframeUpdated`; a fresh insert fires
    /// `KeyframeAdded`.
    pub fn add_keyframe(
        &mut self,
        entity: &str,
        property: &str,
        time: f64,
        value: Value,
        interpolation: Interpolation,
    ) -> bool {
        // Validate up front so a rejected insert does not leave behind a
        // lazily created empty track.
        if !time.is_finite() || time < 0.0 || !value.is_finite() {
            return false;
        }
        let (index, old_value) = {
            let track = self.add_track(entity, property);
            let old_value = track
                .find_keyframe_index(time, TIME_TOLERANCE)
                .and_then(|i| track.keyframe(i))
                .map(|kf| kf.value);
            if !track.add_keyframe(time, value, interpolation) {
                return false;
            }
            // The insert succeeded, so the keyframe resolves.
            let index = track.find_keyframe_index(time, TIME_TOLERANCE).unwrap();
            (index, old_value)
        };

        self.update_max_time(time);
        self.dirty = true;

        let event = match old_value {
            Some(old) => {
                KeyframeEvent::new(EventType::KeyframeUpdated, entity, property, index, time, value)
                    .with_old_value(old)
            }
            None => KeyframeEvent::new(
                EventType::KeyframeAdded,
                entity,
                property,
                index,
                time,
                value,
            ),
        };
        self.events.emit(&event);
        true
    }

    /// Remove the keyframe at `index`
    pub fn remove_keyframe_by_index(&mut self, entity: &str, property: &str, index: usize) -> bool {
        let removed = {
            let Some(track) = self.track_mut(entity, property) else {
                return false;
            };
            let Some(kf) = track.keyframe(index) else {
                return false;
            };
            track.remove_keyframe_by_index(index);
            kf
        };

        self.dirty = true;
        self.events.emit(&KeyframeEvent::new(
            EventType::KeyframeRemoved,
            entity,
            property,
            index,
            removed.time,
            removed.value,
        ));
        true
    }

    /// Remove the keyframe at `time` (within [`TIME_TOLERANCE`])
    pub fn remove_keyframe(&mut self, entity: &str, property: &str, time: f64) -> bool {
        let Some(index) = self
            .track(entity, property)
            .and_then(|t| t.find_keyframe_index(time, TIME_TOLERANCE))
        else {
            return false;
        };
        self.remove_keyframe_by_index(entity, property, index)
    }

    /// Replace the value at `index` in place
    pub fn update_keyframe_value(
        &mut self,
        entity: &str,
        property: &str,
        index: usize,
        value: Value,
    ) -> bool {
        let old = {
            let Some(track) = self.track_mut(entity, property) else {
                return false;
            };
            let Some(old) = track.keyframe(index) else {
                return false;
            };
            if !track.update_keyframe_value(index, value) {
                return false;
            }
            old
        };

        self.dirty = true;
        self.events.emit(
            &KeyframeEvent::new(
                EventType::KeyframeUpdated,
                entity,
                property,
                index,
                old.time,
                value,
            )
            .with_old_value(old.value),
        );
        true
    }

    /// Move the keyframe at `index` to `new_time`.
    ///
    /// The track re-sorts, so `index` is invalid afterwards; the event
    /// carries the keyframe's new index. Landing within [`TIME_TOLERANCE`]
    /// of another keyframe replaces it (the moved keyframe wins), so the
    /// track's count may drop by one.
    pub fn update_keyframe_time(
        &mut self,
        entity: &str,
        property: &str,
        index: usize,
        new_time: f64,
    ) -> bool {
        let (new_index, old) = {
            let Some(track) = self.track_mut(entity, property) else {
                return false;
            };
            let Some(old) = track.keyframe(index) else {
                return false;
            };
            if !track.update_keyframe_time(index, new_time) {
                return false;
            }
            let new_index = track.find_keyframe_index(new_time, TIME_TOLERANCE).unwrap();
            (new_index, old)
        };

        self.update_max_time(new_time);
        self.dirty = true;
        self.events.emit(
            &KeyframeEvent::new(
                EventType::KeyframeMoved,
                entity,
                property,
                new_index,
                new_time,
                old.value,
            )
            .with_old_time(old.time),
        );
        true
    }

    /// Replace the whole record at `index` (time, value and interpolation).
    ///
    /// The track re-sorts; the event carries the new index, the old time and
    /// the old value. As with [`TimelineRegistry::update_keyframe_time`], a
    /// keyframe already within [`TIME_TOLERANCE`] of `time` is replaced.
    pub fn set_keyframe_by_index(
        &mut self,
        entity: &str,
        property: &str,
        index: usize,
        time: f64,
        value: Value,
        interpolation: Interpolation,
    ) -> bool {
        let (new_index, old) = {
            let Some(track) = self.track_mut(entity, property) else {
                return false;
            };
            let Some(old) = track.keyframe(index) else {
                return false;
            };
            if !track.set_keyframe(index, time, value, interpolation) {
                return false;
            }
            let new_index = track.find_keyframe_index(time, TIME_TOLERANCE).unwrap();
            (new_index, old)
        };

        self.update_max_time(time);
        self.dirty = true;
        self.events.emit(
            &KeyframeEvent::new(
                EventType::KeyframeMoved,
                entity,
                property,
                new_index,
                time,
                value,
            )
            .with_old_time(old.time)
            .with_old_value(old.value),
        );
        true
    }

    // ---- query API ----

    /// Sample a track live at `time`. `None` for a missing or empty track.
    #[inline]
    pub fn value_at_time(&self, entity: &str, property: &str, time: f64) -> Option<Value> {
        self.track(entity, property)?.value_at_time(time)
    }

    /// All keyframes of a track, in time order
    #[inline]
    pub fn keyframes(&self, entity: &str, property: &str) -> Option<Vec<Keyframe>> {
        Some(self.track(entity, property)?.keyframes().collect())
    }

    /// Keyframe count of a track; 0 for a missing track
    #[inline]
    pub fn keyframe_count(&self, entity: &str, property: &str) -> usize {
        self.track(entity, property).map_or(0, Track::len)
    }

    // ---- events ----

    /// Subscribe to one of the four mutation event kinds
    pub fn subscribe(&mut self, kind: EventType, handler: impl FnMut(&KeyframeEvent) + 'static) {
        self.events.subscribe(kind, handler);
    }

    // ---- timing & cache ----

    /// Expand `max_time` to cover `time` plus the safety margin. Never
    /// shrinks automatically.
    pub fn update_max_time(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        let padded = time * MAX_TIME_MARGIN;
        if padded > self.max_time {
            self.max_time = padded;
        }
    }

    /// Rebuild every precomputed buffer if the registry is dirty.
    ///
    /// Sampling is at frame boundaries `0, 1/frame_rate, ...` up to
    /// `max_time`. Clears the dirty state on completion.
    pub fn precompute(&mut self) {
        if !self.dirty {
            return;
        }
        self.cache.clear();
        let frame_count = (self.max_time * self.frame_rate).ceil() as usize + 1;
        for (entity, props) in &self.tracks {
            for (property, track) in props {
                if let Some(buffer) =
                    PrecomputedTrack::from_track(track, self.frame_rate, frame_count)
                {
                    self.cache
                        .entry(entity.clone())
                        .or_default()
                        .insert(property.clone(), buffer);
                }
            }
        }
        self.dirty = false;
    }

    /// Serve a precomputed sample.
    ///
    /// Returns `None` while the registry is dirty so a stale sample is never
    /// served after an edit; call [`TimelineRegistry::precompute`] first.
    /// Live sampling via [`TimelineRegistry::value_at_time`] is always the
    /// canonical path; this buffer is purely a bulk-playback accelerator.
    pub fn cached_value_at_frame(
        &self,
        entity: &str,
        property: &str,
        frame: usize,
    ) -> Option<Value> {
        if self.dirty {
            return None;
        }
        self.cache.get(entity)?.get(property)?.value_at_frame(frame)
    }

    /// Statistics about the precomputed cache
    pub fn cache_statistics(&self) -> CacheStatistics {
        let buffers = self.cache.values().flat_map(HashMap::values);
        let total_samples: usize = buffers.map(PrecomputedTrack::frame_count).sum();
        CacheStatistics {
            track_count: self.cache.values().map(HashMap::len).sum(),
            total_samples,
            memory_estimate_bytes: total_samples * std::mem::size_of::<Value>(),
            frame_rate: self.frame_rate,
        }
    }

    /// Convert a time in seconds to the nearest frame index
    #[inline]
    pub fn time_to_frame(&self, time: f64) -> usize {
        (time.max(0.0) * self.frame_rate).round() as usize
    }

    /// Convert a frame index to a time in seconds
    #[inline]
    pub fn frame_to_time(&self, frame: usize) -> f64 {
        frame as f64 / self.frame_rate
    }

    /// Sampling rate used by the cache and frame conversions
    #[inline]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Change the frame rate; invalidates the cache
    pub fn set_frame_rate(&mut self, frame_rate: f64) -> bool {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return false;
        }
        self.frame_rate = frame_rate;
        self.dirty = true;
        true
    }

    /// Global duration, including the safety margin
    #[inline]
    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// Playhead position, persisted with the document
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Move the playhead
    pub fn set_current_time(&mut self, time: f64) {
        if time.is_finite() {
            self.current_time = time.max(0.0);
        }
    }

    /// Whether the precompute cache is stale
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn track_mut(&mut self, entity: &str, property: &str) -> Option<&mut Track> {
        self.tracks.get_mut(entity)?.get_mut(property)
    }
}

impl Default for TimelineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
