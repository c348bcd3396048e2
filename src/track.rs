//! A track: the time-sorted keyframe sequence for one (entity, property) pair.
//!
//! Storage is struct-of-arrays: three parallel vectors for times, values and
//! interpolation modes, always of equal length. `Vec` supplies geometric
//! capacity growth; removal shifts and compacts so sort order survives
//! without a re-sort.
//!
//! Keyframe identity is the array index, and an index is only valid until the
//! next structural mutation of the same track (insert, removal, or a
//! time-changing update that re-sorts). Callers that hold an index across
//! such a mutation must re-resolve it with [`Track::find_keyframe_index`].

use crate::interpolation::Interpolation;
use crate::value::{Value, VALUE_DIM};
use crate::TimelineError;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing keyframe times.
///
/// Times frequently come from pixel-to-time conversions upstream, so exact
/// float equality is never used.
pub const TIME_TOLERANCE: f64 = 1e-3;

/// An owned snapshot of one keyframe record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds
    pub time: f64,
    /// Value at this keyframe
    pub value: Value,
    /// Interpolation toward the next keyframe
    pub interpolation: Interpolation,
}

/// A time-sorted keyframe sequence.
///
/// Invariant: after any public mutation returns, `times` is strictly
/// increasing and all three arrays have the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    times: Vec<f64>,
    values: Vec<Value>,
    interpolations: Vec<Interpolation>,
}

impl Track {
    /// Create a new empty track. An empty track is a valid, inert state.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct a track from parallel arrays, as read from persisted data.
    ///
    /// Lengths must agree (`values` is flattened, `VALUE_DIM` per keyframe;
    /// an empty `interpolations` array defaults every keyframe to linear) and
    /// every number must be finite with times non-negative. The keyframes are
    /// re-sorted defensively and near-duplicate times are collapsed (later
    /// record wins), so persisted order is not trusted.
    pub fn from_parts(
        times: Vec<f64>,
        flat_values: Vec<f64>,
        interpolations: Vec<Interpolation>,
    ) -> Result<Self, TimelineError> {
        if flat_values.len() != times.len() * VALUE_DIM {
            return Err(TimelineError::InvalidValue {
                reason: format!(
                    "expected {} value components for {} keyframes, got {}",
                    times.len() * VALUE_DIM,
                    times.len(),
                    flat_values.len()
                ),
            });
        }
        let interpolations = if interpolations.is_empty() {
            vec![Interpolation::default(); times.len()]
        } else if interpolations.len() == times.len() {
            interpolations
        } else {
            return Err(TimelineError::InvalidValue {
                reason: format!(
                    "expected {} interpolation modes, got {}",
                    times.len(),
                    interpolations.len()
                ),
            });
        };

        if let Some(&bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(TimelineError::InvalidTime { time: bad });
        }
        if flat_values.iter().any(|v| !v.is_finite()) {
            return Err(TimelineError::InvalidValue {
                reason: "non-finite value component".to_string(),
            });
        }

        let values = flat_values
            .chunks_exact(VALUE_DIM)
            .map(|chunk| Value([chunk[0], chunk[1], chunk[2]]))
            .collect();

        let mut track = Self {
            times,
            values,
            interpolations,
        };
        track.sort_keyframes();
        track.collapse_duplicate_times();
        Ok(track)
    }

    /// Number of keyframes
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the track has no keyframes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Keyframe times, strictly increasing
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Keyframe values, parallel to [`Track::times`]
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Interpolation modes, parallel to [`Track::times`]
    #[inline]
    pub fn interpolations(&self) -> &[Interpolation] {
        &self.interpolations
    }

    /// Get the keyframe at `index`
    #[inline]
    pub fn keyframe(&self, index: usize) -> Option<Keyframe> {
        if index >= self.len() {
            return None;
        }
        Some(Keyframe {
            time: self.times[index],
            value: self.values[index],
            interpolation: self.interpolations[index],
        })
    }

    /// Iterate over all keyframes in time order
    #[inline]
    pub fn keyframes(&self) -> impl Iterator<Item = Keyframe> + '_ {
        (0..self.len()).map(|i| self.keyframe(i).unwrap())
    }

    /// Time of the last keyframe
    #[inline]
    pub fn end_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Insert a keyframe, keeping the track sorted by time.
    ///
    /// If a keyframe already exists within [`TIME_TOLERANCE`] of `time`, its
    /// value and interpolation are overwritten in place instead of creating a
    /// near-duplicate. Returns false for non-finite or negative times and
    /// non-finite values; the track is unchanged in that case.
    pub fn add_keyframe(&mut self, time: f64, value: Value, interpolation: Interpolation) -> bool {
        if !time.is_finite() || time < 0.0 || !value.is_finite() {
            return false;
        }

        if let Some(existing) = self.find_keyframe_index(time, TIME_TOLERANCE) {
            self.values[existing] = value;
            self.interpolations[existing] = interpolation;
            return true;
        }

        let insert_pos = self.times.partition_point(|&t| t < time);
        self.times.insert(insert_pos, time);
        self.values.insert(insert_pos, value);
        self.interpolations.insert(insert_pos, interpolation);
        self.check_parallel();
        true
    }

    /// Locate the keyframe whose time lies within `tolerance` of `time`.
    ///
    /// When two keyframes both qualify, the closer one wins.
    pub fn find_keyframe_index(&self, time: f64, tolerance: f64) -> Option<usize> {
        if self.times.is_empty() || !time.is_finite() {
            return None;
        }
        let after = self.times.partition_point(|&t| t < time);

        let mut best: Option<(usize, f64)> = None;
        for candidate in [after.checked_sub(1), Some(after)].into_iter().flatten() {
            if let Some(&t) = self.times.get(candidate) {
                let dist = (t - time).abs();
                if dist <= tolerance && best.map_or(true, |(_, d)| dist < d) {
                    best = Some((candidate, dist));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Replace the value at `index` in place. No re-sort is needed.
    pub fn update_keyframe_value(&mut self, index: usize, value: Value) -> bool {
        if index >= self.len() || !value.is_finite() {
            return false;
        }
        self.values[index] = value;
        true
    }

    /// Move the keyframe at `index` to `new_time` and re-sort.
    ///
    /// Landing within [`TIME_TOLERANCE`] of another keyframe replaces that
    /// record (the moved keyframe wins, mirroring the insert overwrite
    /// policy), so times stay strictly increasing. The previous index is
    /// invalid after this call; re-resolve with
    /// [`Track::find_keyframe_index`] at `new_time`.
    pub fn update_keyframe_time(&mut self, index: usize, new_time: f64) -> bool {
        if index >= self.len() || !new_time.is_finite() || new_time < 0.0 {
            return false;
        }
        let index = self.remove_collision(index, new_time);
        self.times[index] = new_time;
        self.sort_keyframes();
        true
    }

    /// Replace the whole record at `index` and re-sort.
    ///
    /// As with [`Track::update_keyframe_time`], a keyframe already within
    /// [`TIME_TOLERANCE`] of `time` is replaced by the moved record.
    pub fn set_keyframe(
        &mut self,
        index: usize,
        time: f64,
        value: Value,
        interpolation: Interpolation,
    ) -> bool {
        if index >= self.len() || !time.is_finite() || time < 0.0 || !value.is_finite() {
            return false;
        }
        let index = self.remove_collision(index, time);
        self.times[index] = time;
        self.values[index] = value;
        self.interpolations[index] = interpolation;
        self.sort_keyframes();
        true
    }

    /// Remove the keyframe (other than `index` itself) that sits within
    /// [`TIME_TOLERANCE`] of `new_time`, returning the moved record's index
    /// after the removal shifted the arrays.
    fn remove_collision(&mut self, index: usize, new_time: f64) -> usize {
        match self.find_keyframe_index(new_time, TIME_TOLERANCE) {
            Some(other) if other != index => {
                self.remove_keyframe_by_index(other);
                if other < index {
                    index - 1
                } else {
                    index
                }
            }
            _ => index,
        }
    }

    /// Collapse neighboring keyframes closer than [`TIME_TOLERANCE`] after a
    /// sort, keeping the later record. Returns how many were removed.
    ///
    /// Tracks mutated through the public API never need this; it repairs
    /// persisted or externally constructed data.
    pub(crate) fn collapse_duplicate_times(&mut self) -> usize {
        let mut removed = 0;
        let mut i = 1;
        while i < self.len() {
            if self.times[i] - self.times[i - 1] <= TIME_TOLERANCE {
                self.remove_keyframe_by_index(i - 1);
                removed += 1;
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Remove the keyframe at `index`, compacting the backing storage.
    pub fn remove_keyframe_by_index(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.times.remove(index);
        self.values.remove(index);
        self.interpolations.remove(index);
        self.check_parallel();
        true
    }

    /// Remove the keyframe at `time` (within [`TIME_TOLERANCE`])
    pub fn remove_keyframe(&mut self, time: f64) -> bool {
        match self.find_keyframe_index(time, TIME_TOLERANCE) {
            Some(index) => self.remove_keyframe_by_index(index),
            None => false,
        }
    }

    /// Sample the track at `time`.
    ///
    /// Returns `None` for an empty track. Otherwise the value is clamped to
    /// the first keyframe before the track starts and to the last keyframe
    /// after it ends (no extrapolation); in between, the bracketing pair is
    /// blended according to the left keyframe's interpolation mode.
    pub fn value_at_time(&self, time: f64) -> Option<Value> {
        if time.is_nan() {
            return None;
        }
        let (first, last) = (self.times.first()?, self.times.last()?);
        if time <= *first {
            return Some(self.values[0]);
        }
        if time >= *last {
            return Some(*self.values.last()?);
        }

        // First keyframe strictly after `time`; the clamps above guarantee
        // 0 < after < len.
        let after = self.times.partition_point(|&t| t <= time);
        let before = after - 1;

        match self.interpolations[before] {
            Interpolation::Step => Some(self.values[before]),
            Interpolation::Linear => {
                let t0 = self.times[before];
                let t1 = self.times[after];
                let u = (time - t0) / (t1 - t0);
                Some(self.values[before].lerp(&self.values[after], u))
            }
        }
    }

    /// Stable sort of the time/value/interpolation records together,
    /// preserving value-to-time association.
    pub fn sort_keyframes(&mut self) {
        self.check_parallel();
        if self.times.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.times[a].total_cmp(&self.times[b]));

        self.times = order.iter().map(|&i| self.times[i]).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
        self.interpolations = order.iter().map(|&i| self.interpolations[i]).collect();
    }

    /// Whether times are strictly increasing
    #[inline]
    pub fn is_strictly_sorted(&self) -> bool {
        self.times.windows(2).all(|w| w[0] < w[1])
    }

    /// Whether every stored number is finite (and times non-negative)
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.times.iter().all(|t| t.is_finite() && *t >= 0.0)
            && self.values.iter().all(Value::is_finite)
    }

    /// Parallel-array length agreement is an internal invariant; a mismatch
    /// is a programming error, not a recoverable condition.
    #[inline]
    fn check_parallel(&self) {
        debug_assert!(
            self.times.len() == self.values.len()
                && self.times.len() == self.interpolations.len(),
            "parallel keyframe arrays out of sync: {} times, {} values, {} interpolations",
            self.times.len(),
            self.values.len(),
            self.interpolations.len()
        );
    }
}
