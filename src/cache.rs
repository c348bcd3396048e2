//! Precomputed playback buffers.
//!
//! A [`PrecomputedTrack`] is a dense array of values sampled at fixed
//! `1/frame_rate` intervals from 0 to the registry's max time. It is a pure
//! derived view of the owning track and never a second source of truth:
//! rebuilding it reproduces exactly what live sampling returns at each sample
//! instant.

use crate::track::Track;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Dense frame-rate-sampled buffer for one (entity, property) track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecomputedTrack {
    frame_rate: f64,
    samples: Vec<Value>,
}

impl PrecomputedTrack {
    /// Sample `track` at every frame boundary. Returns `None` for an empty
    /// track, which has nothing to serve.
    pub fn from_track(track: &Track, frame_rate: f64, frame_count: usize) -> Option<Self> {
        if track.is_empty() || frame_rate <= 0.0 || !frame_rate.is_finite() {
            return None;
        }
        let mut samples = Vec::with_capacity(frame_count);
        for frame in 0..frame_count {
            let time = frame as f64 / frame_rate;
            // A non-empty track samples to Some at every finite time.
            samples.push(track.value_at_time(time)?);
        }
        Some(Self {
            frame_rate,
            samples,
        })
    }

    /// Frame rate the buffer was sampled at
    #[inline]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Number of frames in the buffer
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    /// Get the value at a frame index
    #[inline]
    pub fn value_at_frame(&self, frame: usize) -> Option<Value> {
        self.samples.get(frame).copied()
    }

    /// Get the value at the frame nearest to `time`
    #[inline]
    pub fn value_at_time(&self, time: f64) -> Option<Value> {
        if !time.is_finite() || time < 0.0 {
            return None;
        }
        self.value_at_frame((time * self.frame_rate).round() as usize)
    }
}

/// Statistics about the precomputed cache, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub track_count: usize,
    pub total_samples: usize,
    pub memory_estimate_bytes: usize,
    pub frame_rate: f64,
}
