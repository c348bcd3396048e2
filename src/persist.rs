//! Persistence codec: the structured, language-neutral document the registry
//! round-trips through.
//!
//! The document shape is
//! `{ tracks: { entity: { property: { times, values, interpolations } } },
//!   maxTime, frameRate, currentTime }`
//! with `values` flattened to `VALUE_DIM` components per keyframe. Loading is
//! tolerant: missing optional fields get defaults, and a track with
//! non-finite numbers or length-mismatched arrays is dropped (and logged)
//! rather than aborting the whole load. Sampling a reloaded registry matches
//! the original within floating-point tolerance.

use crate::interpolation::Interpolation;
use crate::registry::{TimelineRegistry, DEFAULT_FRAME_RATE, MAX_TIME_MARGIN};
use crate::track::Track;
use crate::{Result, TimelineError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One track's keyframes as parallel arrays.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredTrack {
    pub times: Vec<f64>,
    /// Flattened values, `VALUE_DIM` components per keyframe
    pub values: Vec<f64>,
    /// May be absent in older documents; defaults to linear per keyframe
    #[serde(default)]
    pub interpolations: Vec<Interpolation>,
}

/// The full persisted registry state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument {
    #[serde(default)]
    pub tracks: HashMap<String, HashMap<String, StoredTrack>>,
    /// Absent in older documents; recomputed from track end times on load
    #[serde(default)]
    pub max_time: Option<f64>,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    #[serde(default)]
    pub current_time: f64,
}

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

impl TimelineDocument {
    /// Encode as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as a compact binary snapshot
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from a binary snapshot
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl TimelineRegistry {
    /// Serialize the full registry state
    pub fn to_document(&self) -> TimelineDocument {
        let mut tracks: HashMap<String, HashMap<String, StoredTrack>> = HashMap::new();
        for (entity, property, track) in self.all_tracks() {
            tracks
                .entry(entity.to_string())
                .or_default()
                .insert(property.to_string(), store_track(track));
        }
        TimelineDocument {
            tracks,
            max_time: Some(self.max_time()),
            frame_rate: self.frame_rate(),
            current_time: self.current_time(),
        }
    }

    /// Reconstruct a registry from a document.
    ///
    /// Tracks are re-sorted defensively; malformed tracks are dropped with a
    /// warning. The registry comes back dirty so the precompute cache is
    /// rebuilt on next need.
    pub fn from_document(doc: TimelineDocument) -> Self {
        let mut registry = TimelineRegistry::with_frame_rate(doc.frame_rate);

        let mut track_end = 0.0_f64;
        for (entity, props) in doc.tracks {
            for (property, stored) in props {
                let track =
                    match Track::from_parts(stored.times, stored.values, stored.interpolations) {
                        Ok(track) => track,
                        Err(err) => {
                            let err = TimelineError::MalformedTrack {
                                entity: entity.clone(),
                                property: property.clone(),
                                reason: err.to_string(),
                            };
                            log::warn!("dropped during load: {err}");
                            continue;
                        }
                    };
                if let Some(end) = track.end_time() {
                    track_end = track_end.max(end);
                }
                registry
                    .tracks
                    .entry(entity.clone())
                    .or_default()
                    .insert(property, track);
            }
        }

        // A persisted maxTime already includes the safety margin; otherwise
        // recompute it from the track end times.
        registry.max_time = match doc.max_time {
            Some(t) if t.is_finite() && t >= 0.0 => t.max(track_end * MAX_TIME_MARGIN),
            _ => track_end * MAX_TIME_MARGIN,
        };
        if doc.current_time.is_finite() && doc.current_time >= 0.0 {
            registry.current_time = doc.current_time;
        }
        registry.dirty = true;
        registry
    }
}

fn store_track(track: &Track) -> StoredTrack {
    StoredTrack {
        times: track.times().to_vec(),
        values: track
            .values()
            .iter()
            .flat_map(|v| v.components().iter().copied())
            .collect(),
        interpolations: track.interpolations().to_vec(),
    }
}
