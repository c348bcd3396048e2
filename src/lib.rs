//! Keyframe Timeline Engine
//!
//! The data core of an animation editor: per-(entity, property) tracks of
//! time-ordered keyframes with mutation, interpolated sampling, a precomputed
//! playback cache, synchronous change events, and lossless persistence.
//!
//! The engine performs no I/O and owns no UI state; the host drives it from a
//! single thread and reacts to the events it emits.

pub mod cache;
pub mod error;
pub mod event;
pub mod interpolation;
pub mod maintenance;
pub mod persist;
pub mod registry;
pub mod track;
pub mod value;

// Re-export common types for convenience
pub use cache::{CacheStatistics, PrecomputedTrack};
pub use error::TimelineError;
pub use event::{EventChannel, EventType, KeyframeEvent};
pub use interpolation::Interpolation;
pub use maintenance::{TrackStatistics, ValidationReport};
pub use persist::{StoredTrack, TimelineDocument};
pub use registry::TimelineRegistry;
pub use track::{Keyframe, Track, TIME_TOLERANCE};
pub use value::{Value, VALUE_DIM};

/// Timeline engine result type
pub type Result<T> = core::result::Result<T, TimelineError>;
