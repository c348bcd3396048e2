//! Error types for the timeline engine

use serde::{Deserialize, Serialize};

/// Error type for timeline operations.
///
/// Routine "nothing to do" conditions (missing track, out-of-range index) are
/// reported through `bool`/`Option` returns on the mutation and query APIs and
/// never surface here; this type covers the fallible codec and validation
/// paths.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineError {
    /// Non-finite or negative time value
    #[error("Invalid time value: {time}")]
    InvalidTime { time: f64 },

    /// Invalid keyframe value
    #[error("Invalid value: {reason}")]
    InvalidValue { reason: String },

    /// Persisted track data that cannot be reconstructed
    #[error("Malformed track {property} on entity {entity}: {reason}")]
    MalformedTrack {
        entity: String,
        property: String,
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl TimelineError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTime { .. } | Self::InvalidValue { .. } => "validation",
            Self::MalformedTrack { .. } => "persistence",
            Self::SerializationError { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<bincode::Error> for TimelineError {
    fn from(err: bincode::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let validation = TimelineError::InvalidTime { time: f64::NAN };
        assert_eq!(validation.category(), "validation");

        let persistence = TimelineError::MalformedTrack {
            entity: "cube".to_string(),
            property: "position".to_string(),
            reason: "length mismatch".to_string(),
        };
        assert_eq!(persistence.category(), "persistence");
    }

    #[test]
    fn test_error_serialization() {
        let error = TimelineError::InvalidValue {
            reason: "non-finite value component".to_string(),
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: TimelineError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_error_display() {
        let error = TimelineError::MalformedTrack {
            entity: "lamp".to_string(),
            property: "intensity".to_string(),
            reason: "length mismatch".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed track intensity on entity lamp: length mismatch"
        );
    }
}
