//! Interpolation modes between keyframes

use serde::{Deserialize, Serialize};

/// How a keyframe's value blends toward the next keyframe.
///
/// The mode stored on the *left* keyframe of a bracketing pair governs the
/// segment between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Hold the left keyframe's value until the next keyframe
    Step,
    /// Componentwise linear blend
    #[default]
    Linear,
}

impl Interpolation {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Linear => "linear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_linear() {
        assert_eq!(Interpolation::default(), Interpolation::Linear);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Interpolation::Step).unwrap(),
            "\"step\""
        );
        let parsed: Interpolation = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(parsed, Interpolation::Linear);
    }
}
