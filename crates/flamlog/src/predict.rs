//! Pass/fail prediction.
//!
//! There is no model behind this: a material is predicted to pass only when
//! its flammability class is exactly `Low`.

use std::fmt;

use serde::Serialize;

/// The flammability class that predicts a pass.
pub const PASSING_CLASS: &str = "Low";

/// Outcome of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Prediction {
    /// Expected to pass flammability testing.
    Pass,
    /// Expected to fail flammability testing.
    Fail,
}

impl Prediction {
    /// The label shown to users.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Predict the outcome for a flammability class. The comparison is exact and
/// case-sensitive.
#[must_use]
pub fn predict(flammability_class: &str) -> Prediction {
    if flammability_class == PASSING_CLASS {
        Prediction::Pass
    } else {
        Prediction::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_passes() {
        assert_eq!(predict("Low"), Prediction::Pass);
    }

    #[test]
    fn test_other_classes_fail() {
        assert_eq!(predict("High"), Prediction::Fail);
        assert_eq!(predict("Medium"), Prediction::Fail);
        assert_eq!(predict(""), Prediction::Fail);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(predict("low"), Prediction::Fail);
        assert_eq!(predict("LOW"), Prediction::Fail);
        assert_eq!(predict(" Low"), Prediction::Fail);
    }

    #[test]
    fn test_display() {
        assert_eq!(Prediction::Pass.to_string(), "Pass");
        assert_eq!(Prediction::Fail.to_string(), "Fail");
    }
}
