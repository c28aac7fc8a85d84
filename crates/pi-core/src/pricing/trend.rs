//! Quote trend labels.
//!
//! A quote's trend is recorded when it supersedes the vendor's previous
//! quote and never re-derived at query time. [`Trend::classify`] is the one
//! place the label is computed, so re-running it on the same two prices
//! always reproduces the stored label.

use serde::{Deserialize, Serialize};

/// Direction of a vendor's price relative to its previous quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    #[serde(alias = "up")]
    Rising,
    #[serde(alias = "down")]
    Falling,
    #[default]
    Stable,
}

impl Trend {
    /// Classify `current` against `previous` by exact comparison.
    pub fn classify(previous: f64, current: f64) -> Self {
        if current > previous {
            Trend::Rising
        } else if current < previous {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Rising => "↑",
            Trend::Falling => "↓",
            Trend::Stable => "→",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Rising => write!(f, "rising"),
            Trend::Falling => write!(f, "falling"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_directions() {
        assert_eq!(Trend::classify(4.12, 4.30), Trend::Rising);
        assert_eq!(Trend::classify(4.12, 3.98), Trend::Falling);
        assert_eq!(Trend::classify(4.12, 4.12), Trend::Stable);
    }

    #[test]
    fn classify_is_idempotent() {
        let first = Trend::classify(3.85, 3.91);
        let again = Trend::classify(3.85, 3.91);
        assert_eq!(first, again);
    }

    #[test]
    fn legacy_labels_deserialize() {
        let t: Trend = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(t, Trend::Rising);
        let t: Trend = serde_json::from_str("\"stable\"").unwrap();
        assert_eq!(t, Trend::Stable);
    }
}
