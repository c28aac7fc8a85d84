//! Catalog identity types.
//!
//! Every entity the engine touches is keyed by an opaque string id taken
//! verbatim from the upstream catalog. The newtypes keep a vendor id from
//! being passed where a material id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an id, trimming surrounding whitespace.
            pub fn new(id: impl AsRef<str>) -> Self {
                $name(id.as_ref().trim().to_string())
            }

            /// Parse and validate an id string.
            ///
            /// Rejects empty ids and ids containing whitespace or control
            /// characters.
            pub fn parse(s: &str) -> Option<Self> {
                if is_valid_id(s) {
                    Some($name(s.to_string()))
                } else {
                    None
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

fn is_valid_id(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c.is_control())
}

string_id!(
    /// Material (or labor line item) identifier, e.g. `MAT-2x4-SPF`.
    MaterialId
);

string_id!(
    /// Vendor identifier.
    VendorId
);

string_id!(
    /// Labor subcontractor identifier.
    SubcontractorId
);

string_id!(
    /// Job identifier used to group savings records.
    JobId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank_and_whitespace() {
        assert!(MaterialId::parse("").is_none());
        assert!(MaterialId::parse("MAT 1").is_none());
        assert!(VendorId::parse("V\t1").is_none());
        assert_eq!(VendorId::parse("V1"), Some(VendorId("V1".into())));
    }

    #[test]
    fn test_new_trims() {
        assert_eq!(JobId::new("  J-104 ").as_str(), "J-104");
    }

    #[test]
    fn test_serde_transparent() {
        let id = SubcontractorId::new("SUB-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"SUB-7\"");
        let back: SubcontractorId = serde_json::from_str("\"SUB-7\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids = vec![MaterialId::new("b"), MaterialId::new("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }
}
