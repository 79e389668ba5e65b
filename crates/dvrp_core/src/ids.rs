//! Typed identifiers for the entities the dispatch core refers to by name.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a passenger request; unique per engine.
    RequestId
);
string_id!(
    /// Identifier of a traveler (person) in the population.
    PersonId
);
string_id!(
    /// Identifier of a network link.
    LinkId
);
string_id!(
    /// Identifier of a fleet vehicle.
    VehicleId
);
string_id!(
    /// Identifier of a duty shift.
    ShiftId
);
string_id!(
    /// Identifier of an operation facility (hub or in-field break spot).
    FacilityId
);
string_id!(
    /// Transport mode served by an engine, e.g. `drt`.
    Mode
);
