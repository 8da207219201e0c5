//! Typed identifiers for the fleetop data model.
//!
//! Entity references are foreign-key identifiers, never embedded
//! objects: an [`OperatorInstance`](crate::registry::OperatorInstance)
//! refers to its adapter and device by id and resolution goes through
//! the owning store. All ids compare by value.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            #[must_use]
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
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_type! {
    /// Identifier of an [`Adapter`](crate::adapter::Adapter).
    AdapterId
}

id_type! {
    /// Identifier of a [`Device`](crate::device::Device).
    DeviceId
}

id_type! {
    /// Identifier of a [`Component`](crate::component::Component)
    /// (sensor or actuator).
    ComponentId
}

id_type! {
    /// Identifier of an
    /// [`OperatorInstance`](crate::registry::OperatorInstance),
    /// assigned by the registry on creation.
    InstanceId
}

impl InstanceId {
    /// Generate a fresh random instance id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
