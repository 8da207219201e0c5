//! Component model: sensors and actuators.
//!
//! A component pairs one adapter with one device. Sensors and actuators
//! carry variant-specific fields, but the deployment machinery only ever
//! needs the shared surface: id, name, adapter reference, device
//! reference.

use serde::{Deserialize, Serialize};

use crate::id::{AdapterId, ComponentId, DeviceId};

/// Discriminant for the two component variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// A sensing component.
    Sensor,
    /// An actuating component.
    Actuator,
}

impl ComponentKind {
    /// String form of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Actuator => "actuator",
        }
    }
}

/// A sensing component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    /// Component id.
    pub id: ComponentId,
    /// Display name.
    pub name: String,
    /// Adapter realizing this sensor.
    pub adapter: AdapterId,
    /// Device the sensor runs on.
    pub device: DeviceId,
    /// Unit of the measured value, if any.
    #[serde(default)]
    pub unit: Option<String>,
}

/// An actuating component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actuator {
    /// Component id.
    pub id: ComponentId,
    /// Display name.
    pub name: String,
    /// Adapter realizing this actuator.
    pub adapter: AdapterId,
    /// Device the actuator runs on.
    pub device: DeviceId,
}

/// A sensor or actuator, polymorphic over the shared capability surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    /// A sensing component.
    Sensor(Sensor),
    /// An actuating component.
    Actuator(Actuator),
}

impl Component {
    /// The component id.
    #[must_use]
    pub const fn id(&self) -> &ComponentId {
        match self {
            Self::Sensor(s) => &s.id,
            Self::Actuator(a) => &a.id,
        }
    }

    /// The component display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sensor(s) => &s.name,
            Self::Actuator(a) => &a.name,
        }
    }

    /// The adapter this component is realized by.
    #[must_use]
    pub const fn adapter_id(&self) -> &AdapterId {
        match self {
            Self::Sensor(s) => &s.adapter,
            Self::Actuator(a) => &a.adapter,
        }
    }

    /// The device this component runs on.
    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        match self {
            Self::Sensor(s) => &s.device,
            Self::Actuator(a) => &a.device,
        }
    }

    /// Which variant this component is.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Sensor(_) => ComponentKind::Sensor,
            Self::Actuator(_) => ComponentKind::Actuator,
        }
    }
}
