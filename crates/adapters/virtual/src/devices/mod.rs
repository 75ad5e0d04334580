//! Virtual device implementations — light, sensor, shades.
//!
//! Each device owns exactly one resource of the `virtual` driver, named by
//! a fixed local id.

mod light;
mod sensor;
mod shades;

pub use light::VirtualLight;
pub use sensor::VirtualSensor;
pub use shades::VirtualShades;

use homerc_app::ResourceSpec;
use homerc_app::ports::{DriveOutcome, DriveTarget};
use homerc_domain::value::Value;

/// Wrapper enum for the concrete virtual device types.
pub enum VirtualDevice {
    Light(VirtualLight),
    Sensor(VirtualSensor),
    Shades(VirtualShades),
}

impl VirtualDevice {
    /// Local id of the device's resource.
    #[must_use]
    pub fn lid(&self) -> &'static str {
        match self {
            Self::Light(_) => VirtualLight::LID,
            Self::Sensor(_) => VirtualSensor::LID,
            Self::Shades(_) => VirtualShades::LID,
        }
    }

    #[must_use]
    pub fn spec(&self) -> ResourceSpec {
        match self {
            Self::Light(_) => VirtualLight::spec(),
            Self::Sensor(_) => VirtualSensor::spec(),
            Self::Shades(_) => VirtualShades::spec(),
        }
    }

    pub fn drive(&self, target: &DriveTarget<'_>, value: &Value) -> DriveOutcome {
        match self {
            Self::Light(d) => d.drive(value),
            Self::Sensor(_) => DriveOutcome::Failed,
            Self::Shades(d) => d.drive(target, value),
        }
    }

    pub fn stop(&self) {
        if let Self::Shades(d) = self {
            d.stop();
        }
    }
}
