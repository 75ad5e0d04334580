//! # homerc-adapter-virtual
//!
//! Virtual/demo driver that provides simulated resources for testing and
//! demonstration purposes.
//!
//! ## Provided resources
//!
//! | Resource | URI | Behaviour |
//! |----------|-----|-----------|
//! | Virtual Light | `<host>/virtual/light` | Writable `bool`, realised instantly |
//! | Virtual Sensor | `<host>/virtual/temperature` | Read-only `temp`, 21.5 °C on install |
//! | Virtual Shades | `<host>/virtual/shades` | Writable `percent`, busy while moving |
//!
//! ## Dependency rule
//!
//! Depends on `homerc-app` (port traits) and `homerc-domain` only.

mod devices;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use homerc_app::Directory;
use homerc_app::ports::{DriveOutcome, DriveTarget, Driver};
use homerc_domain::error::RcError;
use homerc_domain::uri::ResourceUri;
use homerc_domain::value::Value;

use devices::{VirtualDevice, VirtualLight, VirtualSensor, VirtualShades};

/// Driver id under which the virtual resources are registered.
pub const DRIVER_ID: &str = "virtual";

/// Default time the shades need to reach a new position.
pub const DEFAULT_TRAVEL: Duration = Duration::from_secs(3);

/// The [`Driver`] serving every virtual device, dispatching on the local id.
pub struct VirtualDriver {
    devices: HashMap<&'static str, VirtualDevice>,
}

impl VirtualDriver {
    fn new(travel: Duration) -> Self {
        let mut devices = HashMap::new();
        for device in [
            VirtualDevice::Light(VirtualLight::default()),
            VirtualDevice::Sensor(VirtualSensor::default()),
            VirtualDevice::Shades(VirtualShades::new(travel)),
        ] {
            devices.insert(device.lid(), device);
        }
        Self { devices }
    }
}

impl Driver for VirtualDriver {
    fn drive(&self, target: &DriveTarget<'_>, value: &Value) -> DriveOutcome {
        let Some(device) = self.devices.get(target.uri.lid()) else {
            return DriveOutcome::Failed;
        };
        debug!(uri = %target.uri, %value, "virtual drive");
        device.drive(target, value)
    }

    fn stop(&self) {
        for device in self.devices.values() {
            device.stop();
        }
    }
}

/// Virtual integration that installs simulated resources on a directory.
pub struct VirtualIntegration {
    driver: Arc<VirtualDriver>,
}

impl Default for VirtualIntegration {
    fn default() -> Self {
        Self::new(DEFAULT_TRAVEL)
    }
}

impl VirtualIntegration {
    #[must_use]
    pub fn new(travel: Duration) -> Self {
        Self {
            driver: Arc::new(VirtualDriver::new(travel)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        DRIVER_ID
    }

    /// Register the `virtual` driver and its resources on the local host,
    /// then report the sensor's initial reading.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::DuplicateId`] if installed twice.
    pub fn install(&self, directory: &Directory) -> Result<(), RcError> {
        let driver: Arc<dyn Driver> = Arc::clone(&self.driver) as Arc<dyn Driver>;
        directory.register_driver(DRIVER_ID, driver)?;
        let host = directory.local_host().to_string();
        let mut lids: Vec<&&'static str> = self.driver.devices.keys().collect();
        lids.sort();
        for lid in lids {
            let device = &self.driver.devices[*lid];
            let id = directory.register_resource(&host, DRIVER_ID, lid, device.spec())?;
            if let VirtualDevice::Sensor(sensor) = device {
                sensor.report(&directory.reporter(id))?;
            }
        }
        info!(host, resources = self.driver.devices.len(), "virtual integration installed");
        Ok(())
    }

    /// Unregister the driver together with its resources.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownDriver`] if not installed.
    pub fn teardown(&self, directory: &Directory) -> Result<(), RcError> {
        let host = directory.local_host().to_string();
        directory.unregister_driver(&host, DRIVER_ID)
    }

    /// Whether the virtual light is on.
    #[must_use]
    pub fn light_on(&self) -> bool {
        match self.driver.devices.get(VirtualLight::LID) {
            Some(VirtualDevice::Light(light)) => light.is_on(),
            _ => false,
        }
    }

    /// Current physical position of the shades.
    #[must_use]
    pub fn shades_position(&self) -> f64 {
        match self.driver.devices.get(VirtualShades::LID) {
            Some(VirtualDevice::Shades(shades)) => shades.position(),
            _ => 0.0,
        }
    }

    /// Simulate a new sensor reading.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if not installed.
    pub fn set_temperature(&self, directory: &Directory, celsius: f64) -> Result<(), RcError> {
        let uri = ResourceUri::new(directory.local_host(), DRIVER_ID, VirtualSensor::LID)?;
        let id = directory.resolve(&uri)?;
        match self.driver.devices.get(VirtualSensor::LID) {
            Some(VirtualDevice::Sensor(sensor)) => {
                sensor.set_temperature(&directory.reporter(id), celsius)
            }
            _ => Err(RcError::UnknownResource {
                uri: uri.to_string(),
            }),
        }
    }
}
