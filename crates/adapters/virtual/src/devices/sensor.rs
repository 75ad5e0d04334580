//! Virtual sensor — a read-only temperature.

use std::sync::{Mutex, PoisonError};

use homerc_app::{Reporter, ResourceSpec};
use homerc_domain::error::RcError;
use homerc_domain::value::ValueType;

/// A simulated temperature sensor in °C.
#[derive(Debug)]
pub struct VirtualSensor {
    temperature: Mutex<f64>,
}

impl Default for VirtualSensor {
    fn default() -> Self {
        Self {
            temperature: Mutex::new(21.5),
        }
    }
}

impl VirtualSensor {
    pub const LID: &'static str = "temperature";

    #[must_use]
    pub fn spec() -> ResourceSpec {
        ResourceSpec::read_only(ValueType::Temp)
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        *self.temperature.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new reading and report it.
    ///
    /// # Errors
    ///
    /// Propagates reporter errors.
    pub fn set_temperature(&self, reporter: &Reporter, celsius: f64) -> Result<(), RcError> {
        *self.temperature.lock().unwrap_or_else(PoisonError::into_inner) = celsius;
        reporter.report_value(celsius)
    }

    /// Report the current reading.
    ///
    /// # Errors
    ///
    /// Propagates reporter errors.
    pub fn report(&self, reporter: &Reporter) -> Result<(), RcError> {
        reporter.report_value(self.temperature())
    }
}
