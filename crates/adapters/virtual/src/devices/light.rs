//! Virtual light — a writable bool, switched instantly.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use homerc_app::ResourceSpec;
use homerc_app::ports::DriveOutcome;
use homerc_domain::value::{Value, ValueType};

/// A simulated light that can be turned on and off.
#[derive(Debug, Default)]
pub struct VirtualLight {
    on: Mutex<bool>,
}

impl VirtualLight {
    pub const LID: &'static str = "light";

    #[must_use]
    pub fn spec() -> ResourceSpec {
        ResourceSpec::writable(ValueType::Bool)
    }

    /// Whether the light is currently on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        *self.on.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the light. Anything but a bool is refused.
    pub fn drive(&self, value: &Value) -> DriveOutcome {
        let Value::Bool(on) = value else {
            return DriveOutcome::Failed;
        };
        *self.on.lock().unwrap_or_else(PoisonError::into_inner) = *on;
        debug!(on, "virtual light switched");
        DriveOutcome::Realized
    }
}
