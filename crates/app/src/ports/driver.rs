//! Driver port — backends that realise a resource's arbitrated value.
//!
//! A driver owns one or more resources. Whenever arbitration selects a new
//! target value for one of them, the directory calls [`Driver::drive`] while
//! holding that resource's lock. The driver either answers synchronously
//! through the returned [`DriveOutcome`], or returns [`DriveOutcome::Busy`]
//! and reports completion later from another task through the
//! [`Reporter`] in the [`DriveTarget`].
//!
//! Calling back into the directory for the *same* resource from inside
//! `drive` deadlocks. This is a programming error and is not detected.

use homerc_domain::id::ResourceId;
use homerc_domain::uri::ResourceUri;
use homerc_domain::value::{Value, ValueType};

use crate::directory::Reporter;

/// What a driver did with a drive call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveOutcome {
    /// The requested value is now in effect.
    Realized,
    /// The driver realised a different value.
    Reported(Value),
    /// Realisation is outstanding; completion comes through the reporter.
    Busy,
    /// The value could not be realised; the resource becomes unknown.
    Failed,
    /// Nothing to report now.
    Silent,
}

/// The resource a drive call targets.
#[derive(Debug)]
pub struct DriveTarget<'a> {
    pub id: ResourceId,
    pub uri: &'a ResourceUri,
    pub value_type: ValueType,
    pub reporter: &'a Reporter,
}

/// A backend that realises resource values.
pub trait Driver: Send + Sync {
    /// Realise `value` on `target`. The value is already converted to the
    /// resource's declared type.
    fn drive(&self, target: &DriveTarget<'_>, value: &Value) -> DriveOutcome;

    /// Called once when the driver is unregistered or the directory shuts
    /// down.
    fn stop(&self) {}
}
