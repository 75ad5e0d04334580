//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the resource directory and the outside
//! world. Drivers realise arbitrated values on hardware or on remote hosts;
//! clocks supply the time used for request windows.

pub mod clock;
pub mod driver;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{DriveOutcome, DriveTarget, Driver};
