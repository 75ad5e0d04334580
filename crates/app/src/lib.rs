//! # homerc-app
//!
//! Application layer — the resource directory, arbitration engine and
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `Driver` — realises arbitrated values on hardware or remote hosts
//!   - `Clock` — the time used for request windows
//! - Provide the **Directory**: hosts, drivers, resources, requests, reports
//! - Run **arbitration** per resource under its own lock
//! - Fan **change events** out to subscribers (`EventProcessor`, `Subscriber`)
//! - Run periodic **garbage collection** of expired requests
//!
//! ## Dependency rule
//! Depends on `homerc-domain` only (plus `tokio` for waiting and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod arbitration;
pub mod directory;
pub mod event_processor;
pub mod gc;
pub mod ports;
mod resource;
pub mod subscriber;

pub use arbitration::Arbitration;
pub use directory::{Directory, DirectoryConfig, GcReport, Reporter, ResourceDetail, ResourceSpec};
pub use gc::{GcTask, spawn_gc};
pub use subscriber::{Subscriber, WaitOutcome};
