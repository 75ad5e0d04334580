//! # homerc-domain
//!
//! Pure domain model for the homerc resource arbitration framework.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Values** and their declared **types** (bool, numbers with units, enums, …)
//! - Define **Value-States** (value, timestamp, validity)
//! - Define **Requests** (prioritised, time-windowed, repeating desires for a value)
//! - Define resource **URIs** and the **patterns** subscribers match them with
//! - Define **Change events** and **Host entries**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! Drivers, clocks and the directory live in the `app` crate.

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod host;
pub mod pattern;
pub mod request;
pub mod uri;
pub mod value;
pub mod value_state;
