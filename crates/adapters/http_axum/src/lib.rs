//! # homerc-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the resource directory
//!   (`/api/hosts`, `/api/resources`, `/api/requests`, `/api/gc`)
//! - Stream **change events** to clients as Server-Sent Events
//!   (`/api/events/stream`)
//! - Map HTTP requests into directory calls (driving adapter) and the
//!   results back into JSON responses
//!
//! Requests are submitted in their textual form (`"1 *5 #ui -2h"`),
//! so the API speaks the same language as logs and listings.
//!
//! ## Dependency rule
//! Depends on `homerc-app` (for the directory) and `homerc-domain` (for the
//! types used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
