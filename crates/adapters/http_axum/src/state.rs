//! Shared application state for axum handlers.

use homerc_app::Directory;

/// Application state shared across all axum handlers.
///
/// [`Directory`] is a cheap handle, so cloning the state per request only
/// bumps a reference count.
#[derive(Clone)]
pub struct AppState {
    pub directory: Directory,
}

impl AppState {
    #[must_use]
    pub fn new(directory: Directory) -> Self {
        Self { directory }
    }
}
