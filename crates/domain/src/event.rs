//! Change events delivered to subscribers.

use serde::{Deserialize, Serialize};

use crate::id::ResourceId;
use crate::time::Timestamp;
use crate::uri::ResourceUri;
use crate::value_state::ValueState;

/// A resource's value-state changed from `old` to `new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub resource: ResourceId,
    pub uri: ResourceUri,
    pub old: ValueState,
    pub new: ValueState,
    pub timestamp: Timestamp,
}
