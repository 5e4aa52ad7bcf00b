use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Front-end metadata registration events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataEvent {
    SourceLoaded { url: String, providers: usize },

    SourceFailed { url: String, failure: FailureContext },

    /// All sources settled and the event map was rebuilt
    Registered {
        sources: usize,
        failed_sources: usize,
        events: usize,
    },

    /// Periodic refresh swapped in a new snapshot
    Refreshed { events: usize },
}
