use serde::{Deserialize, Serialize};

/// Counts shown above the results table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCounts {
    /// Facilities returned by the last search.
    pub found: usize,
    /// Facilities with a report already in storage.
    pub saved: usize,
}
