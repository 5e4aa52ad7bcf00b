//! Fragments a render is still waiting for

use std::collections::BTreeSet;

/// Snapshot of the fragment ids present when a render starts
///
/// The set only shrinks; ids reported later that were not part of the
/// snapshot are ignored.
#[derive(Debug, Clone, Default)]
pub struct WaitSet {
    pending: BTreeSet<String>,
}

impl WaitSet {
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Mark `id` as completed; returns whether it was still pending
    pub fn complete(&mut self, id: &str) -> bool {
        self.pending.remove(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        self.pending.iter().cloned().collect()
    }
}
