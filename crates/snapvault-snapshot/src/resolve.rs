//! Symbolic snapshot references.

use crate::{SnapshotId, SnapshotIndex};
use tracing::info;

/// Most recent snapshot.
pub const HEAD: &str = "HEAD";

/// Second most recent snapshot.
pub const PREV: &str = "PREV";

/// Outcome of resolving a user-supplied reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: SnapshotId,
    /// `PREV` fell back to the only snapshot there is.
    pub degraded: bool,
}

/// Maps `HEAD` and `PREV` onto concrete ids. Anything else passes through
/// unchanged; existence is the caller's concern.
pub struct IdResolver<'a> {
    index: &'a SnapshotIndex,
}

impl<'a> IdResolver<'a> {
    pub fn new(index: &'a SnapshotIndex) -> Self {
        Self { index }
    }

    pub fn resolve(&self, symbol: &str) -> Resolution {
        let passthrough = || Resolution {
            id: SnapshotId::from(symbol),
            degraded: false,
        };

        match symbol {
            HEAD => match self.index.latest() {
                Some(latest) => Resolution {
                    id: latest.id.clone(),
                    degraded: false,
                },
                None => passthrough(),
            },
            PREV => match (self.index.previous(), self.index.latest()) {
                (Some(prev), _) => Resolution {
                    id: prev.id.clone(),
                    degraded: false,
                },
                (None, Some(only)) => {
                    info!(id = %only.id, "Only one snapshot exists, PREV resolves to it");
                    Resolution {
                        id: only.id.clone(),
                        degraded: true,
                    }
                }
                (None, None) => passthrough(),
            },
            _ => passthrough(),
        }
    }

    /// Shorthand for `resolve(symbol).id`.
    pub fn resolve_id(&self, symbol: &str) -> SnapshotId {
        self.resolve(symbol).id
    }
}
