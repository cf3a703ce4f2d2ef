//! Identifiers for simulation entities
//!
//! Buckets live in an index-addressed arena, so a `BucketId` is just the
//! position of the bucket in `SimulationConfig::buckets`.

use serde::{Deserialize, Serialize};

/// Index of a bucket within a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketId(pub u16);

impl BucketId {
    #[must_use]
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BucketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
