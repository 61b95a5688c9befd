use serde::{Deserialize, Serialize};

/// Counts of public capsules by derived status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsuleCounts {
    pub total: usize,
    pub unlocked: usize,
    pub locked: usize,
}
