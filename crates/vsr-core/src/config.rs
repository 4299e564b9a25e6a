#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Simulated seconds per tick.
    pub dt: f64,
    /// Maximum nesting of composite actions.
    pub max_dispatch_depth: usize,
    /// Abort the whole tick on the first dispatch failure.
    pub transactional: bool,
    /// Reach of near-field messages, in world units.
    pub nfc_range: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            max_dispatch_depth: 32,
            transactional: false,
            nfc_range: 1.0,
        }
    }
}
