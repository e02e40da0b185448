//! Configurable guard thresholds.

use serde::{Deserialize, Serialize};

/// Thresholds for the loop guard. All counters apply per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardLimits {
    /// Maximum calls to any single tool per session.
    pub max_per_tool: u32,

    /// Maximum tool calls in total per session.
    pub max_total: u32,

    /// Consecutive identical calls (same tool, same arguments) tolerated
    /// before the turn is halted as a stuck loop. With the default of 3,
    /// the fourth identical call in a row trips the guard.
    pub max_consecutive: u32,
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            max_per_tool: 5,
            max_total: 15,
            max_consecutive: 3,
        }
    }
}
