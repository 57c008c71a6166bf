//! Experience points and level tracking.

use serde::{Deserialize, Serialize};

/// XP needed per level.
pub const XP_PER_LEVEL: u32 = 100;

/// Level implied by an XP total.
pub fn level_for(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

/// Accumulated XP and the level derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub xp: u32,
    pub level: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

impl Progress {
    /// Adds XP and recomputes the level.
    ///
    /// Returns the new level if it went up. A single call reports at most one
    /// level-up even when several thresholds were crossed.
    pub fn add_xp(&mut self, amount: u32) -> Option<u32> {
        if amount == 0 {
            return None;
        }
        let previous = self.level;
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for(self.xp);

        (self.level > previous).then_some(self.level)
    }

    /// XP earned towards the next level.
    pub fn xp_into_level(&self) -> u32 {
        self.xp % XP_PER_LEVEL
    }
}
