//! Countdown state machine for focus and break sessions.
//!
//! The engine never schedules itself. An external once-per-second source
//! calls [`TimerEngine::tick`] while [`TimerEngine::is_running`] is true.

use crate::models::TimerMode;
use serde::{Deserialize, Serialize};

/// Seconds `reset` always returns to, regardless of configured durations.
pub const RESET_SECS: u32 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was idle; nothing changed.
    Ignored,
    /// One second elapsed. `minute_boundary` is set when a focus countdown
    /// lands on a whole minute with time still left.
    Counted { minute_boundary: bool },
    /// A focus countdown reached zero.
    FocusComplete,
    /// A break countdown reached zero.
    BreakOver,
}

/// Timer mode and remaining time. Only `mode` and `seconds` are persisted;
/// a restored engine always starts idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerEngine {
    mode: TimerMode,
    #[serde(rename = "seconds")]
    seconds_remaining: u32,
    #[serde(skip)]
    status: TimerStatus,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self {
            mode: TimerMode::Focus,
            seconds_remaining: RESET_SECS,
            status: TimerStatus::Idle,
        }
    }
}

impl TimerEngine {
    /// Creates an idle engine at the given position.
    pub fn new(mode: TimerMode, seconds_remaining: u32) -> Self {
        Self {
            mode,
            seconds_remaining,
            status: TimerStatus::Idle,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Switches mode and loads a fresh countdown. Always leaves the timer idle.
    pub fn set_mode(&mut self, mode: TimerMode, minutes: u32) {
        self.status = TimerStatus::Idle;
        self.mode = mode;
        self.seconds_remaining = minutes.saturating_mul(60);
    }

    /// Starts or pauses the countdown. Returns true if now running.
    pub fn toggle(&mut self) -> bool {
        self.status = match self.status {
            TimerStatus::Idle => TimerStatus::Running,
            TimerStatus::Running => TimerStatus::Idle,
        };
        self.is_running()
    }

    /// Stops the countdown and rewinds to 25 minutes. The mode is left as is.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.seconds_remaining = RESET_SECS;
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Ignored;
        }

        if self.seconds_remaining > 0 {
            self.seconds_remaining -= 1;
            if self.seconds_remaining > 0 {
                let minute_boundary =
                    self.mode == TimerMode::Focus && self.seconds_remaining % 60 == 0;
                return TickOutcome::Counted { minute_boundary };
            }
        }

        self.status = TimerStatus::Idle;
        match self.mode {
            TimerMode::Focus => TickOutcome::FocusComplete,
            TimerMode::ShortBreak | TimerMode::LongBreak => TickOutcome::BreakOver,
        }
    }

    /// Fraction of `total_secs` already elapsed, from 0.0 to 1.0.
    pub fn progress_percent(&self, total_secs: u32) -> f32 {
        if total_secs == 0 {
            return 1.0;
        }
        let remaining = self.seconds_remaining.min(total_secs);
        1.0 - (remaining as f32 / total_secs as f32)
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
