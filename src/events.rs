//! Publish/subscribe contract between the controller and its consumers.

use crate::models::{Theme, TimerMode};
use std::fmt;

/// Kinds of notification a consumer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TaskListChanged,
    TimerTick,
    TimerChanged,
    SessionComplete,
    BreakOver,
    LevelUp,
    XpChanged,
    ThemeChanged,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskListChanged => "task-list-changed",
            Self::TimerTick => "timer-tick",
            Self::TimerChanged => "timer-changed",
            Self::SessionComplete => "session-complete",
            Self::BreakOver => "break-over",
            Self::LevelUp => "level-up",
            Self::XpChanged => "xp-changed",
            Self::ThemeChanged => "theme-changed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A notification published by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Tasks, filter or sort changed; the view should be re-read.
    TaskListChanged,
    /// One second elapsed on a running timer.
    TimerTick {
        mode: TimerMode,
        seconds_remaining: u32,
    },
    /// The timer was started, paused, reset or switched mode.
    TimerChanged {
        mode: TimerMode,
        seconds_remaining: u32,
        running: bool,
    },
    SessionComplete {
        completed_sessions: u32,
        total_focus_mins: u32,
    },
    BreakOver {
        mode: TimerMode,
    },
    LevelUp {
        level: u32,
    },
    XpChanged {
        xp: u32,
        level: u32,
    },
    ThemeChanged(Theme),
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TaskListChanged => EventKind::TaskListChanged,
            Self::TimerTick { .. } => EventKind::TimerTick,
            Self::TimerChanged { .. } => EventKind::TimerChanged,
            Self::SessionComplete { .. } => EventKind::SessionComplete,
            Self::BreakOver { .. } => EventKind::BreakOver,
            Self::LevelUp { .. } => EventKind::LevelUp,
            Self::XpChanged { .. } => EventKind::XpChanged,
            Self::ThemeChanged(_) => EventKind::ThemeChanged,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&AppEvent)>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

/// Delivers events to handlers in subscription order, on the caller's thread.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&AppEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn publish(&mut self, event: &AppEvent) {
        let kind = event.kind();
        for sub in self.subscriptions.iter_mut().filter(|s| s.kind == kind) {
            (sub.handler)(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
