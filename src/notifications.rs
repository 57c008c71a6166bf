//! Desktop notifications for timer and level events.

use crate::app::AppController;
use crate::events::{AppEvent, EventKind};
use notify_rust::Notification;
use std::thread;
use tracing::warn;

/// Shows a notification when a focus session is completed.
/// Runs in a background thread to avoid blocking.
pub fn notify_session_complete(count: u32) {
    show("Session Complete! 🎉".to_string(), session_body(count));
}

/// Shows a notification when a break is over.
pub fn notify_break_over() {
    show("Break Over! ☕".to_string(), "Time to focus.".to_string());
}

/// Shows a notification when a new level is reached.
pub fn notify_level_up(level: u32) {
    show("Level Up! ⭐".to_string(), format!("You reached Level {}!", level));
}

fn session_body(count: u32) -> String {
    if count == 1 {
        "+50 XP. You've completed your first focus session.".to_string()
    } else {
        format!("+50 XP. You've completed {} focus sessions.", count)
    }
}

fn show(summary: String, body: String) {
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(&summary)
            .body(&body)
            .sound_name("default")
            .show()
        {
            warn!(error = %e, "failed to show notification");
        }
    });
}

/// Routes session, break and level events to desktop notifications.
pub fn subscribe_desktop(app: &mut AppController) {
    app.subscribe(EventKind::SessionComplete, |event| {
        if let AppEvent::SessionComplete {
            completed_sessions, ..
        } = event
        {
            notify_session_complete(*completed_sessions);
        }
    });
    app.subscribe(EventKind::BreakOver, |_| notify_break_over());
    app.subscribe(EventKind::LevelUp, |event| {
        if let AppEvent::LevelUp { level } = event {
            notify_level_up(*level);
        }
    });
}
