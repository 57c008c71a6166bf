//! ZenTask - focus timer, to-do list and XP tracker.
//!
//! The state engine lives here: [`AppController`] owns the persisted
//! [`AppState`] and is the only way to change it. A presentation layer calls
//! its operations, subscribes to its events and drives [`AppController::tick`]
//! from a once-per-second signal.

pub mod app;
pub mod audio;
pub mod command;
pub mod config;
pub mod events;
pub mod gamification;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod tasks;
pub mod ticker;
pub mod timer;

pub use app::{AppController, AppState};
pub use events::{AppEvent, EventKind, SubscriptionId};
pub use persistence::PersistenceStore;
