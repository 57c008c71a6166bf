//! Periodic signal source for the timer and the clock display.

use crate::command::Command;
use chrono::{DateTime, Local};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Message delivered to the thread that owns the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Timer heartbeat. Only acted on while the timer is running.
    Tick,
    /// Wall-clock refresh for display; carries no timer logic.
    Clock(DateTime<Local>),
    /// A parsed user command.
    Command(Command),
}

/// Sends a tick and a clock refresh every `period` until the receiver is dropped.
pub fn run_ticker(period: Duration, tx: Sender<Signal>) {
    loop {
        thread::sleep(period);

        if tx.send(Signal::Tick).is_err() {
            break;
        }
        if tx.send(Signal::Clock(Local::now())).is_err() {
            break;
        }
    }
}

pub fn spawn_ticker(period: Duration, tx: Sender<Signal>) -> JoinHandle<()> {
    thread::spawn(move || run_ticker(period, tx))
}

/// Formats a wall-clock reading as HH:MM:SS.
pub fn format_clock(now: &DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}
