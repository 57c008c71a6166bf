//! ZenTask - a focus timer, to-do list and XP tracker.
//!
//! Headless front end: reads commands from stdin, plays cues and shows
//! desktop notifications while the timer runs.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Sender};
use std::thread;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use zentask::audio::AudioPlayer;
use zentask::command::{self, Command, CommandResult};
use zentask::config::Config;
use zentask::notifications;
use zentask::ticker::{self, Signal};
use zentask::timer::format_time;
use zentask::{AppController, AppEvent, EventKind, PersistenceStore};

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Prints timer and progress events to stdout.
fn subscribe_console(app: &mut AppController) {
    app.subscribe(EventKind::TimerTick, |event| {
        if let AppEvent::TimerTick {
            mode,
            seconds_remaining,
        } = event
        {
            if seconds_remaining % 60 == 0 {
                println!("{} {}", mode.label(), format_time(*seconds_remaining));
            }
        }
    });
    app.subscribe(EventKind::SessionComplete, |_| {
        println!("Session Complete! 🎉 +50 XP");
    });
    app.subscribe(EventKind::BreakOver, |_| {
        println!("☕ Break Over! Time to focus.");
    });
    app.subscribe(EventKind::LevelUp, |event| {
        if let AppEvent::LevelUp { level } = event {
            println!("You reached Level {}! ⭐", level);
        }
    });
    app.subscribe(EventKind::ThemeChanged, |event| {
        if let AppEvent::ThemeChanged(theme) = event {
            println!("theme: {}", theme);
        }
    });
}

/// Forwards parsed stdin lines until EOF, then asks the main loop to quit.
fn read_commands(tx: Sender<Signal>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(cmd) => {
                if tx.send(Signal::Command(cmd)).is_err() {
                    return;
                }
            }
            Err(e) => println!("{} (type 'help')", e),
        }
    }
    let _ = tx.send(Signal::Command(Command::Quit));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_logging(&config);

    let mut app = AppController::new(PersistenceStore::new(&config.data_file));
    info!(path = %config.data_file.display(), "using data file");

    // Audio is created on the main thread to avoid Send issues
    match AudioPlayer::new() {
        Ok(player) => app.set_cue_sink(Box::new(player)),
        Err(e) => warn!(error = %e, "audio unavailable, cues disabled"),
    }
    notifications::subscribe_desktop(&mut app);
    subscribe_console(&mut app);

    let (tx, rx) = mpsc::channel();
    ticker::spawn_ticker(config.tick_interval, tx.clone());
    thread::spawn(move || read_commands(tx));

    println!("{}", command::HELP);
    let mut stdout = io::stdout();
    let mut last_clock = None;

    for signal in rx {
        match signal {
            Signal::Tick => {
                if app.timer().is_running() {
                    app.tick();
                }
            }
            Signal::Clock(now) => last_clock = Some(now),
            Signal::Command(cmd) => {
                if cmd == Command::Stats {
                    if let Some(now) = &last_clock {
                        println!("🕐 {}", ticker::format_clock(now));
                    }
                }
                if command::handle_command(&mut app, cmd, &mut stdout)? == CommandResult::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
