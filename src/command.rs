//! Line commands for the headless binary and their dispatch.

use crate::app::AppController;
use crate::gamification::XP_PER_LEVEL;
use crate::models::{Filter, ParseError, SortOrder, TaskId, Theme, TimerMode};
use crate::timer::format_time;
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  start | pause          toggle the timer
  reset                  stop and rewind to 25:00
  focus | short | long   switch timer mode
  add <text>             add a task
  done <n> | rm <n>      toggle or delete task n of the list
  filter <all|completed|pending>
  sort <none|priority>
  theme <dark|light>
  list | stats | help | quit";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("not a task number: {0:?}")]
    BadPosition(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleTimer,
    ResetTimer,
    Mode(TimerMode),
    Add(String),
    /// 1-based position in the current view.
    Toggle(usize),
    Delete(usize),
    Filter(Filter),
    Sort(SortOrder),
    Theme(Theme),
    List,
    Stats,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let arg = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "start" | "pause" => Self::ToggleTimer,
            "reset" => Self::ResetTimer,
            "focus" => Self::Mode(TimerMode::Focus),
            "short" => Self::Mode(TimerMode::ShortBreak),
            "long" => Self::Mode(TimerMode::LongBreak),
            // Blank text is kept; the controller ignores it
            "add" => Self::Add(rest.to_string()),
            "done" => Self::Toggle(parse_position(arg("done")?)?),
            "rm" => Self::Delete(parse_position(arg("rm")?)?),
            "filter" => Self::Filter(arg("filter")?.parse()?),
            "sort" => Self::Sort(arg("sort")?.parse()?),
            "theme" => Self::Theme(arg("theme")?.parse()?),
            "list" => Self::List,
            "stats" => Self::Stats,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_position(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::BadPosition(raw.to_string())),
    }
}

/// Result of handling a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    Quit,
}

/// Applies a command to the controller, writing any output to `out`.
pub fn handle_command(
    app: &mut AppController,
    command: Command,
    out: &mut impl Write,
) -> io::Result<CommandResult> {
    match command {
        Command::ToggleTimer => {
            let running = app.toggle_timer();
            let timer = app.timer();
            let verb = if running { "running" } else { "paused" };
            writeln!(
                out,
                "{} {} {}",
                timer.mode().label(),
                format_time(timer.seconds_remaining()),
                verb
            )?;
        }
        Command::ResetTimer => {
            app.reset_timer();
            writeln!(out, "timer reset to {}", format_time(app.timer().seconds_remaining()))?;
        }
        Command::Mode(mode) => {
            app.select_mode(mode);
            writeln!(
                out,
                "{} {}",
                mode.label(),
                format_time(app.timer().seconds_remaining())
            )?;
        }
        Command::Add(text) => {
            if app.add_task(&text).is_none() {
                writeln!(out, "nothing to add")?;
            }
        }
        Command::Toggle(position) => match task_at(app, position) {
            Some(id) => {
                app.toggle_task(id);
            }
            None => writeln!(out, "no task at position {}", position)?,
        },
        Command::Delete(position) => match task_at(app, position) {
            Some(id) => {
                app.delete_task(id);
            }
            None => writeln!(out, "no task at position {}", position)?,
        },
        Command::Filter(filter) => app.set_filter(filter),
        Command::Sort(sort) => app.set_sort(sort),
        Command::Theme(theme) => app.change_theme(theme),
        Command::List => write_list(app, out)?,
        Command::Stats => write_stats(app, out)?,
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(CommandResult::Quit),
    }
    Ok(CommandResult::Continue)
}

fn task_at(app: &AppController, position: usize) -> Option<TaskId> {
    app.view().get(position.checked_sub(1)?).map(|t| t.id)
}

pub fn write_list(app: &AppController, out: &mut impl Write) -> io::Result<()> {
    let view = app.view();
    if view.is_empty() {
        return writeln!(out, "no tasks");
    }
    for (i, task) in view.iter().enumerate() {
        let mark = if task.completed { "✓" } else { "○" };
        writeln!(
            out,
            "{:>2}. {} [{:?}] {}",
            i + 1,
            mark,
            task.priority,
            task.text
        )?;
    }
    Ok(())
}

pub fn write_stats(app: &AppController, out: &mut impl Write) -> io::Result<()> {
    let state = app.state();
    let timer = app.timer();
    let total_secs = state.durations.minutes_for(timer.mode()).saturating_mul(60);
    writeln!(
        out,
        "{} {} | {:.0}% done",
        timer.mode().label(),
        format_time(timer.seconds_remaining()),
        timer.progress_percent(total_secs) * 100.0
    )?;
    writeln!(
        out,
        "⭐ Lvl {} • {} XP ({}/{}) | sessions {} | focus {} m | theme {}",
        state.progress.level,
        state.progress.xp,
        state.progress.xp_into_level(),
        XP_PER_LEVEL,
        state.completed_focus_sessions,
        state.total_focus_time,
        state.theme
    )
}
