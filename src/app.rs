//! Main application state and the controller that owns it.

use crate::audio::{AudioCue, CueSink};
use crate::events::{AppEvent, EventBus, EventKind, SubscriptionId};
use crate::gamification::Progress;
use crate::models::{Durations, Filter, SortOrder, Task, TaskId, Theme, TimerMode};
use crate::persistence::PersistenceStore;
use crate::tasks::TaskStore;
use crate::timer::{TickOutcome, TimerEngine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// XP for completing a task.
pub const TASK_XP: u32 = 10;
/// XP for each whole focus minute counted down.
pub const FOCUS_MINUTE_XP: u32 = 1;
/// XP for finishing a focus session.
pub const SESSION_XP: u32 = 50;

/// The persisted application state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub tasks: TaskStore,
    #[serde(rename = "timer_settings")]
    pub timer: TimerEngine,
    #[serde(rename = "custom_timer_settings")]
    pub durations: Durations,
    /// Stored but not advanced by anything yet.
    pub pomodoro_cycle: u32,
    #[serde(rename = "current_filter")]
    pub filter: Filter,
    #[serde(rename = "current_sort_order")]
    pub sort_order: SortOrder,
    pub completed_focus_sessions: u32,
    /// Minutes.
    pub total_focus_time: u32,
    #[serde(rename = "current_theme")]
    pub theme: Theme,
    #[serde(flatten)]
    pub progress: Progress,
    /// Keys this version does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Owns the state and exposes every operation the presentation layer may call.
///
/// Every mutation of persisted fields is written through to the store before
/// the operation returns. Timer transitions (`toggle`, `set_mode`, `reset` and
/// plain ticks) only move the countdown; its position is written along with
/// the next persisted change.
pub struct AppController {
    state: AppState,
    store: PersistenceStore,
    events: EventBus,
    cues: Option<Box<dyn CueSink>>,
}

impl AppController {
    /// Creates a controller from whatever the store holds.
    pub fn new(store: PersistenceStore) -> Self {
        let state = store.load();
        Self::with_state(state, store)
    }

    pub fn with_state(state: AppState, store: PersistenceStore) -> Self {
        Self {
            state,
            store,
            events: EventBus::new(),
            cues: None,
        }
    }

    /// Routes audio cue requests to `sink`.
    pub fn set_cue_sink(&mut self, sink: Box<dyn CueSink>) {
        self.cues = Some(sink);
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&AppEvent) + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.state.timer
    }

    pub fn progress(&self) -> Progress {
        self.state.progress
    }

    /// Tasks under an explicit filter and sort order.
    pub fn get_view(&self, filter: Filter, sort: SortOrder) -> Vec<&Task> {
        self.state.tasks.view(filter, sort)
    }

    /// Tasks under the current filter and sort order.
    pub fn view(&self) -> Vec<&Task> {
        self.get_view(self.state.filter, self.state.sort_order)
    }

    pub fn add_task(&mut self, text: &str) -> Option<TaskId> {
        let Some(id) = self.state.tasks.add(text) else {
            debug!("ignoring blank task");
            return None;
        };
        self.cue(AudioCue::Notification);
        self.persist();
        self.publish(AppEvent::TaskListChanged);
        Some(id)
    }

    /// Flips a task's completion. Completing awards XP; un-completing takes none back.
    pub fn toggle_task(&mut self, id: TaskId) -> Option<bool> {
        let Some(completed) = self.state.tasks.toggle(id) else {
            debug!(%id, "toggle on unknown task");
            return None;
        };
        if completed {
            self.grant_xp(TASK_XP);
        }
        self.persist();
        self.publish(AppEvent::TaskListChanged);
        Some(completed)
    }

    pub fn delete_task(&mut self, id: TaskId) -> bool {
        if self.state.tasks.delete(id).is_none() {
            debug!(%id, "delete on unknown task");
            return false;
        }
        self.persist();
        self.publish(AppEvent::TaskListChanged);
        true
    }

    pub fn add_xp(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.grant_xp(amount);
        self.persist();
    }

    /// Loads a fresh countdown for `mode`. Leaves the timer idle.
    pub fn set_mode(&mut self, mode: TimerMode, minutes: u32) {
        self.state.timer.set_mode(mode, minutes);
        self.publish_timer_changed();
    }

    /// Switches to `mode` using its configured duration.
    pub fn select_mode(&mut self, mode: TimerMode) {
        let minutes = self.state.durations.minutes_for(mode);
        self.set_mode(mode, minutes);
    }

    /// Starts or pauses the timer. Returns true if now running.
    pub fn toggle_timer(&mut self) -> bool {
        let running = self.state.timer.toggle();
        self.publish_timer_changed();
        running
    }

    pub fn reset_timer(&mut self) {
        self.state.timer.reset();
        self.publish_timer_changed();
    }

    /// Advances a running timer by one second.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.state.timer.tick();
        if outcome == TickOutcome::Ignored {
            return outcome;
        }

        self.publish(AppEvent::TimerTick {
            mode: self.state.timer.mode(),
            seconds_remaining: self.state.timer.seconds_remaining(),
        });

        match outcome {
            TickOutcome::Counted {
                minute_boundary: true,
            } => self.add_xp(FOCUS_MINUTE_XP),
            TickOutcome::FocusComplete => {
                self.cue(AudioCue::Success);
                self.complete_session();
            }
            TickOutcome::BreakOver => {
                self.cue(AudioCue::Success);
                self.cue(AudioCue::Notification);
                self.publish(AppEvent::BreakOver {
                    mode: self.state.timer.mode(),
                });
            }
            TickOutcome::Counted { .. } | TickOutcome::Ignored => {}
        }
        outcome
    }

    pub fn change_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
        self.persist();
        self.publish(AppEvent::ThemeChanged(theme));
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.state.filter = filter;
        self.persist();
        self.publish(AppEvent::TaskListChanged);
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.state.sort_order = sort;
        self.persist();
        self.publish(AppEvent::TaskListChanged);
    }

    /// Updates the configured durations and saves them.
    /// Rejects the change if any duration would be zero.
    pub fn update_durations<F>(&mut self, updater: F) -> bool
    where
        F: FnOnce(&mut Durations),
    {
        let mut durations = self.state.durations;
        updater(&mut durations);
        if !durations.is_valid() {
            debug!(?durations, "rejecting non-positive duration");
            return false;
        }
        self.state.durations = durations;
        self.persist();
        true
    }

    fn complete_session(&mut self) {
        self.state.completed_focus_sessions =
            self.state.completed_focus_sessions.saturating_add(1);
        self.state.total_focus_time = self
            .state
            .total_focus_time
            .saturating_add(self.state.durations.focus_mins);
        self.grant_xp(SESSION_XP);
        self.cue(AudioCue::Success);
        self.persist();
        info!(
            sessions = self.state.completed_focus_sessions,
            "focus session complete"
        );
        self.publish(AppEvent::SessionComplete {
            completed_sessions: self.state.completed_focus_sessions,
            total_focus_mins: self.state.total_focus_time,
        });
    }

    /// Applies an XP gain and announces it. The caller persists.
    fn grant_xp(&mut self, amount: u32) {
        let level_up = self.state.progress.add_xp(amount);
        if let Some(level) = level_up {
            info!(level, "level up");
            self.cue(AudioCue::Success);
            self.publish(AppEvent::LevelUp { level });
        }
        let Progress { xp, level } = self.state.progress;
        self.publish(AppEvent::XpChanged { xp, level });
    }

    fn publish_timer_changed(&mut self) {
        let timer = &self.state.timer;
        let event = AppEvent::TimerChanged {
            mode: timer.mode(),
            seconds_remaining: timer.seconds_remaining(),
            running: timer.is_running(),
        };
        self.publish(event);
    }

    fn publish(&mut self, event: AppEvent) {
        self.events.publish(&event);
    }

    fn cue(&self, cue: AudioCue) {
        if let Some(sink) = &self.cues {
            if let Err(e) = sink.play(cue) {
                warn!(?cue, error = %e, "audio cue failed");
            }
        }
    }

    fn persist(&self) {
        self.store.save(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::models::Priority;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    struct RecordingSink(Rc<RefCell<Vec<AudioCue>>>);

    impl CueSink for RecordingSink {
        fn play(&self, cue: AudioCue) -> Result<(), AudioError> {
            self.0.borrow_mut().push(cue);
            Ok(())
        }
    }

    struct BrokenSink;

    impl CueSink for BrokenSink {
        fn play(&self, _cue: AudioCue) -> Result<(), AudioError> {
            Err(AudioError::Play(rodio::PlayError::NoDevice))
        }
    }

    fn create_test_app() -> (AppController, TempDir) {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("state.json"));
        (AppController::new(store), dir)
    }

    fn saved(app: &AppController) -> AppState {
        app.store.try_load().unwrap().expect("state was persisted")
    }

    fn record(app: &mut AppController, kind: EventKind) -> Rc<RefCell<Vec<AppEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        app.subscribe(kind, move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    fn record_cues(app: &mut AppController) -> Rc<RefCell<Vec<AudioCue>>> {
        let cues = Rc::new(RefCell::new(Vec::new()));
        app.set_cue_sink(Box::new(RecordingSink(Rc::clone(&cues))));
        cues
    }

    #[test]
    fn test_app_initial_state() {
        let (app, _dir) = create_test_app();
        assert_eq!(app.state(), &AppState::default());
        assert!(!app.timer().is_running());
    }

    #[test]
    fn test_add_task_persists_and_notifies() {
        let (mut app, _dir) = create_test_app();
        let changes = record(&mut app, EventKind::TaskListChanged);
        let cues = record_cues(&mut app);

        let id = app.add_task(" Buy milk ").unwrap();

        let task = saved(&app).tasks.get(id).cloned().unwrap();
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(*cues.borrow(), vec![AudioCue::Notification]);
    }

    #[test]
    fn test_add_blank_task_is_silent_noop() {
        let (mut app, _dir) = create_test_app();
        let changes = record(&mut app, EventKind::TaskListChanged);

        assert!(app.add_task("").is_none());
        assert!(app.add_task("   ").is_none());

        assert!(app.state().tasks.is_empty());
        assert!(changes.borrow().is_empty());
        assert!(app.store.try_load().unwrap().is_none());
    }

    #[test]
    fn test_toggle_task_awards_xp_each_completion() {
        let (mut app, _dir) = create_test_app();
        let id = app.add_task("write tests").unwrap();

        assert_eq!(app.toggle_task(id), Some(true));
        assert_eq!(app.toggle_task(id), Some(false));
        assert_eq!(app.toggle_task(id), Some(true));

        assert_eq!(app.progress().xp, 20);
        let stored = saved(&app);
        assert!(stored.tasks.get(id).unwrap().completed);
        assert_eq!(stored.progress.xp, 20);
    }

    #[test]
    fn test_toggle_unknown_task() {
        let (mut app, _dir) = create_test_app();
        assert_eq!(app.toggle_task(TaskId::new()), None);
        assert_eq!(app.progress().xp, 0);
    }

    #[test]
    fn test_delete_task() {
        let (mut app, _dir) = create_test_app();
        let a = app.add_task("a").unwrap();
        let b = app.add_task("b").unwrap();

        assert!(app.delete_task(a));
        assert!(!app.delete_task(a));

        let stored = saved(&app);
        assert_eq!(stored.tasks.len(), 1);
        assert!(stored.tasks.get(b).is_some());
    }

    #[test]
    fn test_view_uses_current_filter_and_sort() {
        let dir = tempdir().unwrap();
        let low = Task::new("low").with_priority(Priority::Low);
        let high = Task::new("high").with_priority(Priority::High);
        let high_id = high.id;
        let state = AppState {
            tasks: TaskStore::new(vec![low, high]),
            ..AppState::default()
        };
        let store = PersistenceStore::new(dir.path().join("state.json"));
        let mut app = AppController::with_state(state, store);

        app.set_sort(SortOrder::Priority);
        let texts: Vec<_> = app.view().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["high", "low"]);

        app.toggle_task(high_id);
        app.set_filter(Filter::Pending);
        let texts: Vec<_> = app.view().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["low"]);

        let stored = saved(&app);
        assert_eq!(stored.filter, Filter::Pending);
        assert_eq!(stored.sort_order, SortOrder::Priority);
    }

    #[test]
    fn test_add_xp_single_level_up_event() {
        let (mut app, _dir) = create_test_app();
        let level_ups = record(&mut app, EventKind::LevelUp);
        let cues = record_cues(&mut app);

        app.add_xp(250);

        assert_eq!(app.progress(), Progress { xp: 250, level: 3 });
        assert_eq!(*level_ups.borrow(), vec![AppEvent::LevelUp { level: 3 }]);
        assert_eq!(*cues.borrow(), vec![AudioCue::Success]);
        assert_eq!(saved(&app).progress, Progress { xp: 250, level: 3 });
    }

    #[test]
    fn test_xp_changed_published() {
        let (mut app, _dir) = create_test_app();
        let changes = record(&mut app, EventKind::XpChanged);

        app.add_xp(5);
        app.add_xp(0);

        assert_eq!(
            *changes.borrow(),
            vec![AppEvent::XpChanged { xp: 5, level: 1 }]
        );
    }

    #[test]
    fn test_focus_session_completes_on_last_tick() {
        let (mut app, _dir) = create_test_app();
        let completions = record(&mut app, EventKind::SessionComplete);
        let cues = record_cues(&mut app);
        app.state.timer = TimerEngine::new(TimerMode::Focus, 1);
        app.toggle_timer();

        assert_eq!(app.tick(), TickOutcome::FocusComplete);

        assert_eq!(app.timer().seconds_remaining(), 0);
        assert!(!app.timer().is_running());
        let stored = saved(&app);
        assert_eq!(stored.completed_focus_sessions, 1);
        assert_eq!(stored.total_focus_time, 25);
        assert_eq!(stored.progress.xp, 50);
        assert_eq!(
            *completions.borrow(),
            vec![AppEvent::SessionComplete {
                completed_sessions: 1,
                total_focus_mins: 25
            }]
        );
        assert_eq!(*cues.borrow(), vec![AudioCue::Success, AudioCue::Success]);
    }

    #[test]
    fn test_session_adds_configured_focus_minutes() {
        let (mut app, _dir) = create_test_app();
        assert!(app.update_durations(|d| d.focus_mins = 45));
        app.state.timer = TimerEngine::new(TimerMode::Focus, 1);
        app.toggle_timer();

        app.tick();

        assert_eq!(app.state().total_focus_time, 45);
    }

    #[test]
    fn test_session_counters_saturate() {
        let (mut app, _dir) = create_test_app();
        app.state.completed_focus_sessions = u32::MAX;
        app.state.total_focus_time = u32::MAX - 10;
        app.state.timer = TimerEngine::new(TimerMode::Focus, 1);
        app.toggle_timer();

        assert_eq!(app.tick(), TickOutcome::FocusComplete);

        assert_eq!(app.state().completed_focus_sessions, u32::MAX);
        assert_eq!(app.state().total_focus_time, u32::MAX);
        assert_eq!(app.progress().xp, 50);
    }

    #[test]
    fn test_full_focus_session_xp() {
        let (mut app, _dir) = create_test_app();
        app.set_mode(TimerMode::Focus, 2);
        app.toggle_timer();

        let mut outcome = TickOutcome::Ignored;
        for _ in 0..120 {
            outcome = app.tick();
        }

        assert_eq!(outcome, TickOutcome::FocusComplete);
        // One minute boundary (at 60s left) plus the session bonus
        assert_eq!(app.progress().xp, 51);
        assert_eq!(app.tick(), TickOutcome::Ignored);
    }

    #[test]
    fn test_minute_boundary_awards_xp_and_persists() {
        let (mut app, _dir) = create_test_app();
        app.state.timer = TimerEngine::new(TimerMode::Focus, 61);
        app.toggle_timer();

        app.tick();

        let stored = saved(&app);
        assert_eq!(stored.progress.xp, 1);
        assert_eq!(stored.timer.seconds_remaining(), 60);
    }

    #[test]
    fn test_break_over() {
        let (mut app, _dir) = create_test_app();
        let breaks = record(&mut app, EventKind::BreakOver);
        let cues = record_cues(&mut app);
        app.state.timer = TimerEngine::new(TimerMode::ShortBreak, 61);
        app.toggle_timer();

        for _ in 0..61 {
            app.tick();
        }

        assert_eq!(app.progress().xp, 0);
        assert_eq!(app.state().completed_focus_sessions, 0);
        assert_eq!(
            *breaks.borrow(),
            vec![AppEvent::BreakOver {
                mode: TimerMode::ShortBreak
            }]
        );
        assert_eq!(
            *cues.borrow(),
            vec![AudioCue::Success, AudioCue::Notification]
        );
    }

    #[test]
    fn test_tick_while_idle_does_nothing() {
        let (mut app, _dir) = create_test_app();
        let ticks = record(&mut app, EventKind::TimerTick);

        assert_eq!(app.tick(), TickOutcome::Ignored);
        assert_eq!(app.timer().seconds_remaining(), 1500);
        assert!(ticks.borrow().is_empty());
    }

    #[test]
    fn test_toggle_pauses_countdown() {
        let (mut app, _dir) = create_test_app();
        let changes = record(&mut app, EventKind::TimerChanged);

        assert!(app.toggle_timer());
        app.tick();
        assert!(!app.toggle_timer());
        app.tick();

        assert_eq!(app.timer().seconds_remaining(), 1499);
        assert_eq!(changes.borrow().len(), 2);
    }

    #[test]
    fn test_select_mode_uses_configured_minutes() {
        let (mut app, _dir) = create_test_app();
        app.update_durations(|d| d.long_break_mins = 20);

        app.select_mode(TimerMode::LongBreak);

        assert_eq!(app.timer().mode(), TimerMode::LongBreak);
        assert_eq!(app.timer().seconds_remaining(), 1200);
    }

    #[test]
    fn test_reset_uses_fixed_duration() {
        let (mut app, _dir) = create_test_app();
        app.update_durations(|d| d.focus_mins = 50);
        app.select_mode(TimerMode::Focus);
        app.toggle_timer();
        app.tick();

        app.reset_timer();

        assert_eq!(app.timer().seconds_remaining(), 1500);
        assert!(!app.timer().is_running());
    }

    #[test]
    fn test_set_mode_does_not_persist() {
        let (mut app, _dir) = create_test_app();
        app.set_mode(TimerMode::ShortBreak, 5);
        assert!(app.store.try_load().unwrap().is_none());

        app.change_theme(Theme::Light);
        let stored = saved(&app);
        assert_eq!(stored.timer.mode(), TimerMode::ShortBreak);
        assert_eq!(stored.timer.seconds_remaining(), 300);
    }

    #[test]
    fn test_change_theme() {
        let (mut app, _dir) = create_test_app();
        let themes = record(&mut app, EventKind::ThemeChanged);

        app.change_theme(Theme::Light);

        assert_eq!(saved(&app).theme, Theme::Light);
        assert_eq!(*themes.borrow(), vec![AppEvent::ThemeChanged(Theme::Light)]);
    }

    #[test]
    fn test_update_durations_rejects_zero() {
        let (mut app, _dir) = create_test_app();
        assert!(!app.update_durations(|d| d.short_break_mins = 0));
        assert_eq!(app.state().durations, Durations::default());
        assert!(app.store.try_load().unwrap().is_none());
    }

    #[test]
    fn test_unsubscribe() {
        let (mut app, _dir) = create_test_app();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let id = app.subscribe(EventKind::TaskListChanged, move |_| {
            *counter.borrow_mut() += 1;
        });

        app.add_task("one");
        assert!(app.unsubscribe(id));
        app.add_task("two");

        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_broken_audio_does_not_interrupt() {
        let (mut app, _dir) = create_test_app();
        app.set_cue_sink(Box::new(BrokenSink));

        let id = app.add_task("still works").unwrap();
        app.toggle_task(id);

        assert_eq!(app.progress().xp, 10);
        assert_eq!(saved(&app).tasks.len(), 1);
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let dir = tempdir().unwrap();
        // Store path is a directory, so every save fails
        let mut app = AppController::new(PersistenceStore::new(dir.path()));

        let id = app.add_task("unsaved").unwrap();
        app.toggle_task(id);

        assert_eq!(app.state().tasks.len(), 1);
        assert_eq!(app.progress().xp, 10);
    }

    #[test]
    fn test_state_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut app = AppController::new(PersistenceStore::new(&path));
        let id = app.add_task("persisted").unwrap();
        app.toggle_task(id);
        app.change_theme(Theme::Light);
        let before = app.state().clone();
        drop(app);

        let app = AppController::new(PersistenceStore::new(&path));
        assert_eq!(app.state(), &before);
    }
}
