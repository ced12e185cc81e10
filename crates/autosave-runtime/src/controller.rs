//! Auto-save controller: binds form snapshots to the injected save handler.
//!
//! Runs as one tokio task that owns the session state. Callers talk to it
//! through [`AutoSaveController`], which sends commands over a channel and
//! reads status through a `watch` snapshot plus an ordered `broadcast` of
//! status changes. The task is the only writer, so no lock guards the
//! session.
//!
//! Rules enforced by the task:
//!
//! - **Debounce**: every trigger restarts the countdown with the newest
//!   payload; only the payload that survives the quiet period is saved.
//! - **Dirty check**: a payload equal to the last successful save (or the
//!   baseline) is not saved.
//! - **Single flight**: at most one save runs. A payload whose countdown
//!   elapses mid-flight is queued, overwriting any older queued payload, and
//!   saved once right after the flight.
//! - **Display revert**: `saved` and `error` fall back to `idle` after their
//!   display windows unless a new trigger arrives first. A trigger that
//!   never leads to a save drops the display straight to `idle`.
//! - **Teardown**: shutting down drops the countdown, the revert timer and
//!   any in-flight save; nothing fires afterwards.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use autosave_core::{
    AutoSaveConfig, AutoSaveSession, SaveError, SaveSnapshot, SaveStatus, StatusChange,
    TransitionError,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::debounce::DebounceScheduler;
use crate::error::RuntimeError;
use crate::handler::{SaveHandler, SaveHooks};

/// Capacity of the status change broadcast. Slow subscribers lag, they do
/// not block the controller.
const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// Result of [`AutoSaveController::force_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForceSaveOutcome {
    /// The latest payload was persisted.
    Saved,
    /// The save carrying the latest payload failed with this message.
    Failed(String),
    /// Nothing differed from the last successful save.
    NothingToSave,
}

enum Command<T> {
    Trigger(T),
    ForceSave(oneshot::Sender<ForceSaveOutcome>),
    SetEnabled(bool),
    Shutdown,
}

/// Handle to a running auto-save session. Dropping it tears the session down.
pub struct AutoSaveController<T> {
    commands: mpsc::UnboundedSender<Command<T>>,
    snapshot: watch::Receiver<SaveSnapshot>,
    transitions: broadcast::Sender<StatusChange>,
    task: Option<JoinHandle<()>>,
}

/// Builder for [`AutoSaveController`].
pub struct AutoSaveBuilder<T, H> {
    handler: H,
    config: AutoSaveConfig,
    hooks: SaveHooks,
    baseline: Option<T>,
}

impl<T, H> AutoSaveBuilder<T, H>
where
    T: Clone + PartialEq + Send + 'static,
    H: SaveHandler<T>,
{
    #[must_use]
    pub fn config(mut self, config: AutoSaveConfig) -> Self {
        self.config = config;
        self
    }

    /// Snapshot the form starts with; triggering it unchanged saves nothing.
    #[must_use]
    pub fn baseline(mut self, payload: T) -> Self {
        self.baseline = Some(payload);
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: SaveHooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn on_success(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks = self.hooks.on_success(hook);
        self
    }

    #[must_use]
    pub fn on_error(mut self, hook: impl Fn(&SaveError) + Send + Sync + 'static) -> Self {
        self.hooks = self.hooks.on_error(hook);
        self
    }

    /// Validate the config and start the session task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<AutoSaveController<T>, RuntimeError> {
        self.config.validate()?;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(SaveSnapshot::default());
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        let save_loop = SaveLoop {
            handler: Arc::new(self.handler),
            enabled: self.config.enabled,
            config: self.config,
            hooks: self.hooks,
            session: AutoSaveSession::new(),
            debounce: DebounceScheduler::new(),
            latest: None,
            last_saved: self.baseline,
            queued: None,
            in_flight: None,
            revert_at: None,
            waiters: Vec::new(),
            queued_waiters: Vec::new(),
            snapshot_tx,
            transitions_tx: transitions.clone(),
        };
        let task = tokio::spawn(save_loop.run(command_rx));

        Ok(AutoSaveController {
            commands,
            snapshot,
            transitions,
            task: Some(task),
        })
    }
}

impl<T> AutoSaveController<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn builder<H: SaveHandler<T>>(handler: H) -> AutoSaveBuilder<T, H> {
        AutoSaveBuilder {
            handler,
            config: AutoSaveConfig::default(),
            hooks: SaveHooks::default(),
            baseline: None,
        }
    }

    /// Start a session with `config` and `hooks`.
    pub fn spawn<H: SaveHandler<T>>(
        handler: H,
        config: AutoSaveConfig,
        hooks: SaveHooks,
    ) -> Result<Self, RuntimeError> {
        Self::builder(handler).config(config).hooks(hooks).spawn()
    }

    /// Offer a complete form snapshot. Save failures never surface here;
    /// the only error is a controller that has been shut down.
    pub fn trigger_save(&self, payload: T) -> Result<(), RuntimeError> {
        self.send(Command::Trigger(payload))
    }

    /// Skip the debounce and save the latest payload now.
    ///
    /// Resolves when the save carrying the latest payload finishes, or
    /// immediately with [`ForceSaveOutcome::NothingToSave`].
    pub async fn force_save(&self) -> Result<ForceSaveOutcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ForceSave(tx))?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), RuntimeError> {
        self.send(Command::SetEnabled(enabled))
    }

    pub fn snapshot(&self) -> SaveSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn status(&self) -> SaveStatus {
        self.snapshot.borrow().status
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.borrow().last_saved_at
    }

    /// Message of the last failed save. Cleared when the next save begins,
    /// not on trigger, so it stays readable while the user keeps editing.
    pub fn error_message(&self) -> Option<String> {
        self.snapshot.borrow().error_message.clone()
    }

    /// Latest-value view of the session, for renderers.
    pub fn subscribe(&self) -> watch::Receiver<SaveSnapshot> {
        self.snapshot.clone()
    }

    /// Every status change, in the order the controller made them.
    pub fn transitions(&self) -> broadcast::Receiver<StatusChange> {
        self.transitions.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Tear the session down and wait for the task to stop.
    pub async fn shutdown(mut self) -> Result<(), RuntimeError> {
        let _ = self.commands.send(Command::Shutdown);
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(()),
        }
    }

    fn send(&self, command: Command<T>) -> Result<(), RuntimeError> {
        self.commands.send(command).map_err(|_| RuntimeError::Closed)
    }
}

impl<T> Drop for AutoSaveController<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.commands.send(Command::Shutdown);
            task.abort();
        }
    }
}

// ─── Session task ────────────────────────────────────────────────────

type SaveFuture = Pin<Box<dyn Future<Output = Result<(), SaveError>> + Send>>;

struct InFlight<T> {
    payload: T,
    future: SaveFuture,
}

struct SaveLoop<T, H> {
    handler: Arc<H>,
    config: AutoSaveConfig,
    enabled: bool,
    hooks: SaveHooks,
    session: AutoSaveSession,
    debounce: DebounceScheduler<T>,
    /// Most recent snapshot offered by the form.
    latest: Option<T>,
    /// Last successfully saved snapshot, or the baseline.
    last_saved: Option<T>,
    /// Settled payload waiting for the in-flight save to finish.
    queued: Option<T>,
    in_flight: Option<InFlight<T>>,
    revert_at: Option<Instant>,
    /// `force_save` callers waiting on the in-flight save.
    waiters: Vec<oneshot::Sender<ForceSaveOutcome>>,
    /// `force_save` callers waiting on the queued save.
    queued_waiters: Vec<oneshot::Sender<ForceSaveOutcome>>,
    snapshot_tx: watch::Sender<SaveSnapshot>,
    transitions_tx: broadcast::Sender<StatusChange>,
}

impl<T, H> SaveLoop<T, H>
where
    T: Clone + PartialEq + Send + 'static,
    H: SaveHandler<T>,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<T>>) {
        tracing::debug!(debounce_ms = self.config.debounce_ms, "auto-save session started");
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },

                result = wait_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.finish_save(result);
                }

                payload = self.debounce.elapsed(), if self.debounce.is_pending() => {
                    self.debounce_settled(payload);
                }

                () = wait_until(self.revert_at), if self.revert_at.is_some() => {
                    self.revert_to_idle();
                }
            }
        }
        tracing::debug!(
            dropped_pending = self.debounce.is_pending(),
            dropped_in_flight = self.in_flight.is_some(),
            "auto-save session torn down"
        );
    }

    fn handle_command(&mut self, command: Command<T>) {
        match command {
            Command::Trigger(payload) => self.trigger(payload),
            Command::ForceSave(reply) => self.force_save(reply),
            Command::SetEnabled(enabled) => self.set_enabled(enabled),
            Command::Shutdown => {}
        }
    }

    fn trigger(&mut self, payload: T) {
        self.latest = Some(payload.clone());
        if !self.enabled {
            tracing::trace!("auto-save disabled, payload kept dirty");
            return;
        }
        // A new edit preempts the saved/error display.
        self.revert_at = None;
        self.debounce.schedule(payload, self.config.debounce());
    }

    fn force_save(&mut self, reply: oneshot::Sender<ForceSaveOutcome>) {
        self.debounce.cancel();

        // Whatever runs after the flight must be the latest payload, never
        // an older queued one.
        let carried_by_flight = self
            .in_flight
            .as_ref()
            .map(|f| self.latest.as_ref().is_none_or(|latest| *latest == f.payload));
        match (carried_by_flight, self.latest.clone()) {
            (Some(true), _) | (Some(false), None) => {
                self.queued = None;
                self.waiters.append(&mut self.queued_waiters);
                self.waiters.push(reply);
            }
            (Some(false), Some(latest)) => {
                self.queued = Some(latest);
                self.queued_waiters.push(reply);
            }
            (None, Some(latest)) if self.is_dirty(&latest) => {
                self.waiters.push(reply);
                self.begin_save(latest);
            }
            (None, _) => {
                self.settle_display();
                let _ = reply.send(ForceSaveOutcome::NothingToSave);
            }
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        tracing::debug!(enabled, "auto-save toggled");

        if !enabled {
            self.debounce.cancel();
            self.settle_display();
            return;
        }
        if let Some(latest) = self.latest.clone().filter(|p| self.is_dirty(p)) {
            self.revert_at = None;
            self.debounce.schedule(latest, self.config.debounce());
        }
    }

    fn debounce_settled(&mut self, payload: T) {
        if self.in_flight.is_some() {
            tracing::debug!("save in flight, queueing settled payload");
            self.queued = Some(payload);
            return;
        }

        if self.is_dirty(&payload) {
            self.begin_save(payload);
        } else {
            tracing::trace!("settled payload unchanged since last save");
            self.settle_display();
        }
    }

    /// Drop a saved/error display whose revert timer a trigger cancelled.
    fn settle_display(&mut self) {
        if self.in_flight.is_some() || self.revert_at.is_some() {
            return;
        }
        let changes = self.session.settle(Utc::now());
        self.publish(changes);
    }

    fn begin_save(&mut self, payload: T) {
        self.revert_at = None;
        let changes = self.session.begin(Utc::now());
        self.publish(changes);
        tracing::info!("saving draft");

        let handler = Arc::clone(&self.handler);
        let timeout = self.config.save_timeout();
        let snapshot = payload.clone();
        let future: SaveFuture = Box::pin(async move {
            let save = handler.save(snapshot);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, save).await.unwrap_or_else(|_| {
                    Err(SaveError::new(format!(
                        "save timed out after {}ms",
                        limit.as_millis()
                    )))
                }),
                None => save.await,
            }
        });

        self.in_flight = Some(InFlight { payload, future });
    }

    fn finish_save(&mut self, result: Result<(), SaveError>) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let now = Utc::now();

        let outcome = match result {
            Ok(()) => {
                self.last_saved = Some(flight.payload);
                let changes = self.session.succeed(now);
                self.publish(changes);
                tracing::info!("draft saved");
                self.hooks.success();
                self.revert_at = Some(Instant::now() + self.config.saved_display());
                ForceSaveOutcome::Saved
            }
            Err(err) => {
                // The payload stays dirty: the next trigger or force_save retries it.
                let changes = self.session.fail(err.message(), now);
                self.publish(changes);
                tracing::warn!(error = %err, "draft save failed");
                self.hooks.error(&err);
                self.revert_at = Some(Instant::now() + self.config.error_display());
                ForceSaveOutcome::Failed(err.message().to_string())
            }
        };

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }

        let Some(next) = self.queued.take() else {
            return;
        };
        self.waiters.append(&mut self.queued_waiters);
        if self.is_dirty(&next) {
            self.begin_save(next);
        } else {
            // The queued payload already matches what is stored.
            for waiter in self.waiters.drain(..) {
                let _ = waiter.send(ForceSaveOutcome::NothingToSave);
            }
        }
    }

    fn revert_to_idle(&mut self) {
        self.revert_at = None;
        let changes = self.session.display_elapsed(Utc::now());
        self.publish(changes);
    }

    fn is_dirty(&self, payload: &T) -> bool {
        self.last_saved.as_ref() != Some(payload)
    }

    fn publish(&self, changes: Result<Vec<StatusChange>, TransitionError>) {
        let changes = match changes {
            Ok(changes) => changes,
            Err(err) => {
                tracing::error!(error = %err, "auto-save state machine rejected transition");
                return;
            }
        };
        if changes.is_empty() {
            return;
        }
        for change in &changes {
            tracing::debug!(from = %change.from, to = %change.to, "save status");
            let _ = self.transitions_tx.send(*change);
        }
        self.snapshot_tx.send_replace(self.session.snapshot());
    }
}

async fn wait_in_flight<T>(slot: &mut Option<InFlight<T>>) -> Result<(), SaveError> {
    match slot {
        Some(flight) => flight.future.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::advance;

    type Calls = Arc<Mutex<Vec<u32>>>;

    fn recording_handler(calls: Calls) -> impl SaveHandler<u32> {
        move |payload: u32| {
            let calls = Arc::clone(&calls);
            async move {
                calls.lock().expect("lock").push(payload);
                Ok::<(), SaveError>(())
            }
        }
    }

    fn config(debounce_ms: u64) -> AutoSaveConfig {
        AutoSaveConfig::default().with_debounce_ms(debounce_ms)
    }

    /// Let the session task drain its channel without moving the clock.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_does_not_change_status_before_debounce() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .config(config(1000))
            .spawn()
            .expect("spawn");

        ctl.trigger_save(1).expect("trigger");
        settle().await;
        advance(Duration::from_millis(999)).await;
        settle().await;

        assert_eq!(ctl.status(), SaveStatus::Idle);
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_payload_is_not_saved() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .config(config(100))
            .baseline(7)
            .spawn()
            .expect("spawn");

        ctl.trigger_save(7).expect("trigger");
        settle().await;
        advance(Duration::from_millis(500)).await;
        settle().await;

        assert!(calls.lock().expect("lock").is_empty());
        assert_eq!(ctl.status(), SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_keeps_payload_for_force_save() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .config(config(100).with_enabled(false))
            .spawn()
            .expect("spawn");

        ctl.trigger_save(3).expect("trigger");
        settle().await;
        advance(Duration::from_secs(10)).await;
        settle().await;
        assert!(calls.lock().expect("lock").is_empty());

        let outcome = ctl.force_save().await.expect("force");
        assert_eq!(outcome, ForceSaveOutcome::Saved);
        assert_eq!(*calls.lock().expect("lock"), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_schedules_dirty_payload() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .config(config(100).with_enabled(false))
            .spawn()
            .expect("spawn");

        ctl.trigger_save(5).expect("trigger");
        ctl.set_enabled(true).expect("enable");
        settle().await;
        advance(Duration::from_millis(150)).await;
        settle().await;

        assert_eq!(*calls.lock().expect("lock"), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn force_save_with_nothing_dirty() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .spawn()
            .expect("spawn");

        assert_eq!(
            ctl.force_save().await.expect("force"),
            ForceSaveOutcome::NothingToSave
        );
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn force_save_bypasses_debounce() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .config(config(60_000))
            .spawn()
            .expect("spawn");

        ctl.trigger_save(9).expect("trigger");
        let outcome = ctl.force_save().await.expect("force");
        assert_eq!(outcome, ForceSaveOutcome::Saved);
        assert_eq!(ctl.status(), SaveStatus::Saved);

        // The cancelled countdown must not save a second time.
        advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(*calls.lock().expect("lock"), vec![9]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_force_save_after_success_is_noop() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(Arc::clone(&calls)))
            .spawn()
            .expect("spawn");

        ctl.trigger_save(1).expect("trigger");
        assert_eq!(ctl.force_save().await.expect("force"), ForceSaveOutcome::Saved);
        assert_eq!(
            ctl.force_save().await.expect("force"),
            ForceSaveOutcome::NothingToSave
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_session_task() {
        let calls = Calls::default();
        let ctl = AutoSaveController::builder(recording_handler(calls))
            .spawn()
            .expect("spawn");
        let watcher = ctl.subscribe();
        ctl.shutdown().await.expect("shutdown");
        assert!(watcher.has_changed().is_err(), "sender dropped with the task");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected() {
        let calls = Calls::default();
        let mut cfg = AutoSaveConfig::default();
        cfg.error_display_ms = 0;
        let result = AutoSaveController::builder(recording_handler(calls))
            .config(cfg)
            .spawn();
        assert!(matches!(result, Err(RuntimeError::Core(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_turns_hung_save_into_error() {
        let ctl = AutoSaveController::builder(|_: u32| async {
            std::future::pending::<()>().await;
            Ok::<(), SaveError>(())
        })
        .config(config(10).with_save_timeout_ms(1000))
        .spawn()
        .expect("spawn");

        ctl.trigger_save(1).expect("trigger");
        let outcome = ctl.force_save().await.expect("force");
        assert_eq!(
            outcome,
            ForceSaveOutcome::Failed("save timed out after 1000ms".into())
        );
        assert_eq!(ctl.status(), SaveStatus::Error);
    }
}
