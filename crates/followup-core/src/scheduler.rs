//! The follow-up state machine — Idle → Armed → Idle.
//!
//! Exactly one [`PendingFollowup`] may exist. It lives in a private slot
//! together with the two task handles that serve it: the one-shot deadline
//! task that fires, and the optional 1s countdown tick. Nothing outside this
//! module can reach those handles.
//!
//! `arm` and `cancel` never await, so on the tokio runtime they are atomic
//! with respect to both tasks. Every arm gets a fresh generation number and
//! the deadline task only fires if its generation still owns the slot, which
//! makes cancellation win over an expiry that is already due.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Local;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::Config;
use crate::countdown::{CountdownProjector, TICK};
use crate::events::{ArmedData, FollowupEvent};
use crate::gateway::{SubmissionGateway, SubmitOutcome};
use crate::host::ChatHost;
use crate::notify::Notifier;
use crate::template::{RenderContext, TemplateRenderer};
use crate::types::{CancelReason, PendingFollowup, WaitSpec};
use crate::variables::VariableStore;

/// What a fire attempt ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// Nothing was armed, or the follow-up was cancelled/replaced first.
    Stale,
    /// No character/conversation was active; nothing was sent.
    NoActiveContext,
    Submitted(SubmitOutcome),
}

struct Armed {
    pending: PendingFollowup,
    generation: u64,
    deadline_task: JoinHandle<()>,
    tick_task: Option<JoinHandle<()>>,
    countdown_visible: bool,
}

struct Shared {
    slot: Mutex<Option<Armed>>,
    generation: AtomicU64,
    host: Arc<dyn ChatHost>,
    gateway: SubmissionGateway,
    projector: CountdownProjector,
    notifier: Notifier,
    events: broadcast::Sender<FollowupEvent>,
    settings: Arc<RwLock<Config>>,
}

pub struct FollowupScheduler {
    shared: Arc<Shared>,
}

impl FollowupScheduler {
    pub fn new(
        host: Arc<dyn ChatHost>,
        settings: Arc<RwLock<Config>>,
        events: broadcast::Sender<FollowupEvent>,
        notifier: Notifier,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                generation: AtomicU64::new(0),
                gateway: SubmissionGateway::new(host.clone()),
                projector: CountdownProjector::new(events.clone()),
                host,
                notifier,
                events,
                settings,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FollowupEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_armed(&self) -> bool {
        self.shared.lock_slot().is_some()
    }

    pub fn pending(&self) -> Option<PendingFollowup> {
        self.shared.lock_slot().as_ref().map(|a| a.pending.clone())
    }

    /// Schedule `spec`, replacing whatever was armed.
    pub fn arm(&self, spec: WaitSpec) -> PendingFollowup {
        let shared = &self.shared;
        let show_countdown = shared.read_settings().show_countdown;

        let mut slot = shared.lock_slot();
        if let Some(previous) = slot.take() {
            shared.teardown(previous, CancelReason::Rearm);
        }

        let generation = shared.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let pending = PendingFollowup::new(spec, Instant::now());
        let total_ms = pending.spec.duration_ms();

        let tick_task = show_countdown.then(|| {
            shared.projector.show(total_ms, total_ms);
            tokio::spawn(run_countdown(shared.projector.clone(), pending.clone()))
        });

        let deadline = pending.deadline;
        let task_shared = Arc::clone(shared);
        let deadline_task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task_shared.fire_generation(generation).await;
        });

        *slot = Some(Armed {
            pending: pending.clone(),
            generation,
            deadline_task,
            tick_task,
            countdown_visible: show_countdown,
        });
        drop(slot);

        let label = pending.spec.display_label().to_string();
        let _ = shared.events.send(FollowupEvent::Armed(ArmedData {
            label: label.clone(),
            duration_ms: total_ms,
        }));
        shared.notifier.success(format!("Timer: {}", label));
        pending
    }

    /// Tear down the pending follow-up. Safe from Idle; returns whether
    /// anything was armed.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let armed = self.shared.lock_slot().take();
        match armed {
            Some(armed) => {
                self.shared.teardown(armed, reason);
                true
            }
            None => false,
        }
    }

    /// Stop the countdown display but keep the deadline.
    pub fn hide_countdown(&self) {
        let mut slot = self.shared.lock_slot();
        if let Some(armed) = slot.as_mut() {
            if let Some(tick) = armed.tick_task.take() {
                tick.abort();
            }
            if armed.countdown_visible {
                armed.countdown_visible = false;
                self.shared.projector.hide();
            }
        }
    }

    /// Fire the pending follow-up now instead of at its deadline.
    pub async fn fire_now(&self) -> FireOutcome {
        let armed = self.shared.lock_slot().take();
        match armed {
            Some(armed) => {
                armed.deadline_task.abort();
                self.shared.fire(armed).await
            }
            None => FireOutcome::Stale,
        }
    }
}

impl Drop for FollowupScheduler {
    fn drop(&mut self) {
        if let Some(armed) = self.shared.lock_slot().take() {
            armed.deadline_task.abort();
            if let Some(tick) = armed.tick_task {
                tick.abort();
            }
        }
    }
}

impl Shared {
    fn lock_slot(&self) -> MutexGuard<'_, Option<Armed>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_settings(&self) -> Config {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn teardown(&self, armed: Armed, reason: CancelReason) {
        armed.deadline_task.abort();
        if let Some(tick) = armed.tick_task {
            tick.abort();
        }
        if armed.countdown_visible {
            self.projector.hide();
        }
        debug!(
            "Dropped pending {} follow-up (generation {})",
            armed.pending.spec.display_label(),
            armed.generation
        );
        let _ = self.events.send(FollowupEvent::Cancelled(reason));
        if !matches!(reason, CancelReason::Rearm | CancelReason::Shutdown) {
            self.notifier.warn(format!("Timer cancelled: {}", reason));
        }
    }

    /// Deadline task entry point. Fires only if `generation` still owns the slot.
    async fn fire_generation(&self, generation: u64) -> FireOutcome {
        let armed = {
            let mut slot = self.lock_slot();
            let owns_slot = slot.as_ref().is_some_and(|a| a.generation == generation);
            if owns_slot {
                slot.take()
            } else {
                None
            }
        };
        match armed {
            Some(armed) => self.fire(armed).await,
            None => FireOutcome::Stale,
        }
    }

    /// The slot is already empty here: the state is Idle before any
    /// synthesis or submission happens.
    async fn fire(&self, armed: Armed) -> FireOutcome {
        if let Some(tick) = armed.tick_task {
            tick.abort();
        }
        if armed.countdown_visible {
            self.projector.hide();
        }

        let spec = armed.pending.spec;
        let _ = self.events.send(FollowupEvent::Fired(ArmedData {
            label: spec.display_label().to_string(),
            duration_ms: spec.duration_ms(),
        }));
        self.notifier.success("Triggering follow-up!");

        if !self.host.has_active_context() {
            self.notifier.error("No active character, follow-up dropped");
            return FireOutcome::NoActiveContext;
        }

        let text = self.synthesize(spec.display_label());
        let outcome = self.gateway.submit(&text).await;

        match &outcome {
            SubmitOutcome::Interactive => self.notifier.success("Message sent!"),
            SubmitOutcome::Appended => self.notifier.warn("Message sent via fallback append"),
            SubmitOutcome::Failed { reason } => {
                self.notifier.error(format!("Follow-up not sent: {}", reason))
            }
        }
        let _ = self.events.send(FollowupEvent::Submitted(outcome.clone()));
        FireOutcome::Submitted(outcome)
    }

    fn synthesize(&self, wait_label: &str) -> String {
        let config = self.read_settings();
        let variables = VariableStore::new(self.host.clone());
        TemplateRenderer::from_config(&config).render(
            config.effective_template(),
            &RenderContext {
                wait_label,
                now: Local::now(),
                variables: &variables,
            },
        )
    }
}

/// Countdown tick. Remaining time comes from `deadline` and each tick's
/// scheduled instant, and the loop stops on its own at zero whether or not
/// the deadline task has fired yet.
async fn run_countdown(projector: CountdownProjector, pending: PendingFollowup) {
    let total_ms = pending.spec.duration_ms();
    let mut interval = tokio::time::interval_at(pending.armed_at + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let at = interval.tick().await;
        let remaining_ms = pending.remaining_ms(at);
        if remaining_ms == 0 {
            projector.hide();
            break;
        }
        projector.update(remaining_ms, total_ms);
    }
}
