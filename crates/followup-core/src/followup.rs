//! Host-facing facade — conversation events in, settings hooks, scheduler out.

use std::sync::{Arc, RwLock};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_TEMPLATE};
use crate::directive;
use crate::events::FollowupEvent;
use crate::host::{ChatHost, SettingsStore};
use crate::notify::Notifier;
use crate::scheduler::FollowupScheduler;
use crate::template::TemplateRenderer;
use crate::types::{CancelReason, PendingFollowup, WaitSpec};
use crate::variables::VariableStore;

/// Conversation events and settings changes delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowupCommand {
    MessageReceived,
    MessageSent,
    ConversationChanged,
    /// The countdown widget's cancel button
    CancelControl,
    EnabledChanged(bool),
    ShowCountdownChanged(bool),
    VerboseChanged(bool),
    TemplateChanged(String),
    /// Arm a test timer for this many milliseconds
    Test(u64),
    ResetTemplate,
    Stop,
}

pub struct Followup {
    settings: Arc<RwLock<Config>>,
    settings_store: Arc<dyn SettingsStore>,
    host: Arc<dyn ChatHost>,
    scheduler: FollowupScheduler,
    notifier: Notifier,

    pub event_tx: broadcast::Sender<FollowupEvent>,
    pub command_tx: mpsc::Sender<FollowupCommand>,
    command_rx: Option<mpsc::Receiver<FollowupCommand>>,
}

impl Followup {
    pub fn new(
        config: Config,
        host: Arc<dyn ChatHost>,
        settings_store: Arc<dyn SettingsStore>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let (command_tx, command_rx) = mpsc::channel(32);

        let notifier = Notifier::new(event_tx.clone(), config.verbose_notifications);
        let settings = Arc::new(RwLock::new(config));
        let scheduler = FollowupScheduler::new(
            host.clone(),
            settings.clone(),
            event_tx.clone(),
            notifier.clone(),
        );

        Self {
            settings,
            settings_store,
            host,
            scheduler,
            notifier,
            event_tx,
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FollowupEvent> {
        self.event_tx.subscribe()
    }

    pub fn command_sender(&self) -> mpsc::Sender<FollowupCommand> {
        self.command_tx.clone()
    }

    pub fn scheduler(&self) -> &FollowupScheduler {
        &self.scheduler
    }

    /// Snapshot of the current settings.
    pub fn config(&self) -> Config {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // ── Conversation events ──

    /// Arm from the latest message if it is the other party's and carries a
    /// directive.
    pub fn on_message_received(&self) -> Option<PendingFollowup> {
        if !self.config().enabled {
            return None;
        }
        let last = self.host.last_message()?;
        if last.is_user {
            return None;
        }
        let spec = directive::parse(&last.text)?;
        Some(self.scheduler.arm(spec))
    }

    pub fn on_message_sent(&self) {
        self.scheduler.cancel(CancelReason::UserMessage);
    }

    pub fn on_conversation_changed(&self) {
        self.scheduler.cancel(CancelReason::ConversationChanged);
    }

    pub fn on_cancel_control(&self) {
        self.scheduler.cancel(CancelReason::CancelControl);
    }

    // ── Settings hooks ──

    pub fn on_enabled_changed(&self, enabled: bool) {
        self.update_settings(|c| c.enabled = enabled);
        if !enabled {
            self.scheduler.cancel(CancelReason::Disabled);
        }
    }

    pub fn on_show_countdown_changed(&self, show: bool) {
        self.update_settings(|c| c.show_countdown = show);
        if !show {
            self.scheduler.hide_countdown();
        }
    }

    pub fn on_verbose_notifications_changed(&self, verbose: bool) {
        self.update_settings(|c| c.verbose_notifications = verbose);
        self.notifier.set_verbose(verbose);
    }

    /// Store the edited template and return the refreshed preview.
    pub fn on_template_changed(&self, template: String) -> String {
        self.update_settings(|c| c.message_template = template);
        self.preview()
    }

    pub fn reset_template(&self) -> String {
        self.update_settings(|c| c.message_template = DEFAULT_TEMPLATE.to_string());
        self.notifier.info("Template reset");
        self.preview()
    }

    /// The current template rendered with a sample 10s wait.
    pub fn preview(&self) -> String {
        let config = self.config();
        let variables = VariableStore::new(self.host.clone());
        TemplateRenderer::from_config(&config).preview(&config.message_template, &variables)
    }

    /// Arm a timer directly, bypassing directive parsing.
    pub fn test(&self, duration_ms: u64) -> bool {
        match WaitSpec::from_millis(duration_ms) {
            Some(spec) => {
                self.notifier
                    .success(format!("Starting {} test timer", spec.display_label()));
                self.scheduler.arm(spec);
                true
            }
            None => {
                self.notifier.warn("Test timer needs a duration above zero");
                false
            }
        }
    }

    fn update_settings(&self, apply: impl FnOnce(&mut Config)) {
        let snapshot = {
            let mut config = self.settings.write().unwrap_or_else(|e| e.into_inner());
            apply(&mut config);
            config.clone()
        };
        self.settings_store.save_debounced(&snapshot);
    }

    // ── Main loop ──

    /// Process host commands until `Stop`. `Followup` holds a sender of its
    /// own, so dropping the host's senders does not end the loop.
    pub async fn run(&mut self) {
        let Some(mut command_rx) = self.command_rx.take() else {
            warn!("Follow-up loop already running");
            return;
        };
        info!("Follow-up scheduler ready");

        while let Some(cmd) = command_rx.recv().await {
            match cmd {
                FollowupCommand::MessageReceived => {
                    self.on_message_received();
                }
                FollowupCommand::MessageSent => self.on_message_sent(),
                FollowupCommand::ConversationChanged => self.on_conversation_changed(),
                FollowupCommand::CancelControl => self.on_cancel_control(),
                FollowupCommand::EnabledChanged(enabled) => self.on_enabled_changed(enabled),
                FollowupCommand::ShowCountdownChanged(show) => {
                    self.on_show_countdown_changed(show)
                }
                FollowupCommand::VerboseChanged(verbose) => {
                    self.on_verbose_notifications_changed(verbose)
                }
                FollowupCommand::TemplateChanged(template) => {
                    let preview = self.on_template_changed(template);
                    debug!("Template preview: {}", preview);
                }
                FollowupCommand::Test(duration_ms) => {
                    self.test(duration_ms);
                }
                FollowupCommand::ResetTemplate => {
                    self.reset_template();
                }
                FollowupCommand::Stop => break,
            }
        }

        self.scheduler.cancel(CancelReason::Shutdown);
        info!("Follow-up scheduler stopped");
    }
}
