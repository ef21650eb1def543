//! Submission — hands the synthesized message to the host.
//!
//! Two channels in fixed priority: the interactive input (type into the box,
//! press send) when the host exposes both handles, otherwise a direct append
//! to the conversation. A failing interactive send is not retried through
//! the append channel, since the text may already sit in the input box.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SubmitError;
use crate::host::{ChatHost, InputField, SendControl, INPUT_FIELD_ID, SEND_CONTROL_ID};
use crate::types::ChatMessage;

/// Pause between filling the input and pressing send, so host-side reactive
/// state sees the new value.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Sender name for appended messages when the host has none.
pub const DEFAULT_USER_LABEL: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Interactive,
    Appended,
    Failed { reason: String },
}

impl SubmitOutcome {
    pub fn is_sent(&self) -> bool {
        !matches!(self, SubmitOutcome::Failed { .. })
    }
}

enum Channel {
    Interactive {
        field: Arc<dyn InputField>,
        send: Arc<dyn SendControl>,
    },
    Append,
}

impl Channel {
    fn outcome(&self) -> SubmitOutcome {
        match self {
            Channel::Interactive { .. } => SubmitOutcome::Interactive,
            Channel::Append => SubmitOutcome::Appended,
        }
    }

    async fn send(
        &self,
        host: &dyn ChatHost,
        text: &str,
        settle_delay: Duration,
    ) -> Result<(), SubmitError> {
        match self {
            Channel::Interactive { field, send } => {
                field.set_value(text).map_err(SubmitError::Interactive)?;
                field.notify_input().map_err(SubmitError::Interactive)?;
                tokio::time::sleep(settle_delay).await;
                send.activate().map_err(SubmitError::Interactive)
            }
            Channel::Append => {
                let sender = host
                    .user_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| DEFAULT_USER_LABEL.to_string());
                let message = ChatMessage::from_user(&sender, text);

                host.append_message(message.clone())
                    .map_err(SubmitError::Append)?;
                host.render_message(&message)
                    .await
                    .map_err(SubmitError::Append)?;
                host.persist_conversation()
                    .await
                    .map_err(SubmitError::Append)?;
                host.reload_conversation()
                    .await
                    .map_err(SubmitError::Append)?;
                host.request_reply().await.map_err(SubmitError::Append)
            }
        }
    }
}

pub struct SubmissionGateway {
    host: Arc<dyn ChatHost>,
    settle_delay: Duration,
}

impl SubmissionGateway {
    pub fn new(host: Arc<dyn ChatHost>) -> Self {
        Self {
            host,
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Send `text` through the channel the host supports. Never errors; a
    /// failed send comes back as [`SubmitOutcome::Failed`].
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let channel = self.channel();
        match channel.send(self.host.as_ref(), text, self.settle_delay).await {
            Ok(()) => {
                let outcome = channel.outcome();
                debug!("Follow-up submitted via {:?}", outcome);
                outcome
            }
            Err(e) => {
                warn!("{}", e);
                SubmitOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn channel(&self) -> Channel {
        let field = self.host.find_input_field(INPUT_FIELD_ID);
        let send = self.host.find_send_control(SEND_CONTROL_ID);
        match (field, send) {
            (Some(field), Some(send)) => Channel::Interactive { field, send },
            _ => Channel::Append,
        }
    }
}
