//! Host capabilities — everything the core needs from the chat application.
//!
//! The core never owns the conversation, the settings panel, or the toast
//! layer. It reaches them through these traits, which a host implements once.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::HostError;
use crate::types::ChatMessage;
use crate::variables::VariableContainer;

/// Element id of the host's message input field.
pub const INPUT_FIELD_ID: &str = "send_textarea";

/// Element id of the host's send control.
pub const SEND_CONTROL_ID: &str = "send_but";

/// The message input box of the host UI.
pub trait InputField: Send + Sync {
    fn set_value(&self, text: &str) -> Result<(), HostError>;

    /// Tell the host's listeners the value changed (the "input" event).
    fn notify_input(&self) -> Result<(), HostError>;
}

/// The send button of the host UI.
pub trait SendControl: Send + Sync {
    fn activate(&self) -> Result<(), HostError>;
}

/// Conversation accessor plus the hooks the fallback send path uses.
#[async_trait]
pub trait ChatHost: Send + Sync {
    /// Most recent message of the active conversation, if any.
    fn last_message(&self) -> Option<ChatMessage>;

    /// Whether a character/conversation context is currently active.
    fn has_active_context(&self) -> bool;

    /// Display name of the local user.
    fn user_name(&self) -> Option<String>;

    /// Candidate variable containers, primary first.
    fn variable_containers(&self) -> Vec<Arc<dyn VariableContainer>>;

    fn find_input_field(&self, id: &str) -> Option<Arc<dyn InputField>>;

    fn find_send_control(&self, id: &str) -> Option<Arc<dyn SendControl>>;

    /// Push a message onto the active conversation.
    fn append_message(&self, message: ChatMessage) -> Result<(), HostError>;

    async fn persist_conversation(&self) -> Result<(), HostError>;

    /// Render a freshly appended message. Default: the host has no such hook.
    async fn render_message(&self, _message: &ChatMessage) -> Result<(), HostError> {
        Ok(())
    }

    /// Reload the conversation view. Default: no-op.
    async fn reload_conversation(&self) -> Result<(), HostError> {
        Ok(())
    }

    /// Ask the host to generate the other party's reply. Default: no-op.
    async fn request_reply(&self) -> Result<(), HostError> {
        Ok(())
    }
}

/// The settings layer that owns the persisted [`Config`].
pub trait SettingsStore: Send + Sync {
    /// Schedule a debounced save of the settings record.
    fn save_debounced(&self, config: &Config);
}
