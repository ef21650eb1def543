//! In-memory host used by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::HostError;
use crate::host::{ChatHost, InputField, SendControl, INPUT_FIELD_ID, SEND_CONTROL_ID};
use crate::types::ChatMessage;
use crate::variables::VariableContainer;

#[derive(Default)]
struct Recorder {
    messages: Vec<ChatMessage>,
    appended: Vec<ChatMessage>,
    typed: Vec<String>,
    input_notifications: usize,
    clicks: usize,
    persists: usize,
    reply_requests: usize,
}

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Recorder>>);

impl Log {
    fn with<R>(&self, f: impl FnOnce(&mut Recorder) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }
}

struct FakeInput {
    log: Log,
    fail_click: bool,
}

impl InputField for FakeInput {
    fn set_value(&self, text: &str) -> Result<(), HostError> {
        self.log.with(|r| r.typed.push(text.to_string()));
        Ok(())
    }

    fn notify_input(&self) -> Result<(), HostError> {
        self.log.with(|r| r.input_notifications += 1);
        Ok(())
    }
}

impl SendControl for FakeInput {
    fn activate(&self) -> Result<(), HostError> {
        if self.fail_click {
            return Err(HostError::Rejected("send button disabled".into()));
        }
        self.log.with(|r| r.clicks += 1);
        Ok(())
    }
}

pub(crate) struct FakeHost {
    log: Log,
    containers: Vec<Arc<dyn VariableContainer>>,
    input: Option<Arc<FakeInput>>,
    user: Option<String>,
    active: bool,
    fail_persist: bool,
    fail_append: bool,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            log: Log::default(),
            containers: Vec::new(),
            input: None,
            user: None,
            active: true,
            fail_persist: false,
            fail_append: false,
        }
    }

    pub(crate) fn with_input(mut self) -> Self {
        self.input = Some(Arc::new(FakeInput {
            log: self.log.clone(),
            fail_click: false,
        }));
        self
    }

    pub(crate) fn failing_click(mut self) -> Self {
        self.input = Some(Arc::new(FakeInput {
            log: self.log.clone(),
            fail_click: true,
        }));
        self
    }

    pub(crate) fn with_user(mut self, name: &str) -> Self {
        self.user = Some(name.to_string());
        self
    }

    pub(crate) fn with_container(mut self, container: impl VariableContainer + 'static) -> Self {
        self.containers.push(Arc::new(container));
        self
    }

    pub(crate) fn without_context(mut self) -> Self {
        self.active = false;
        self
    }

    pub(crate) fn failing_persist(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub(crate) fn failing_append(mut self) -> Self {
        self.fail_append = true;
        self
    }

    /// Simulate the other party posting a message.
    pub(crate) fn receive(&self, sender: &str, text: &str) {
        let msg = ChatMessage {
            sender: sender.to_string(),
            is_user: false,
            is_system: false,
            text: text.to_string(),
            sent_at: 0,
        };
        self.log.with(|r| r.messages.push(msg));
    }

    /// Simulate the local user posting a message.
    pub(crate) fn post_as_user(&self, text: &str) {
        let msg = ChatMessage::from_user("User", text);
        self.log.with(|r| r.messages.push(msg));
    }

    pub(crate) fn typed(&self) -> Vec<String> {
        self.log.with(|r| r.typed.clone())
    }

    pub(crate) fn input_notifications(&self) -> usize {
        self.log.with(|r| r.input_notifications)
    }

    pub(crate) fn clicks(&self) -> usize {
        self.log.with(|r| r.clicks)
    }

    pub(crate) fn appended(&self) -> Vec<ChatMessage> {
        self.log.with(|r| r.appended.clone())
    }

    pub(crate) fn persist_count(&self) -> usize {
        self.log.with(|r| r.persists)
    }

    pub(crate) fn reply_requests(&self) -> usize {
        self.log.with(|r| r.reply_requests)
    }
}

#[async_trait]
impl ChatHost for FakeHost {
    fn last_message(&self) -> Option<ChatMessage> {
        self.log.with(|r| r.messages.last().cloned())
    }

    fn has_active_context(&self) -> bool {
        self.active
    }

    fn user_name(&self) -> Option<String> {
        self.user.clone()
    }

    fn variable_containers(&self) -> Vec<Arc<dyn VariableContainer>> {
        self.containers.clone()
    }

    fn find_input_field(&self, id: &str) -> Option<Arc<dyn InputField>> {
        if id != INPUT_FIELD_ID {
            return None;
        }
        self.input
            .clone()
            .map(|i| i as Arc<dyn InputField>)
    }

    fn find_send_control(&self, id: &str) -> Option<Arc<dyn SendControl>> {
        if id != SEND_CONTROL_ID {
            return None;
        }
        self.input
            .clone()
            .map(|i| i as Arc<dyn SendControl>)
    }

    fn append_message(&self, message: ChatMessage) -> Result<(), HostError> {
        if self.fail_append {
            return Err(HostError::Unavailable("conversation"));
        }
        self.log.with(|r| {
            r.messages.push(message.clone());
            r.appended.push(message);
        });
        Ok(())
    }

    async fn persist_conversation(&self) -> Result<(), HostError> {
        if self.fail_persist {
            return Err(HostError::Persist("disk full".into()));
        }
        self.log.with(|r| r.persists += 1);
        Ok(())
    }

    async fn request_reply(&self) -> Result<(), HostError> {
        self.log.with(|r| r.reply_requests += 1);
        Ok(())
    }
}
