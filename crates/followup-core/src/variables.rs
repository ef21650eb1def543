//! Per-conversation variables — one adapter over the host's candidate stores.
//!
//! Hosts have kept chat variables in different places over time, so the store
//! checks every container the host reports: reads return the first hit, writes
//! go to the primary and are mirrored into the rest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{HostError, VariableError};
use crate::host::ChatHost;

/// One externally owned key-value container.
pub trait VariableContainer: Send + Sync {
    /// Name used in logs (e.g. `chat_metadata.variables`).
    fn label(&self) -> &str;

    fn get(&self, name: &str) -> Option<Value>;

    fn set(&self, name: &str, value: Value) -> Result<(), HostError>;
}

/// Read capability handed to the template renderer.
pub trait VariableLookup {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl VariableLookup for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// A container held in memory, for hosts without their own storage and tests.
#[derive(Debug, Default)]
pub struct InMemoryVariables {
    label: String,
    values: Mutex<HashMap<String, Value>>,
}

impl InMemoryVariables {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            values: Mutex::new(HashMap::new()),
        }
    }

    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.lock().insert(name.to_string(), value.into());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl VariableContainer for InMemoryVariables {
    fn label(&self) -> &str {
        &self.label
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) -> Result<(), HostError> {
        self.lock().insert(name.to_string(), value);
        Ok(())
    }
}

/// Adapter over the containers of the host's active conversation.
///
/// Containers are fetched from the host on every call, so a conversation
/// switch is picked up without rebuilding the store.
#[derive(Clone)]
pub struct VariableStore {
    host: Arc<dyn ChatHost>,
}

impl VariableStore {
    pub fn new(host: Arc<dyn ChatHost>) -> Self {
        Self { host }
    }

    /// First container holding `name` wins, in host order.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.host
            .variable_containers()
            .iter()
            .find_map(|c| c.get(name))
    }

    /// Write `value` everywhere and persist. Never fails loudly: any problem
    /// is logged and reported as `false`.
    pub async fn set(&self, name: &str, value: Value) -> bool {
        match self.try_set(name, value).await {
            Ok(()) => true,
            Err(e) => {
                warn!("setvar '{}' failed: {}", name, e);
                false
            }
        }
    }

    async fn try_set(&self, name: &str, value: Value) -> Result<(), VariableError> {
        let containers = self.host.variable_containers();
        let (primary, mirrors) = containers.split_first().ok_or(VariableError::NoContainer)?;

        primary
            .set(name, value.clone())
            .map_err(|e| VariableError::Write {
                container: primary.label().to_string(),
                reason: e.to_string(),
            })?;

        for mirror in mirrors {
            if let Err(e) = mirror.set(name, value.clone()) {
                warn!("Mirror write to {} failed: {}", mirror.label(), e);
            }
        }

        self.host.persist_conversation().await?;
        debug!("setvar '{}' written to {} container(s)", name, containers.len());
        Ok(())
    }
}

impl VariableLookup for VariableStore {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name)
    }
}
