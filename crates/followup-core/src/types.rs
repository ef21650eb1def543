//! Core types — WaitSpec, PendingFollowup, CountdownSnapshot, ChatMessage, etc.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

// ── Wait directive ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUnit {
    Second,
    Minute,
    Hour,
}

impl WaitUnit {
    /// Unit from the directive suffix letter. Anything but `s`/`h` is minutes.
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.to_ascii_lowercase().as_str() {
            "s" => WaitUnit::Second,
            "h" => WaitUnit::Hour,
            _ => WaitUnit::Minute,
        }
    }

    pub fn millis(self) -> u64 {
        match self {
            WaitUnit::Second => 1_000,
            WaitUnit::Minute => 60_000,
            WaitUnit::Hour => 3_600_000,
        }
    }

    pub fn suffix(self) -> char {
        match self {
            WaitUnit::Second => 's',
            WaitUnit::Minute => 'm',
            WaitUnit::Hour => 'h',
        }
    }
}

/// A parsed wait request. Only built from a complete directive or an explicit
/// duration, never from partial input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitSpec {
    duration_ms: u64,
    unit: WaitUnit,
    display_label: String,
}

impl WaitSpec {
    /// `value` units of `unit`. `None` when the product is zero or overflows.
    pub fn new(value: u64, unit: WaitUnit) -> Option<Self> {
        let duration_ms = value.checked_mul(unit.millis())?;
        if duration_ms == 0 {
            return None;
        }
        Some(Self {
            duration_ms,
            unit,
            display_label: format!("{}{}", value, unit.suffix()),
        })
    }

    /// Spec for a raw duration, labelled in the largest unit that divides it
    /// evenly. Seconds are rounded up otherwise.
    pub fn from_millis(duration_ms: u64) -> Option<Self> {
        if duration_ms == 0 {
            return None;
        }
        let unit = [WaitUnit::Hour, WaitUnit::Minute]
            .into_iter()
            .find(|u| duration_ms % u.millis() == 0)
            .unwrap_or(WaitUnit::Second);
        let value = duration_ms.div_ceil(unit.millis());
        Some(Self {
            duration_ms,
            unit,
            display_label: format!("{}{}", value, unit.suffix()),
        })
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.duration_ms)
    }

    pub fn unit(&self) -> WaitUnit {
        self.unit
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }
}

// ── Scheduler state ──

/// The armed follow-up. Its existence is the Armed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFollowup {
    pub spec: WaitSpec,
    pub armed_at: Instant,
    pub deadline: Instant,
}

impl PendingFollowup {
    pub fn new(spec: WaitSpec, armed_at: Instant) -> Self {
        let deadline = armed_at + spec.duration();
        Self {
            spec,
            armed_at,
            deadline,
        }
    }

    /// Milliseconds left before `deadline`, measured at `at`.
    pub fn remaining_ms(&self, at: Instant) -> u64 {
        self.deadline.saturating_duration_since(at).as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub remaining_ms: u64,
    pub percent_remaining: f64,
}

/// Why a pending follow-up was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Rearm,
    Disabled,
    UserMessage,
    ConversationChanged,
    CancelControl,
    Shutdown,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Rearm => write!(f, "re-armed"),
            CancelReason::Disabled => write!(f, "feature disabled"),
            CancelReason::UserMessage => write!(f, "user sent a message"),
            CancelReason::ConversationChanged => write!(f, "conversation changed"),
            CancelReason::CancelControl => write!(f, "cancelled from countdown"),
            CancelReason::Shutdown => write!(f, "scheduler stopped"),
        }
    }
}

// ── Notices ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warn,
    Error,
}

// ── Chat message (host record shape) ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "name")]
    pub sender: String,
    pub is_user: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(rename = "mes")]
    pub text: String,
    /// Epoch milliseconds
    #[serde(rename = "send_date")]
    pub sent_at: i64,
}

impl ChatMessage {
    /// A user-authored message stamped with the current wall clock.
    pub fn from_user(sender: &str, text: &str) -> Self {
        Self {
            sender: sender.to_string(),
            is_user: true,
            is_system: false,
            text: text.to_string(),
            sent_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_spec_labels() {
        let spec = WaitSpec::new(7, WaitUnit::Minute).unwrap();
        assert_eq!(spec.duration_ms(), 420_000);
        assert_eq!(spec.display_label(), "7m");
        assert!(WaitSpec::new(0, WaitUnit::Hour).is_none());
        assert!(WaitSpec::new(u64::MAX, WaitUnit::Hour).is_none());
    }

    #[test]
    fn test_wait_spec_from_millis() {
        assert_eq!(WaitSpec::from_millis(10_000).unwrap().display_label(), "10s");
        assert_eq!(WaitSpec::from_millis(120_000).unwrap().display_label(), "2m");
        assert_eq!(WaitSpec::from_millis(7_200_000).unwrap().display_label(), "2h");
        assert_eq!(WaitSpec::from_millis(1_500).unwrap().display_label(), "2s");
        assert!(WaitSpec::from_millis(0).is_none());
    }

    #[test]
    fn test_chat_message_host_field_names() {
        let msg = ChatMessage {
            sender: "Ann".into(),
            is_user: true,
            is_system: false,
            text: "hi".into(),
            sent_at: 42,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["name"], "Ann");
        assert_eq!(value["mes"], "hi");
        assert_eq!(value["send_date"], 42);
        assert_eq!(value["is_user"], true);
    }
}
