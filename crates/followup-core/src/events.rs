//! FollowupEvent enum — broadcast from the scheduler to frontends via tokio::broadcast.

use serde::{Deserialize, Serialize};

use crate::gateway::SubmitOutcome;
use crate::types::{CancelReason, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownPhase {
    Shown,
    Tick,
    Hidden,
}

/// State of the countdown widgets (readout, status line, progress bar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownData {
    pub phase: CountdownPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmedData {
    pub label: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeData {
    pub severity: Severity,
    pub message: String,
}

/// Events broadcast to every subscriber (countdown widget, toast layer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum FollowupEvent {
    /// A follow-up was scheduled
    #[serde(rename = "armed")]
    Armed(ArmedData),

    /// Countdown display update
    #[serde(rename = "countdown")]
    Countdown(CountdownData),

    /// The pending follow-up was torn down before firing
    #[serde(rename = "cancelled")]
    Cancelled(CancelReason),

    /// The deadline passed; synthesis starts
    #[serde(rename = "fired")]
    Fired(ArmedData),

    /// Result of handing the message to the host
    #[serde(rename = "submitted")]
    Submitted(SubmitOutcome),

    /// User-facing notification
    #[serde(rename = "notice")]
    Notice(NoticeData),
}

impl FollowupEvent {
    /// Serialize to `{"event": "...", "data": {...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let ev = FollowupEvent::Cancelled(CancelReason::UserMessage);
        let json = ev.to_json();
        assert_eq!(json["event"], "cancelled");
        assert_eq!(json["data"], "user_message");

        let hidden = FollowupEvent::Countdown(CountdownData {
            phase: CountdownPhase::Hidden,
            readout: None,
            status: None,
            percent: None,
        });
        assert_eq!(
            hidden.to_json(),
            serde_json::json!({"event": "countdown", "data": {"phase": "hidden"}})
        );
    }
}
