//! Countdown projection — remaining time to readout text and bar percentage.
//!
//! Owns no timer. The scheduler's tick drives it, and its display sink is the
//! event channel: frontends render `countdown` events.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::events::{CountdownData, CountdownPhase, FollowupEvent};
use crate::types::CountdownSnapshot;

/// Fixed tick cadence.
pub const TICK: Duration = Duration::from_secs(1);

pub fn project(remaining_ms: i64, total_ms: u64) -> CountdownSnapshot {
    let remaining_ms = remaining_ms.max(0) as u64;
    let percent_remaining = if total_ms == 0 {
        0.0
    } else {
        (remaining_ms as f64 / total_ms as f64 * 100.0).clamp(0.0, 100.0)
    };
    CountdownSnapshot {
        remaining_ms,
        percent_remaining,
    }
}

/// `"Xm Ys"` with minutes, `"Ys"` without, `"0s"` once time is up.
pub fn format_time(ms: i64) -> String {
    if ms <= 0 {
        return "0s".to_string();
    }
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[derive(Clone)]
pub struct CountdownProjector {
    events: broadcast::Sender<FollowupEvent>,
}

impl CountdownProjector {
    pub fn new(events: broadcast::Sender<FollowupEvent>) -> Self {
        Self { events }
    }

    pub fn show(&self, remaining_ms: u64, total_ms: u64) -> CountdownSnapshot {
        self.emit(CountdownPhase::Shown, remaining_ms, total_ms)
    }

    pub fn update(&self, remaining_ms: u64, total_ms: u64) -> CountdownSnapshot {
        self.emit(CountdownPhase::Tick, remaining_ms, total_ms)
    }

    pub fn hide(&self) {
        let _ = self.events.send(FollowupEvent::Countdown(CountdownData {
            phase: CountdownPhase::Hidden,
            readout: None,
            status: None,
            percent: None,
        }));
    }

    fn emit(&self, phase: CountdownPhase, remaining_ms: u64, total_ms: u64) -> CountdownSnapshot {
        let snapshot = project(remaining_ms as i64, total_ms);
        let readout = format_time(snapshot.remaining_ms as i64);
        let _ = self.events.send(FollowupEvent::Countdown(CountdownData {
            phase,
            status: Some(format!("Auto-send in {}", readout)),
            readout: Some(readout),
            percent: Some(snapshot.percent_remaining),
        }));
        snapshot
    }
}
