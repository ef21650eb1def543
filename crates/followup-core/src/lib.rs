//! followup-core — wait-directive follow-ups for chat clients, no UI.
//!
//! When the other party's message carries a `[WAIT:<n><s|m|h>]` directive,
//! a single deferred follow-up is armed. At the deadline a message is rendered
//! from the configured template and submitted on the user's behalf. The host
//! application plugs in through the traits in [`host`]; frontends watch the
//! countdown and notices via tokio::broadcast.

pub mod config;
pub mod countdown;
pub mod directive;
pub mod error;
pub mod events;
pub mod followup;
pub mod gateway;
pub mod host;
pub mod logging;
pub mod notify;
pub mod scheduler;
pub mod template;
pub mod types;
pub mod variables;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use followup::{Followup, FollowupCommand};
pub use scheduler::{FireOutcome, FollowupScheduler};
