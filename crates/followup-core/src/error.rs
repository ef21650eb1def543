//! Error types. None of these cross the crate's public operations; they are
//! collapsed into outcomes (`bool`, `Option`, [`SubmitOutcome`]) at each
//! component boundary.
//!
//! [`SubmitOutcome`]: crate::gateway::SubmitOutcome

use thiserror::Error;

/// A host capability failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("host has no {0}")]
    Unavailable(&'static str),

    #[error("host rejected the operation: {0}")]
    Rejected(String),

    #[error("failed to persist conversation: {0}")]
    Persist(String),
}

#[derive(Error, Debug)]
pub enum VariableError {
    #[error("no variable container available")]
    NoContainer,

    #[error("write to '{container}' failed: {reason}")]
    Write { container: String, reason: String },

    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("interactive send failed: {0}")]
    Interactive(#[source] HostError),

    #[error("fallback append failed: {0}")]
    Append(#[source] HostError),
}
