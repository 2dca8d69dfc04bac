//! Gate error types

use thiserror::Error;

use crate::policy::loader::PolicyLoadError;

/// Errors that can occur in the authorization gate
///
/// The confirmation path is deliberately almost exception-free: denials,
/// timeouts, and spoofed tool names all resolve as `false` rather than
/// erroring, so callers can compose the gate inside retry logic without
/// special-casing. The only contract violation raised here is a tool call
/// with no name.
#[derive(Error, Debug)]
pub enum GateError {
    /// Caller submitted a tool call with an empty name
    #[error("tool call must have a name")]
    MissingToolName,

    /// Rule source failed to load or validate
    #[error("policy load failed: {0}")]
    PolicyLoad(#[from] PolicyLoadError),
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;
