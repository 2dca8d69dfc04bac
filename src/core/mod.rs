//! Core types for the authorization gate
//!
//! This module provides the fundamental types used throughout the gate:
//! - `ToolCall` - the external invocation shape being classified
//! - `GateError` - error types

pub mod error;
pub mod tool_call;

pub use error::{GateError, GateResult};
pub use tool_call::{canonical_args, ToolCall, SERVER_SEPARATOR};
