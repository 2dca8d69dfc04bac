//! Confirmation bus: typed pub/sub plus the human-in-the-loop protocol
//!
//! This module provides:
//! - `messages` - the closed set of message contracts on the bus
//! - `ConfirmationBus` - policy evaluation + correlation-keyed suspension
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolgate::bus::{ConfirmationBus, ConfirmationOutcome, MessageType};
//! use toolgate::core::ToolCall;
//! use toolgate::policy::PolicyEngine;
//!
//! let bus = ConfirmationBus::new(PolicyEngine::with_default_rules());
//!
//! // The UI layer answers confirmation requests as they appear
//! let sub = bus.subscribe(MessageType::ConfirmationRequest, |msg| {
//!     /* render dialog, later call bus.respond_to_confirmation(...) */
//! });
//!
//! // The tool gateway gates every invocation
//! let authorized = bus
//!     .request_confirmation(&ToolCall::new("edit"), None)
//!     .await?;
//! ```

pub mod confirmation;
pub mod messages;

pub use confirmation::{
    ConfirmationBus, Subscription, CONFIRMATION_TIMEOUT, POLICY_DENIED_REASON,
};
pub use messages::{
    BusMessage, ConfirmationOutcome, ConfirmationRequest, ConfirmationResponse, ExecutionFailure,
    ExecutionSuccess, MessageType, PolicyRejection, UpdatePolicy,
};
