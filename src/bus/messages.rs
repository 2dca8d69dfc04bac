//! Bus message contracts
//!
//! The closed set of message types exchanged on the confirmation bus. This
//! core produces confirmation-request, confirmation-response, and
//! policy-rejection; the execution-* and update-policy types are published
//! by external collaborators (the tool scheduler) reusing the same bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::tool_call::ToolCall;
use crate::policy::loader::RuleSpec;

/// Subscription key for the bus: one variant per message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    ConfirmationRequest,
    ConfirmationResponse,
    PolicyRejection,
    ExecutionSuccess,
    ExecutionFailure,
    UpdatePolicy,
}

/// What the user chose in a confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationOutcome {
    /// Run this invocation only
    ProceedOnce,
    /// Run it and remember the choice (the UI layer publishes the
    /// matching update-policy message)
    ProceedAlways,
    /// Refuse this invocation
    Cancel,
    /// Run it with user-edited arguments carried in the response payload
    ModifyWithPayload,
}

impl ConfirmationOutcome {
    /// Whether this outcome authorizes execution
    pub fn confirmed(self) -> bool {
        !matches!(self, ConfirmationOutcome::Cancel)
    }
}

/// Request for a human decision on one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    /// Opaque token linking this request to its eventual response
    pub correlation_id: Uuid,
    pub tool_call: ToolCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

/// The human decision for a previously published request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub correlation_id: Uuid,
    pub outcome: ConfirmationOutcome,
    /// Derived from `outcome`; carried so subscribers need not re-derive
    pub confirmed: bool,
    /// Signals the legacy/alternate UI path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_user_confirmation: Option<bool>,
    /// Edited arguments for modify flows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Published whenever a tool invocation's final outcome is "not authorized"
///
/// The reason is always present and non-empty, and distinguishes a policy
/// denial from spoofing, user cancellation, and timeout so observability
/// layers can flag each distinctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRejection {
    pub tool_call: ToolCall,
    pub correlation_id: Uuid,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

/// Result report from the external scheduler after an authorized run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSuccess {
    pub tool_call: ToolCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Failure report from the external scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub tool_call: ToolCall,
    pub error: String,
}

/// Rule additions broadcast by collaborators (e.g. after "proceed always")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    pub rules: Vec<RuleSpec>,
    pub tier: u8,
}

/// One message on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BusMessage {
    ConfirmationRequest(ConfirmationRequest),
    ConfirmationResponse(ConfirmationResponse),
    PolicyRejection(PolicyRejection),
    ExecutionSuccess(ExecutionSuccess),
    ExecutionFailure(ExecutionFailure),
    UpdatePolicy(UpdatePolicy),
}

impl BusMessage {
    /// The subscription key this message is delivered under
    pub fn message_type(&self) -> MessageType {
        match self {
            BusMessage::ConfirmationRequest(_) => MessageType::ConfirmationRequest,
            BusMessage::ConfirmationResponse(_) => MessageType::ConfirmationResponse,
            BusMessage::PolicyRejection(_) => MessageType::PolicyRejection,
            BusMessage::ExecutionSuccess(_) => MessageType::ExecutionSuccess,
            BusMessage::ExecutionFailure(_) => MessageType::ExecutionFailure,
            BusMessage::UpdatePolicy(_) => MessageType::UpdatePolicy,
        }
    }
}
