//! Confirmation bus
//!
//! The bus turns an ambiguous policy decision into a human-in-the-loop
//! round trip:
//! - **Pub/sub**: typed subscribers keyed by `MessageType`, synchronous
//!   fan-out to a snapshot of current subscribers
//! - **Correlation protocol**: each AskUser invocation suspends on its own
//!   oneshot waiter keyed by a fresh correlation ID
//! - **Fail-safe default**: a pending confirmation that receives no
//!   matching response within 5 minutes resolves to deny
//!
//! Any number of confirmations may be pending at once; each has its own
//! waiter and timer, and they may resolve in any order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::core::error::{GateError, GateResult};
use crate::core::tool_call::ToolCall;
use crate::policy::engine::PolicyEngine;
use crate::policy::rule::PolicyDecision;

use super::messages::{
    BusMessage, ConfirmationOutcome, ConfirmationRequest, ConfirmationResponse, MessageType,
    PolicyRejection,
};

/// How long a published confirmation request waits for a response
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Reason attached to rejections on the plain policy-deny path
pub const POLICY_DENIED_REASON: &str = "Policy denied execution";

type Handler = Arc<dyn Fn(&BusMessage) + Send + Sync>;

struct BusInner {
    engine: PolicyEngine,
    subscribers: Mutex<HashMap<MessageType, Vec<(u64, Handler)>>>,
    /// The only mutable shared state of the protocol: correlation ID to
    /// one-shot resolver. Insertion happens before the request is
    /// published; removal happens exactly once on first of matching
    /// response or timeout.
    pending: Mutex<HashMap<Uuid, oneshot::Sender<ConfirmationOutcome>>>,
    next_subscriber_id: AtomicU64,
    debug: bool,
}

/// Handle returned by `subscribe`; detaches the handler on demand
///
/// `unsubscribe` is idempotent. Dropping the handle without calling it
/// leaves the handler installed for the lifetime of the bus.
pub struct Subscription {
    inner: Weak<BusInner>,
    message_type: MessageType,
    id: u64,
}

impl Subscription {
    /// Remove the handler from the bus; calling again is a no-op
    pub fn unsubscribe(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut subscribers = inner.subscribers.lock().unwrap();
        if let Some(handlers) = subscribers.get_mut(&self.message_type) {
            handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Authorization gate combining policy evaluation with a confirmation
/// round trip
///
/// Cheap to clone; clones share subscribers and pending waiters.
#[derive(Clone)]
pub struct ConfirmationBus {
    inner: Arc<BusInner>,
}

impl ConfirmationBus {
    /// Create a bus backed by a policy engine
    pub fn new(engine: PolicyEngine) -> Self {
        Self::with_debug(engine, false)
    }

    /// Create a bus, optionally mirroring every published message to the
    /// diagnostic log
    pub fn with_debug(engine: PolicyEngine, debug: bool) -> Self {
        Self {
            inner: Arc::new(BusInner {
                engine,
                subscribers: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(0),
                debug,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Pub/sub surface
    // ------------------------------------------------------------------

    /// Register a handler for one message type
    pub fn subscribe<F>(&self, message_type: MessageType, handler: F) -> Subscription
    where
        F: Fn(&BusMessage) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .entry(message_type)
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            inner: Arc::downgrade(&self.inner),
            message_type,
            id,
        }
    }

    /// Deliver a message to every current subscriber of its type
    ///
    /// Fan-out completes before this returns. The subscriber list is
    /// snapshotted under the lock and invoked outside it, so a handler may
    /// itself subscribe or publish without deadlocking.
    pub fn publish(&self, message: BusMessage) {
        if self.inner.debug {
            tracing::debug!(target: "toolgate::bus", ?message, "publishing");
        }

        let handlers: Vec<Handler> = {
            let subscribers = self.inner.subscribers.lock().unwrap();
            subscribers
                .get(&message.message_type())
                .map(|entries| entries.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };

        for handler in handlers {
            handler(&message);
        }
    }

    /// Number of handlers currently registered for a message type
    pub fn listener_count(&self, message_type: MessageType) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .get(&message_type)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Drop every subscription (teardown)
    pub fn remove_all_listeners(&self) {
        self.inner.subscribers.lock().unwrap().clear();
    }

    /// Number of confirmations currently awaiting a response
    pub fn pending_confirmations(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }

    // ------------------------------------------------------------------
    // Confirmation protocol
    // ------------------------------------------------------------------

    /// Authorize one tool invocation
    ///
    /// Resolves `true` (execute) or `false` (refuse). Allowed calls publish
    /// nothing; every refused call publishes a `PolicyRejection` carrying a
    /// human-readable reason. AskUser calls publish a
    /// `ConfirmationRequest` and suspend until `respond_to_confirmation`
    /// supplies a matching correlation ID, or 5 minutes pass (silence is
    /// denial).
    ///
    /// The one raised error is a tool call with an empty name.
    pub async fn request_confirmation(
        &self,
        tool_call: &ToolCall,
        server_name: Option<&str>,
    ) -> GateResult<bool> {
        if tool_call.name.is_empty() {
            return Err(GateError::MissingToolName);
        }

        // Anti-spoofing gate: a namespaced tool may not claim a server
        // other than the one that actually supplied it. Checked before
        // policy so no Allow rule can override it.
        if let (Some(claimed), Some(supplied)) = (tool_call.claimed_server(), server_name) {
            if claimed != supplied {
                let reason = format!(
                    "Tool `{}` claims server `{}` but was supplied by server `{}`",
                    tool_call.name, claimed, supplied
                );
                tracing::warn!(tool = %tool_call.name, claimed, supplied, "server spoofing detected");
                self.reject(tool_call, Uuid::new_v4(), reason, server_name);
                return Ok(false);
            }
        }

        match self
            .inner
            .engine
            .evaluate(&tool_call.name, &tool_call.args, server_name)
        {
            PolicyDecision::Allow => Ok(true),
            PolicyDecision::Deny => {
                self.reject(
                    tool_call,
                    Uuid::new_v4(),
                    POLICY_DENIED_REASON.to_string(),
                    server_name,
                );
                Ok(false)
            }
            PolicyDecision::AskUser => self.await_confirmation(tool_call, server_name).await,
        }
    }

    /// Resolve a pending confirmation by correlation ID
    ///
    /// Always publishes a `ConfirmationResponse` for observers. Only a
    /// currently registered waiter is resolved; unknown or already-resolved
    /// correlation IDs make this a published-but-ignored no-op, so stale or
    /// duplicate UI responses are harmless.
    pub fn respond_to_confirmation(
        &self,
        correlation_id: Uuid,
        outcome: ConfirmationOutcome,
        payload: Option<Value>,
        requires_user_confirmation: Option<bool>,
    ) {
        self.publish(BusMessage::ConfirmationResponse(ConfirmationResponse {
            correlation_id,
            outcome,
            confirmed: outcome.confirmed(),
            requires_user_confirmation,
            payload,
        }));

        let waiter = self.inner.pending.lock().unwrap().remove(&correlation_id);
        match waiter {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    // Waiter raced its timeout between removal and send
                    tracing::debug!(%correlation_id, "confirmation waiter already gone");
                }
            }
            None => {
                tracing::debug!(%correlation_id, "response for unknown or resolved confirmation");
            }
        }
    }

    /// AskUser branch: publish a request and suspend until response or
    /// timeout
    async fn await_confirmation(
        &self,
        tool_call: &ToolCall,
        server_name: Option<&str>,
    ) -> GateResult<bool> {
        let correlation_id = Uuid::new_v4();
        let (tx, mut rx) = oneshot::channel();

        // Register before publishing so a subscriber responding from
        // inside its handler still finds the waiter.
        self.inner
            .pending
            .lock()
            .unwrap()
            .insert(correlation_id, tx);

        self.publish(BusMessage::ConfirmationRequest(ConfirmationRequest {
            correlation_id,
            tool_call: tool_call.clone(),
            server_name: server_name.map(str::to_string),
        }));
        tracing::info!(tool = %tool_call.name, %correlation_id, "awaiting user confirmation");

        let outcome = match tokio::time::timeout(CONFIRMATION_TIMEOUT, &mut rx).await {
            Ok(Ok(outcome)) => Some(outcome),
            // Resolver dropped without answering (bus torn down)
            Ok(Err(_)) => None,
            Err(_elapsed) => {
                self.inner.pending.lock().unwrap().remove(&correlation_id);
                // A response may have claimed the waiter just before the
                // timer fired; honor it if its outcome is already buffered.
                rx.try_recv().ok()
            }
        };

        match outcome {
            Some(outcome) if outcome.confirmed() => Ok(true),
            Some(_) => {
                self.reject(
                    tool_call,
                    correlation_id,
                    "User cancelled execution".to_string(),
                    server_name,
                );
                Ok(false)
            }
            None => {
                tracing::warn!(tool = %tool_call.name, %correlation_id, "confirmation timed out");
                self.reject(
                    tool_call,
                    correlation_id,
                    "Confirmation request timed out".to_string(),
                    server_name,
                );
                Ok(false)
            }
        }
    }

    fn reject(
        &self,
        tool_call: &ToolCall,
        correlation_id: Uuid,
        reason: String,
        server_name: Option<&str>,
    ) {
        self.publish(BusMessage::PolicyRejection(PolicyRejection {
            tool_call: tool_call.clone(),
            correlation_id,
            reason,
            server_name: server_name.map(str::to_string),
        }));
    }
}
