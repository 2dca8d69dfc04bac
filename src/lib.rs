//! # toolgate
//!
//! Authorization gate for autonomous agent tool invocations. Every tool
//! call an agent attempts (shell commands, file edits, network calls) is
//! classified as automatically allowed, automatically denied, or deferred
//! to an interactive human decision, without blocking unrelated concurrent
//! invocations and without trusting a tool's self-reported origin.
//!
//! Two pieces make up the gate:
//! - [`policy`] - the rule-based decision engine, loaded from declarative
//!   TOML rule files with tiered priorities
//! - [`bus`] - the confirmation bus: typed pub/sub plus a correlation-ID
//!   protocol that suspends ambiguous calls until a human answers or a
//!   5-minute fail-safe timeout denies them
//!
//! Tool execution, UI rendering, and audit persistence are external
//! collaborators; they consume the bus, not the other way around.

pub mod core;
pub mod policy;

// Confirmation protocol on top of the policy engine
pub mod bus;

// Optional tracing setup for host applications
pub mod logging;
