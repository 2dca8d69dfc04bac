//! Declarative authorization policy
//!
//! This module provides the rule-based classifier for tool invocations:
//! - **Rules**: tool-name (exact or prefix) plus optional args pattern
//! - **Loader**: TOML table-of-rules source, validated atomically
//! - **Engine**: immutable, priority-ordered evaluation
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolgate::policy::{default_rules, load_rules_str, PolicyEngine, PolicyEngineConfig};
//! use toolgate::policy::loader::USER_RULES_TIER;
//!
//! let user_rules = load_rules_str(source, USER_RULES_TIER)?;
//! let engine = PolicyEngine::new(
//!     PolicyEngineConfig::new()
//!         .with_rules(default_rules())
//!         .add_rules(user_rules),
//! );
//! ```

pub mod engine;
pub mod loader;
pub mod rule;

pub use engine::{PolicyEngine, PolicyEngineConfig};
pub use loader::{default_rules, load_rules, load_rules_str, PolicyLoadError, RuleSpec};
pub use rule::{PolicyDecision, PolicyRule, PriorityKey, MAX_RULE_PRIORITY};
