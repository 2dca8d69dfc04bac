//! Policy decision engine
//!
//! `PolicyEngine` classifies a tool invocation as Allow, Deny, or AskUser
//! by scanning an immutable rule set in descending priority order. It is a
//! pure function of its construction-time state: no I/O, no mutation, safe
//! to share across tasks without locking. Reloading rules means building a
//! new engine.

use serde_json::{Map, Value};

use crate::core::tool_call::canonical_args;

use super::loader::default_rules;
use super::rule::{PolicyDecision, PolicyRule};

/// Configuration for a `PolicyEngine`
#[derive(Debug, Clone)]
pub struct PolicyEngineConfig {
    /// Rules to install (any order; the engine sorts once at construction)
    pub rules: Vec<PolicyRule>,

    /// Decision when no rule matches
    pub default_decision: PolicyDecision,

    /// When true, AskUser resolves as Deny (no human is available)
    pub non_interactive: bool,
}

impl Default for PolicyEngineConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_decision: PolicyDecision::AskUser,
            non_interactive: false,
        }
    }
}

impl PolicyEngineConfig {
    /// Create an empty configuration (default decision AskUser, interactive)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule set
    pub fn with_rules(mut self, rules: Vec<PolicyRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Append rules from another load (e.g. defaults plus a user file)
    pub fn add_rules(mut self, rules: Vec<PolicyRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Set the decision used when no rule matches
    pub fn with_default_decision(mut self, decision: PolicyDecision) -> Self {
        self.default_decision = decision;
        self
    }

    /// Set non-interactive mode
    pub fn with_non_interactive(mut self, non_interactive: bool) -> Self {
        self.non_interactive = non_interactive;
        self
    }
}

/// Rule-based classifier for tool invocations
#[derive(Debug)]
pub struct PolicyEngine {
    rules: Vec<PolicyRule>,
    default_decision: PolicyDecision,
    non_interactive: bool,
}

impl PolicyEngine {
    /// Build an engine, sorting rules once by descending priority
    ///
    /// The sort is stable, so rules with equal keys keep insertion order;
    /// rules with distinct keys are ordered by key alone regardless of
    /// declaration order.
    pub fn new(config: PolicyEngineConfig) -> Self {
        let mut rules = config.rules;
        rules.sort_by(|a, b| b.priority_key().cmp(&a.priority_key()));

        Self {
            rules,
            default_decision: config.default_decision,
            non_interactive: config.non_interactive,
        }
    }

    /// Build an engine carrying only the built-in default rule set
    pub fn with_default_rules() -> Self {
        Self::new(PolicyEngineConfig::new().with_rules(default_rules()))
    }

    /// Classify one tool invocation
    ///
    /// First matching rule wins. Malformed or unexpected args never error:
    /// they simply fail the args pattern and fall through to the next rule
    /// or the default decision. `server_name` is the caller-supplied trust
    /// context; the engine only logs it — the anti-spoofing comparison is
    /// the confirmation bus's job.
    pub fn evaluate(
        &self,
        tool_name: &str,
        args: &Map<String, Value>,
        server_name: Option<&str>,
    ) -> PolicyDecision {
        let canonical = canonical_args(args);

        let mut decision = self.default_decision;
        for rule in &self.rules {
            if rule.matches(tool_name, &canonical) {
                decision = rule.decision();
                tracing::trace!(
                    tool_name,
                    server_name,
                    rule = rule.tool_name(),
                    ?decision,
                    "policy rule matched"
                );
                break;
            }
        }

        if self.non_interactive && decision == PolicyDecision::AskUser {
            tracing::debug!(tool_name, "non-interactive mode: AskUser downgraded to Deny");
            return PolicyDecision::Deny;
        }
        decision
    }

    /// Number of installed rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Decision used when no rule matches
    pub fn default_decision(&self) -> PolicyDecision {
        self.default_decision
    }

    /// Whether AskUser outcomes are downgraded to Deny
    pub fn is_non_interactive(&self) -> bool {
        self.non_interactive
    }
}
