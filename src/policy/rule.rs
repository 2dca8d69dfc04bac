//! Policy rule model
//!
//! Contains:
//! - `PolicyDecision` - the three-valued classification outcome
//! - `PriorityKey` - two-field (tier, priority) ordering key
//! - `PolicyRule` - one declarative rule with a compiled args pattern

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum authored priority within a tier
pub const MAX_RULE_PRIORITY: u16 = 999;

/// Trailing marker turning a rule's tool name into a prefix match
///
/// A rule named `"discovered_tool_*"` matches every tool whose name starts
/// with `discovered_tool_`, which is how rules cover dynamically discovered
/// tools whose exact names are unknown at load time.
pub const PREFIX_SENTINEL: char = '*';

/// Outcome of classifying a tool invocation
///
/// This set is closed: consumers never observe any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    /// Execute without asking
    Allow,
    /// Refuse without asking
    Deny,
    /// Defer to an interactive human decision
    AskUser,
}

/// Ordering key for a rule: coarse tier, then authored priority
///
/// Compared lexicographically (derived `Ord` on field order), so a rule in
/// a higher tier always outranks every rule in a lower tier no matter what
/// integer priorities were authored. Tier 0 is reserved for the built-in
/// default rule set; user-supplied rule files typically load at tier 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriorityKey {
    /// Coarse priority band (built-in vs. user-defined vs. higher)
    pub tier: u8,
    /// Fine-grained authored priority, `0..=999`
    pub priority: u16,
}

impl PriorityKey {
    /// Create a priority key
    pub fn new(tier: u8, priority: u16) -> Self {
        Self { tier, priority }
    }
}

/// How a rule matches tool names
#[derive(Debug, Clone)]
enum NameMatcher {
    /// Name must equal this exactly
    Exact(String),
    /// Name must start with this prefix
    Prefix(String),
}

/// One declarative authorization rule
#[derive(Debug, Clone)]
pub struct PolicyRule {
    matcher: NameMatcher,
    args_pattern: Option<Regex>,
    decision: PolicyDecision,
    key: PriorityKey,
}

impl PolicyRule {
    /// Create a rule for a tool name (or `*`-suffixed prefix)
    pub fn new(tool_name: impl Into<String>, decision: PolicyDecision, key: PriorityKey) -> Self {
        let name = tool_name.into();
        let matcher = match name.strip_suffix(PREFIX_SENTINEL) {
            Some(prefix) => NameMatcher::Prefix(prefix.to_string()),
            None => NameMatcher::Exact(name),
        };
        Self {
            matcher,
            args_pattern: None,
            decision,
            key,
        }
    }

    /// Restrict the rule to invocations whose canonical args match a pattern
    ///
    /// The pattern is compiled once here and reused for every evaluation.
    pub fn with_args_pattern(mut self, pattern: Regex) -> Self {
        self.args_pattern = Some(pattern);
        self
    }

    /// The rule's decision
    pub fn decision(&self) -> PolicyDecision {
        self.decision
    }

    /// The rule's ordering key
    pub fn priority_key(&self) -> PriorityKey {
        self.key
    }

    /// The name or prefix this rule was authored for (sentinel stripped)
    pub fn tool_name(&self) -> &str {
        match &self.matcher {
            NameMatcher::Exact(name) => name,
            NameMatcher::Prefix(prefix) => prefix,
        }
    }

    /// Check whether this rule matches a tool name and its canonical args
    pub fn matches(&self, tool_name: &str, canonical_args: &str) -> bool {
        let name_matches = match &self.matcher {
            NameMatcher::Exact(name) => tool_name == name,
            NameMatcher::Prefix(prefix) => tool_name.starts_with(prefix.as_str()),
        };
        if !name_matches {
            return false;
        }

        match &self.args_pattern {
            Some(pattern) => pattern.is_match(canonical_args),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let rule = PolicyRule::new("glob", PolicyDecision::Allow, PriorityKey::new(1, 50));

        assert!(rule.matches("glob", "{}"));
        assert!(!rule.matches("globber", "{}"));
        assert!(!rule.matches("shell", "{}"));
    }

    #[test]
    fn test_prefix_match() {
        let rule = PolicyRule::new(
            "discovered_tool_*",
            PolicyDecision::AskUser,
            PriorityKey::new(0, 0),
        );

        assert!(rule.matches("discovered_tool_weather", "{}"));
        assert!(rule.matches("discovered_tool_", "{}"));
        assert!(!rule.matches("discovered", "{}"));
        assert_eq!(rule.tool_name(), "discovered_tool_");
    }

    #[test]
    fn test_args_pattern_gates_match() {
        let rule = PolicyRule::new("shell", PolicyDecision::Allow, PriorityKey::new(1, 10))
            .with_args_pattern(Regex::new(r#""command":"git status"#).unwrap());

        assert!(rule.matches("shell", r#"{"command":"git status"}"#));
        assert!(!rule.matches("shell", r#"{"command":"rm -rf /"}"#));
        // Name must still match first
        assert!(!rule.matches("edit", r#"{"command":"git status"}"#));
    }

    #[test]
    fn test_priority_key_tier_dominates() {
        // A low-priority user rule outranks the highest built-in rule
        assert!(PriorityKey::new(1, 0) > PriorityKey::new(0, 999));
        assert!(PriorityKey::new(1, 50) > PriorityKey::new(1, 10));
        assert_eq!(PriorityKey::new(1, 50), PriorityKey::new(1, 50));
    }

    #[test]
    fn test_decision_serde_names() {
        assert_eq!(
            serde_json::to_string(&PolicyDecision::AskUser).unwrap(),
            "\"ask_user\""
        );
        let parsed: PolicyDecision = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(parsed, PolicyDecision::Deny);
    }
}
