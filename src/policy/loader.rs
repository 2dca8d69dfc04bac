//! Rule source loading
//!
//! Rules are authored as a TOML table-of-rules and validated atomically: a
//! single malformed entry fails the whole load, so a partially usable rule
//! set is never installed.
//!
//! ```toml
//! [[rules]]
//! tool_name = "glob"
//! decision = "allow"
//! priority = 50
//!
//! [[rules]]
//! tool_name = "shell"
//! args_pattern = '"command":"git status'
//! decision = "allow"
//! priority = 100
//! ```
//!
//! Every rule in one load call is stamped with the same tier, which is how
//! a user-supplied rule file outranks the built-in defaults regardless of
//! the integer priorities the user chose.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rule::{PolicyDecision, PolicyRule, PriorityKey, MAX_RULE_PRIORITY};

/// Tier the built-in default rule set loads at
pub const DEFAULT_RULES_TIER: u8 = 0;

/// Suggested tier for user-supplied rule files
pub const USER_RULES_TIER: u8 = 1;

/// Errors produced while loading a rule source
#[derive(Error, Debug)]
pub enum PolicyLoadError {
    /// Rule file could not be read
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rule source is not valid TOML
    #[error("invalid rule source: {0}")]
    Parse(#[from] toml::de::Error),

    /// Authored priority exceeds the per-tier maximum
    #[error("rule for `{tool_name}`: priority must be <= {MAX_RULE_PRIORITY} (got {priority})")]
    PriorityTooHigh { tool_name: String, priority: i64 },

    /// Authored priority is negative
    #[error("rule for `{tool_name}`: priority must be >= 0 (got {priority})")]
    PriorityNegative { tool_name: String, priority: i64 },

    /// Args pattern is not a valid regular expression
    #[error("rule for `{tool_name}`: invalid args pattern: {source}")]
    Pattern {
        tool_name: String,
        #[source]
        source: regex::Error,
    },
}

/// The authored form of a rule, before validation and pattern compilation
///
/// This is also the shape carried by `update-policy` bus messages, since
/// collaborators exchange rules in authored form rather than compiled form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Tool name, or prefix ending in `*`
    pub tool_name: String,

    /// Optional regex matched against the canonical args string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_pattern: Option<String>,

    /// What to do when the rule matches
    pub decision: PolicyDecision,

    /// Authored priority, `0..=999`
    pub priority: i64,
}

impl RuleSpec {
    /// Validate and compile into a `PolicyRule` at the given tier
    pub fn compile(&self, tier: u8) -> Result<PolicyRule, PolicyLoadError> {
        if self.priority > i64::from(MAX_RULE_PRIORITY) {
            return Err(PolicyLoadError::PriorityTooHigh {
                tool_name: self.tool_name.clone(),
                priority: self.priority,
            });
        }
        if self.priority < 0 {
            return Err(PolicyLoadError::PriorityNegative {
                tool_name: self.tool_name.clone(),
                priority: self.priority,
            });
        }

        let key = PriorityKey::new(tier, self.priority as u16);
        let mut rule = PolicyRule::new(self.tool_name.clone(), self.decision, key);

        if let Some(pattern) = &self.args_pattern {
            let compiled = Regex::new(pattern).map_err(|source| PolicyLoadError::Pattern {
                tool_name: self.tool_name.clone(),
                source,
            })?;
            rule = rule.with_args_pattern(compiled);
        }

        Ok(rule)
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

/// Load rules from in-memory TOML source, stamping each with `tier`
///
/// Fails atomically: any parse or validation error discards the whole set.
pub fn load_rules_str(source: &str, tier: u8) -> Result<Vec<PolicyRule>, PolicyLoadError> {
    let file: RuleFile = toml::from_str(source)?;

    let mut rules = Vec::with_capacity(file.rules.len());
    for spec in &file.rules {
        rules.push(spec.compile(tier)?);
    }

    tracing::debug!("Loaded {} policy rules at tier {}", rules.len(), tier);
    Ok(rules)
}

/// Load rules from a TOML file on disk, stamping each with `tier`
pub fn load_rules(path: &Path, tier: u8) -> Result<Vec<PolicyRule>, PolicyLoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_rules_str(&source, tier)
}

/// The built-in default rule set, loaded at `DEFAULT_RULES_TIER`
///
/// Read-only tools run without prompting; anything that mutates files or
/// spawns processes asks first. Dynamically discovered tools always ask.
/// Any user rule file loaded at a higher tier overrides all of these.
pub fn default_rules() -> Vec<PolicyRule> {
    let tier = DEFAULT_RULES_TIER;
    vec![
        PolicyRule::new("read", PolicyDecision::Allow, PriorityKey::new(tier, 100)),
        PolicyRule::new("glob", PolicyDecision::Allow, PriorityKey::new(tier, 100)),
        PolicyRule::new("grep", PolicyDecision::Allow, PriorityKey::new(tier, 100)),
        PolicyRule::new("list", PolicyDecision::Allow, PriorityKey::new(tier, 100)),
        PolicyRule::new("write", PolicyDecision::AskUser, PriorityKey::new(tier, 50)),
        PolicyRule::new("edit", PolicyDecision::AskUser, PriorityKey::new(tier, 50)),
        PolicyRule::new("shell", PolicyDecision::AskUser, PriorityKey::new(tier, 50)),
        PolicyRule::new("web_fetch", PolicyDecision::AskUser, PriorityKey::new(tier, 50)),
        PolicyRule::new(
            "discovered_tool_*",
            PolicyDecision::AskUser,
            PriorityKey::new(tier, 0),
        ),
    ]
}
