//! Tool call shape and server namespacing
//!
//! A tool call is the external unit the gate classifies: a tool name plus
//! a JSON argument map. Tools provided by an external server carry a
//! namespaced name: `"server_id__tool_name"` (double underscore). The
//! claimed server prefix lets the bus cross-check a tool's self-reported
//! origin against the caller-supplied trust context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator between a server id and a tool name in namespaced tool names
pub const SERVER_SEPARATOR: &str = "__";

/// A single tool invocation submitted for authorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool (possibly server-namespaced)
    pub name: String,

    /// Invocation arguments as a JSON object
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCall {
    /// Create a tool call with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Add a single argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Replace the whole argument map
    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = args;
        self
    }

    /// The server id this tool name claims to come from, if namespaced
    ///
    /// `"search__web_query"` claims server `"search"`; a plain `"glob"`
    /// claims nothing.
    pub fn claimed_server(&self) -> Option<&str> {
        self.name.split_once(SERVER_SEPARATOR).map(|(server, _)| server)
    }
}

/// Render an argument map in canonical form: recursively key-sorted JSON
///
/// Rule args patterns are matched against this string, so field ordering
/// must be stable no matter how the caller assembled the map.
pub fn canonical_args(args: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_canonical_object(args, &mut out);
    out
}

fn write_canonical_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String((*key).clone()).to_string());
        out.push(':');
        write_canonical_value(&map[key.as_str()], out);
    }
    out.push('}');
}

fn write_canonical_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claimed_server() {
        assert_eq!(ToolCall::new("search__web_query").claimed_server(), Some("search"));
        assert_eq!(ToolCall::new("glob").claimed_server(), None);
        // Only the first separator delimits the server id
        assert_eq!(ToolCall::new("a__b__c").claimed_server(), Some("a"));
    }

    #[test]
    fn test_canonical_args_sorts_keys() {
        let call = ToolCall::new("edit")
            .with_arg("path", "src/lib.rs")
            .with_arg("content", "hello");

        assert_eq!(
            canonical_args(&call.args),
            r#"{"content":"hello","path":"src/lib.rs"}"#
        );
    }

    #[test]
    fn test_canonical_args_nested() {
        let mut args = Map::new();
        args.insert("outer".into(), json!({"b": 2, "a": [1, {"z": 0, "y": 9}]}));

        assert_eq!(
            canonical_args(&args),
            r#"{"outer":{"a":[1,{"y":9,"z":0}],"b":2}}"#
        );
    }

    #[test]
    fn test_canonical_args_empty() {
        assert_eq!(canonical_args(&Map::new()), "{}");
    }

    #[test]
    fn test_canonical_args_escapes_strings() {
        let call = ToolCall::new("shell").with_arg("command", "echo \"hi\"");
        assert_eq!(
            canonical_args(&call.args),
            r#"{"command":"echo \"hi\""}"#
        );
    }
}
