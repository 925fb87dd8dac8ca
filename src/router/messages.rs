//! Messages exchanged with the UI
//!
//! Both directions share the wire shape `{"name": ..., "content": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::coordinator::LogicalConfig;
use crate::error::Result;
use crate::github::publish::PublishReport;

/// Inbound message names
pub mod names {
    pub const NOTIFY: &str = "notify";
    pub const CLOSE: &str = "close";
    pub const GET_VARIABLES: &str = "get-variables";
    pub const SEND_TO_GITHUB: &str = "send-to-github";
    pub const SAVE_CONFIG: &str = "save-config";
    pub const GET_CONFIG: &str = "get-config";
    pub const GET_BRANCHES: &str = "get-branches";
    pub const PUBLISH: &str = "publish";
}

/// A request from the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inbound {
    pub name: String,
    #[serde(default)]
    pub content: Option<Value>,
}

impl Inbound {
    pub fn new(name: impl Into<String>, content: Option<Value>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Parse one JSON line
    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Something the session sends out: either a host primitive
/// (`Notify`, `Close`) or a message for the UI
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Show a short text to the user
    Notify(String),
    /// Close the panel
    Close,
    /// Snapshot JSON, in reply to `get-variables`
    Variables(String),
    /// Snapshot JSON to publish, in reply to `send-to-github`
    ToGitHub(String),
    /// Current configuration, in reply to `get-config`
    ReceiveConfig(LogicalConfig),
    /// The document selection changed
    SelectionChanged(Value),
    /// Remote branches, default first
    Branches(Vec<String>),
    /// Result of an in-process publish
    Published(PublishReport),
}

impl Outbound {
    /// Wire name of the message
    pub fn name(&self) -> &'static str {
        match self {
            Outbound::Notify(_) => "notify",
            Outbound::Close => "close",
            Outbound::Variables(_) => "VARIABLES",
            Outbound::ToGitHub(_) => "TO-GITHUB",
            Outbound::ReceiveConfig(_) => "RECEIVE-CONFIG",
            Outbound::SelectionChanged(_) => "SelectionChanged",
            Outbound::Branches(_) => "BRANCHES",
            Outbound::Published(_) => "PUBLISHED",
        }
    }

    /// `{"name": ..., "content": ...}`
    pub fn to_wire(&self) -> Result<Value> {
        let content = match self {
            Outbound::Notify(text) => Value::String(text.clone()),
            Outbound::Close => Value::Null,
            Outbound::Variables(json) | Outbound::ToGitHub(json) => Value::String(json.clone()),
            Outbound::ReceiveConfig(config) => serde_json::to_value(config)?,
            Outbound::SelectionChanged(selection) => selection.clone(),
            Outbound::Branches(branches) => serde_json::to_value(branches)?,
            Outbound::Published(report) => serde_json::to_value(report)?,
        };

        Ok(serde_json::json!({
            "name": self.name(),
            "content": content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinator::Secret;

    #[test]
    fn test_inbound_without_content() {
        let msg = Inbound::from_line(r#"{"name":"get-config"}"#).unwrap();
        assert_eq!(msg.name, names::GET_CONFIG);
        assert!(msg.content.is_none());
    }

    #[test]
    fn test_inbound_rejects_garbage() {
        assert!(Inbound::from_line("get-config").is_err());
    }

    #[test]
    fn test_receive_config_wire_shape() {
        let config = LogicalConfig {
            owner: "acme".into(),
            repo: "design-tokens".into(),
            path: "tokens.json".into(),
            branch: String::new(),
            secret: Secret::new("tok_123"),
        };

        let wire = Outbound::ReceiveConfig(config).to_wire().unwrap();
        assert_eq!(wire["name"], "RECEIVE-CONFIG");
        assert_eq!(wire["content"]["owner"], "acme");
        assert_eq!(wire["content"]["secret"], "tok_123");
        assert_eq!(wire["content"]["branch"], "");
    }

    #[test]
    fn test_snapshot_messages_carry_json_text() {
        let wire = Outbound::ToGitHub("{}".into()).to_wire().unwrap();
        assert_eq!(wire["name"], "TO-GITHUB");
        assert_eq!(wire["content"], "{}");
    }
}
