//! Extension model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of extension. Whitelists are scoped per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionCategory {
    /// Editor (VS Code) extension
    Vscode,
    /// Browser extension
    Browser,
    /// Anything the agent reports that the console does not know about
    #[serde(other)]
    Unknown,
}

impl ExtensionCategory {
    pub const ALL: [ExtensionCategory; 2] = [ExtensionCategory::Vscode, ExtensionCategory::Browser];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionCategory::Vscode => "vscode",
            ExtensionCategory::Browser => "browser",
            ExtensionCategory::Unknown => "unknown",
        }
    }

    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vscode" | "editor" | "editor-extension" => ExtensionCategory::Vscode,
            "browser" | "browser-extension" => ExtensionCategory::Browser,
            _ => ExtensionCategory::Unknown,
        }
    }

    /// Unknown categories can never hold whitelist entries.
    pub fn is_known(&self) -> bool {
        !matches!(self, ExtensionCategory::Unknown)
    }
}

impl fmt::Display for ExtensionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An installed extension as reported by a device's last inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(rename = "type")]
    pub category: ExtensionCategory,
}

impl Extension {
    pub fn new(name: impl Into<String>, category: ExtensionCategory) -> Self {
        Self { name: name.into(), category }
    }

    /// Identity key: trimmed, case-folded name.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Case-insensitive identity for extension names.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
