//! Extension Classifier
//!
//! Pure and total: no I/O, no failure, no hidden state.
//! Input: Extension + PolicySet
//! Output: Classification

use std::fmt;

use serde::{Deserialize, Serialize};

use super::set::PolicySet;
use crate::models::Extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Whitelisted,
    Blacklisted,
    Unclassified,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Whitelisted => "whitelisted",
            Classification::Blacklisted => "blacklisted",
            Classification::Unclassified => "unclassified",
        }
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, Classification::Whitelisted)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one extension against `policy`.
///
/// The blacklist is global and wins over any whitelist entry. The whitelist
/// only counts for the extension's own category.
pub fn classify(extension: &Extension, policy: &PolicySet) -> Classification {
    if policy.is_blacklisted(&extension.name) {
        Classification::Blacklisted
    } else if policy.is_whitelisted(&extension.name, extension.category) {
        Classification::Whitelisted
    } else {
        Classification::Unclassified
    }
}

/// Classify a whole inventory, preserving order.
pub fn classify_all<'a>(extensions: &'a [Extension], policy: &PolicySet) -> Vec<(&'a Extension, Classification)> {
    extensions.iter().map(|e| (e, classify(e, policy))).collect()
}
