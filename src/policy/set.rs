//! Policy Set
//!
//! Per-category whitelist plus one global blacklist. All name comparisons
//! use the trimmed, case-folded name; the first-seen spelling is kept.
//!
//! The whitelist is held under the backend's own keys. Keys the console
//! does not recognise are carried along untouched, since every edit
//! replaces the whole document on the backend.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::api::PolicyDocument;
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{name_key, ExtensionCategory};

/// Key the backend stores the blacklist under.
pub const BLACKLIST_WIRE_KEY: &str = "vscode";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    /// Wire key to names, in backend spelling
    whitelist: BTreeMap<String, Vec<String>>,
    blacklist: Vec<String>,
}

/// Outcome of a local policy edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChange {
    Changed,
    /// Benign no-op (entry already present / already absent)
    Unchanged,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the two backend documents.
    ///
    /// Every whitelist key is kept as sent, duplicates within a key
    /// collapsed. Every blacklist key is unioned into the global set.
    pub fn from_documents(whitelist: &PolicyDocument, blacklist: &PolicyDocument) -> Self {
        let mut set = Self::new();
        for (wire_key, names) in whitelist {
            let entries = set.whitelist.entry(wire_key.clone()).or_default();
            for name in names {
                let trimmed = name.trim();
                let key = name_key(trimmed);
                if !trimmed.is_empty() && !entries.iter().any(|n| name_key(n) == key) {
                    entries.push(trimmed.to_string());
                }
            }
        }
        for name in blacklist.values().flatten() {
            let _ = set.blacklist_insert(name);
        }
        set
    }

    pub fn whitelist_document(&self) -> PolicyDocument {
        self.whitelist.clone()
    }

    pub fn blacklist_document(&self) -> PolicyDocument {
        let mut doc = PolicyDocument::new();
        doc.insert(BLACKLIST_WIRE_KEY.to_string(), self.blacklist.clone());
        doc
    }

    // ------------------------------------------------------------------ reads

    /// Whitelisted names for `category`, across every key that maps to it.
    pub fn whitelisted(&self, category: ExtensionCategory) -> Vec<&str> {
        self.keys_for(category)
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .collect()
    }

    pub fn blacklisted(&self) -> &[String] {
        &self.blacklist
    }

    pub fn is_whitelisted(&self, name: &str, category: ExtensionCategory) -> bool {
        let key = name_key(name);
        self.keys_for(category)
            .any(|(_, names)| names.iter().any(|n| name_key(n) == key))
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        let key = name_key(name);
        self.blacklist.iter().any(|n| name_key(n) == key)
    }

    /// Whitelist keys this console cannot classify against.
    pub fn unrecognised_keys(&self) -> Vec<&str> {
        self.whitelist
            .keys()
            .filter(|k| !ExtensionCategory::parse_lossy(k).is_known())
            .map(String::as_str)
            .collect()
    }

    /// Names present in both a whitelist category and the blacklist.
    pub fn overlaps(&self) -> Vec<(ExtensionCategory, String)> {
        let blacklisted: BTreeSet<String> = self.blacklist.iter().map(|n| name_key(n)).collect();
        self.whitelist
            .iter()
            .map(|(wire_key, names)| (ExtensionCategory::parse_lossy(wire_key), names))
            .filter(|(category, _)| category.is_known())
            .flat_map(|(category, names)| names.iter().map(move |n| (category, n)))
            .filter(|(_, n)| blacklisted.contains(&name_key(n)))
            .map(|(category, n)| (category, n.clone()))
            .collect()
    }

    fn keys_for(&self, category: ExtensionCategory) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.whitelist
            .iter()
            .filter(move |(wire_key, _)| category.is_known() && ExtensionCategory::parse_lossy(wire_key) == category)
    }

    // -------------------------------------------------------------- mutations

    /// Add `name` to the whitelist of `category`.
    ///
    /// Goes under the canonical key when present, else under the first
    /// alias key the backend already uses for that category.
    pub fn whitelist_insert(&mut self, name: &str, category: ExtensionCategory) -> ConsoleResult<PolicyChange> {
        let trimmed = validated_name(name)?;
        if !category.is_known() {
            return Err(ConsoleError::Validation(format!(
                "cannot whitelist '{}' under an unknown category",
                trimmed
            )));
        }
        if self.is_whitelisted(trimmed, category) {
            return Ok(PolicyChange::Unchanged);
        }

        let wire_key = if self.whitelist.contains_key(category.as_str()) {
            category.as_str().to_string()
        } else {
            self.keys_for(category)
                .map(|(k, _)| k.clone())
                .next()
                .unwrap_or_else(|| category.as_str().to_string())
        };
        self.whitelist.entry(wire_key).or_default().push(trimmed.to_string());
        Ok(PolicyChange::Changed)
    }

    /// Remove the first case-insensitive match from `category`. A key left
    /// empty by the removal is dropped.
    pub fn whitelist_remove(&mut self, name: &str, category: ExtensionCategory) -> PolicyChange {
        let key = name_key(name);
        let found = self
            .keys_for(category)
            .find_map(|(wire_key, names)| {
                names
                    .iter()
                    .position(|n| name_key(n) == key)
                    .map(|pos| (wire_key.clone(), pos))
            });
        let Some((wire_key, pos)) = found else {
            return PolicyChange::Unchanged;
        };

        if let Some(names) = self.whitelist.get_mut(&wire_key) {
            names.remove(pos);
            if names.is_empty() {
                self.whitelist.remove(&wire_key);
            }
        }
        PolicyChange::Changed
    }

    /// Add `name` to the global blacklist. Whitelist entries are left alone.
    pub fn blacklist_insert(&mut self, name: &str) -> ConsoleResult<PolicyChange> {
        let trimmed = validated_name(name)?;
        if self.is_blacklisted(trimmed) {
            return Ok(PolicyChange::Unchanged);
        }
        self.blacklist.push(trimmed.to_string());
        Ok(PolicyChange::Changed)
    }

    pub fn blacklist_remove(&mut self, name: &str) -> PolicyChange {
        let key = name_key(name);
        match self.blacklist.iter().position(|n| name_key(n) == key) {
            Some(pos) => {
                self.blacklist.remove(pos);
                PolicyChange::Changed
            }
            None => PolicyChange::Unchanged,
        }
    }
}

fn validated_name(name: &str) -> ConsoleResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ConsoleError::Validation("extension name must not be empty".to_string()))
    } else {
        Ok(trimmed)
    }
}
