//! Policy Store
//!
//! Read-through cache of one device's extension policy. Edits are never
//! applied optimistically: the full updated document goes to the backend
//! first and the cache is swapped only once the backend accepts it.

use chrono::{DateTime, Utc};

use super::set::{PolicyChange, PolicySet};
use crate::api::ConsoleClient;
use crate::error::ConsoleResult;
use crate::models::ExtensionCategory;

pub struct PolicyStore {
    device_id: String,
    policy: PolicySet,
    fetched_at: Option<DateTime<Utc>>,
}

impl PolicyStore {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            policy: PolicySet::new(),
            fetched_at: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn policy(&self) -> &PolicySet {
        &self.policy
    }

    /// When the cache last matched backend state.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        match self.fetched_at {
            Some(at) => Utc::now() - at > max_age,
            None => true,
        }
    }

    /// Re-read whitelist and blacklist from the backend.
    pub async fn refresh(&mut self, client: &ConsoleClient) -> ConsoleResult<&PolicySet> {
        let (whitelist, blacklist) = tokio::try_join!(
            client.whitelist(&self.device_id),
            client.blacklist(&self.device_id),
        )?;

        self.policy = PolicySet::from_documents(&whitelist, &blacklist);
        self.fetched_at = Some(Utc::now());

        tracing::debug!(
            "Policy refreshed for {}: {} blacklisted",
            self.device_id,
            self.policy.blacklisted().len()
        );
        Ok(&self.policy)
    }

    pub async fn add_to_whitelist(
        &mut self,
        client: &ConsoleClient,
        name: &str,
        category: ExtensionCategory,
    ) -> ConsoleResult<PolicyChange> {
        let mut candidate = self.policy.clone();
        if candidate.whitelist_insert(name, category)? == PolicyChange::Unchanged {
            return Ok(PolicyChange::Unchanged);
        }

        client.replace_whitelist(&self.device_id, &candidate.whitelist_document()).await?;
        self.swap(candidate);

        tracing::info!("Whitelisted '{}' ({}) on {}", name.trim(), category, self.device_id);
        Ok(PolicyChange::Changed)
    }

    pub async fn remove_from_whitelist(
        &mut self,
        client: &ConsoleClient,
        name: &str,
        category: ExtensionCategory,
    ) -> ConsoleResult<PolicyChange> {
        let mut candidate = self.policy.clone();
        if candidate.whitelist_remove(name, category) == PolicyChange::Unchanged {
            return Ok(PolicyChange::Unchanged);
        }

        client.replace_whitelist(&self.device_id, &candidate.whitelist_document()).await?;
        self.swap(candidate);

        tracing::info!("Removed '{}' ({}) from whitelist on {}", name.trim(), category, self.device_id);
        Ok(PolicyChange::Changed)
    }

    pub async fn add_to_blacklist(&mut self, client: &ConsoleClient, name: &str) -> ConsoleResult<PolicyChange> {
        let mut candidate = self.policy.clone();
        if candidate.blacklist_insert(name)? == PolicyChange::Unchanged {
            return Ok(PolicyChange::Unchanged);
        }

        client.replace_blacklist(&self.device_id, &candidate.blacklist_document()).await?;
        self.swap(candidate);

        tracing::info!("Blacklisted '{}' on {}", name.trim(), self.device_id);
        for (category, overlap) in self.policy.overlaps() {
            tracing::warn!("'{}' is both whitelisted ({}) and blacklisted on {}", overlap, category, self.device_id);
        }
        Ok(PolicyChange::Changed)
    }

    pub async fn remove_from_blacklist(&mut self, client: &ConsoleClient, name: &str) -> ConsoleResult<PolicyChange> {
        let mut candidate = self.policy.clone();
        if candidate.blacklist_remove(name) == PolicyChange::Unchanged {
            return Ok(PolicyChange::Unchanged);
        }

        client.replace_blacklist(&self.device_id, &candidate.blacklist_document()).await?;
        self.swap(candidate);

        tracing::info!("Removed '{}' from blacklist on {}", name.trim(), self.device_id);
        Ok(PolicyChange::Changed)
    }

    fn swap(&mut self, accepted: PolicySet) {
        self.policy = accepted;
        self.fetched_at = Some(Utc::now());
    }
}
