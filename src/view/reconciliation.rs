//! Reconciliation View
//!
//! Explicit per-device state container. Holds the last-fetched
//! collections, applies the optimistic effect of a successful dispatch,
//! and tracks which collections need an authoritative re-fetch.
//!
//! Local effects after an `Ack`:
//! - uninstall / kill / remove: the item is dropped from the local
//!   collection immediately
//! - service start / stop / restart / disable / delete: nothing changes
//!   locally; the service collection is marked stale until `reconcile`
//! - device actions: no local effect

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::{self, ExtensionQuery, InventoryQuery, InventorySelection};
use crate::api::ConsoleClient;
use crate::dispatch::{Ack, Action, Command, CommandDispatcher, Target};
use crate::error::{ConsoleError, ConsoleResult, DispatchError};
use crate::models::{name_key, Extension, ProcessItem, ServiceItem, SoftwareItem};
use crate::policy::{classify, classify_all, Classification, PolicyStore};

/// Max acknowledgements kept per view.
pub const MAX_HISTORY: usize = 500;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Extensions,
    Software,
    Services,
}

/// What a successful dispatch did to the local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", content = "detail", rename_all = "snake_case")]
pub enum LocalEffect {
    /// Items removed optimistically.
    Removed { collection: Collection, count: usize },
    /// Local copy left as-is, awaiting re-fetch.
    RefetchPending(Collection),
    None,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub ack: Ack,
    pub effect: LocalEffect,
    /// Set when the follow-up re-fetch failed; the collection stays stale.
    pub refetch_error: Option<ConsoleError>,
}

// ============================================================================
// DEVICE VIEW
// ============================================================================

pub struct DeviceView {
    device_id: String,
    extensions: Vec<Extension>,
    software: Vec<SoftwareItem>,
    services: Vec<ServiceItem>,
    policy: PolicyStore,
    stale: BTreeSet<Collection>,
    history: VecDeque<Ack>,
    synced_at: Option<DateTime<Utc>>,
}

impl DeviceView {
    pub fn new(device_id: impl Into<String>) -> Self {
        let device_id = device_id.into();
        Self {
            policy: PolicyStore::new(device_id.clone()),
            device_id,
            extensions: Vec::new(),
            software: Vec::new(),
            services: Vec::new(),
            stale: [Collection::Extensions, Collection::Software, Collection::Services]
                .into_iter()
                .collect(),
            history: VecDeque::new(),
            synced_at: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn software(&self) -> &[SoftwareItem] {
        &self.software
    }

    /// Software entries the agent reported as processes.
    pub fn processes(&self) -> Vec<&ProcessItem> {
        self.software.iter().filter(|s| s.is_process()).collect()
    }

    pub fn services(&self) -> &[ServiceItem] {
        &self.services
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Policy edits go through the store, which round-trips every change.
    pub fn policy_mut(&mut self) -> &mut PolicyStore {
        &mut self.policy
    }

    /// Acknowledged commands, oldest first. Every entry is `Queued`.
    pub fn history(&self) -> impl Iterator<Item = &Ack> {
        self.history.iter()
    }

    pub fn is_stale(&self, collection: Collection) -> bool {
        self.stale.contains(&collection)
    }

    pub fn stale_collections(&self) -> Vec<Collection> {
        self.stale.iter().copied().collect()
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    // ------------------------------------------------------------------ fetch

    /// Load every collection and the policy. All or nothing: on error the
    /// previously held state is kept.
    pub async fn mount(&mut self, client: &ConsoleClient) -> ConsoleResult<()> {
        let device_id = self.device_id.as_str();
        let (extensions, software, services) = tokio::try_join!(
            client.extensions(device_id),
            client.software(device_id),
            client.services(device_id),
        )?;
        self.policy.refresh(client).await?;

        self.extensions = extensions;
        self.software = software;
        self.services = services;
        self.stale.clear();
        self.synced_at = Some(Utc::now());

        tracing::info!(
            "Mounted {}: {} extensions, {} software, {} services",
            self.device_id,
            self.extensions.len(),
            self.software.len(),
            self.services.len()
        );
        Ok(())
    }

    /// Replace one collection with backend truth.
    pub async fn refresh(&mut self, client: &ConsoleClient, collection: Collection) -> ConsoleResult<()> {
        match collection {
            Collection::Extensions => self.extensions = client.extensions(&self.device_id).await?,
            Collection::Software => self.software = client.software(&self.device_id).await?,
            Collection::Services => self.services = client.services(&self.device_id).await?,
        }
        self.stale.remove(&collection);
        self.synced_at = Some(Utc::now());

        tracing::debug!("Refreshed {:?} for {}", collection, self.device_id);
        Ok(())
    }

    /// Re-fetch every collection marked stale. Stops at the first failure,
    /// leaving that collection (and any after it) marked.
    pub async fn reconcile(&mut self, client: &ConsoleClient) -> ConsoleResult<Vec<Collection>> {
        let pending = self.stale_collections();
        for collection in &pending {
            self.refresh(client, *collection).await?;
        }
        Ok(pending)
    }

    // --------------------------------------------------------------- classify

    pub fn classified_extensions(&self) -> Vec<(&Extension, Classification)> {
        classify_all(&self.extensions, self.policy.policy())
    }

    pub fn non_compliant(&self) -> Vec<&Extension> {
        self.extensions
            .iter()
            .filter(|e| !classify(e, self.policy.policy()).is_compliant())
            .collect()
    }

    pub fn filtered_extensions(&self, query: &ExtensionQuery) -> Vec<&Extension> {
        filter::filter_extensions(&self.extensions, self.policy.policy(), query)
    }

    pub fn filtered_inventory(&self, query: &InventoryQuery) -> InventorySelection<'_> {
        filter::filter_inventory(&self.software, &self.services, query)
    }

    // --------------------------------------------------------------- dispatch

    /// Dispatch a command for this device and apply its local effect.
    ///
    /// A failed dispatch leaves every collection untouched.
    pub async fn dispatch(
        &mut self,
        dispatcher: &CommandDispatcher,
        command: &Command,
    ) -> Result<DispatchOutcome, DispatchError> {
        if command.device_id != self.device_id {
            return Err(DispatchError {
                device_id: command.device_id.clone(),
                action: command.action,
                target: command.target.clone(),
                source: ConsoleError::Validation(format!("command is not for device {}", self.device_id)),
            });
        }

        let ack = dispatcher.dispatch(command).await?;
        let effect = self.apply(command);
        self.record(ack.clone());

        Ok(DispatchOutcome {
            ack,
            effect,
            refetch_error: None,
        })
    }

    /// `dispatch` followed by the re-fetch it calls for. A failed re-fetch
    /// is reported in `refetch_error` and the collection stays stale; the
    /// ack still stands.
    pub async fn dispatch_and_reconcile(
        &mut self,
        dispatcher: &CommandDispatcher,
        command: &Command,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut outcome = self.dispatch(dispatcher, command).await?;

        if let LocalEffect::RefetchPending(collection) = outcome.effect {
            if let Err(e) = self.refresh(dispatcher.client(), collection).await {
                tracing::warn!("Re-fetch of {:?} for {} failed: {}", collection, self.device_id, e);
                outcome.refetch_error = Some(e);
            }
        }
        Ok(outcome)
    }

    fn apply(&mut self, command: &Command) -> LocalEffect {
        match (&command.target, command.action) {
            (Target::Software(name), Action::Uninstall) => {
                let key = name_key(name);
                let before = self.software.len();
                self.software.retain(|s| name_key(&s.name) != key);
                removed(Collection::Software, before - self.software.len())
            }
            (Target::Process(name), Action::Kill) => {
                let key = name_key(name);
                let before = self.software.len();
                self.software.retain(|s| !(s.is_killable() && name_key(&s.name) == key));
                removed(Collection::Software, before - self.software.len())
            }
            (Target::Extension(name), Action::Remove) => {
                let key = name_key(name);
                let before = self.extensions.len();
                self.extensions.retain(|e| e.key() != key);
                removed(Collection::Extensions, before - self.extensions.len())
            }
            (Target::Service(_), _) => {
                self.stale.insert(Collection::Services);
                LocalEffect::RefetchPending(Collection::Services)
            }
            _ => LocalEffect::None,
        }
    }

    fn record(&mut self, ack: Ack) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(ack);
    }
}

fn removed(collection: Collection, count: usize) -> LocalEffect {
    LocalEffect::Removed { collection, count }
}
