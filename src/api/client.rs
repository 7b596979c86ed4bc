//! Console API Client
//!
//! Typed view of the dashboard backend. Every method is one round trip;
//! nothing here caches or retries.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::routes::segment;
use super::transport::{ApiRequest, Transport};
use crate::error::ConsoleResult;
use crate::models::{AuditLogEntry, Device, Extension, PatchStatus, ServiceItem, SoftwareItem};

/// Wire shape of policy documents: category (or list) name to names.
pub type PolicyDocument = BTreeMap<String, Vec<String>>;

#[derive(Clone)]
pub struct ConsoleClient {
    transport: Arc<dyn Transport>,
}

impl ConsoleClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Raw call, used by the dispatcher for command endpoints.
    pub async fn send(&self, request: ApiRequest) -> ConsoleResult<Value> {
        self.transport.execute(request).await
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> ConsoleResult<T> {
        self.fetch(ApiRequest::get(path)).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ConsoleResult<T> {
        let value = self.transport.execute(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    // ---------------------------------------------------------------- devices

    pub async fn list_devices(&self) -> ConsoleResult<Vec<Device>> {
        self.get("/api/devices".to_string()).await
    }

    pub async fn device(&self, device_id: &str) -> ConsoleResult<Device> {
        self.get(format!("/api/devices/{}", segment(device_id))).await
    }

    pub async fn patch_status(&self, device_id: &str) -> ConsoleResult<PatchStatus> {
        self.get(format!("/api/devices/{}/actions/patch-status", segment(device_id))).await
    }

    // ------------------------------------------------------------- extensions

    pub async fn extensions(&self, device_id: &str) -> ConsoleResult<Vec<Extension>> {
        self.get(format!("/api/devices/{}/extensions", segment(device_id))).await
    }

    pub async fn whitelist(&self, device_id: &str) -> ConsoleResult<PolicyDocument> {
        self.get(format!("/api/devices/{}/extension-policy", segment(device_id))).await
    }

    /// Replace the whole whitelist document.
    pub async fn replace_whitelist(&self, device_id: &str, document: &PolicyDocument) -> ConsoleResult<()> {
        let path = format!("/api/devices/{}/extension-policy", segment(device_id));
        self.transport.execute(ApiRequest::post(path, json!(document))).await?;
        Ok(())
    }

    pub async fn blacklist(&self, device_id: &str) -> ConsoleResult<PolicyDocument> {
        self.get(format!("/api/devices/{}/extension-blacklist", segment(device_id))).await
    }

    /// Replace the whole blacklist document.
    pub async fn replace_blacklist(&self, device_id: &str, document: &PolicyDocument) -> ConsoleResult<()> {
        let path = format!("/api/devices/{}/extension-blacklist", segment(device_id));
        self.transport.execute(ApiRequest::post(path, json!(document))).await?;
        Ok(())
    }

    // --------------------------------------------------------------- software

    pub async fn software(&self, device_id: &str) -> ConsoleResult<Vec<SoftwareItem>> {
        self.get(format!("/api/devices/{}/software", segment(device_id))).await
    }

    pub async fn services(&self, device_id: &str) -> ConsoleResult<Vec<ServiceItem>> {
        self.get(format!("/api/devices/{}/services", segment(device_id))).await
    }

    // ------------------------------------------------------------------- logs

    pub async fn audit_logs(&self, device_id: &str) -> ConsoleResult<Vec<AuditLogEntry>> {
        self.fetch(ApiRequest::get("/api/audit-logs").with_query("device_id", device_id))
            .await
    }

    /// Latest actions across all devices.
    pub async fn command_log(&self) -> ConsoleResult<Vec<AuditLogEntry>> {
        self.get("/api/command-log".to_string()).await
    }
}
