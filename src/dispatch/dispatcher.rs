//! Command Dispatcher
//!
//! Fire-and-forget from the caller's side: an `Ack` means the backend
//! queued the command for the device agent, nothing more. No retries.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::command::{Ack, Command, CommandState};
use super::guard::InFlightRegistry;
use crate::api::{route, ConsoleClient};
use crate::error::{ConsoleError, DispatchError};

pub struct CommandDispatcher {
    client: ConsoleClient,
    in_flight: InFlightRegistry,
    timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(client: ConsoleClient, timeout: Duration) -> Self {
        Self {
            client,
            in_flight: InFlightRegistry::new(),
            timeout,
        }
    }

    pub fn client(&self) -> &ConsoleClient {
        &self.client
    }

    pub fn is_in_flight(&self, command: &Command) -> bool {
        self.in_flight.is_in_flight(&command.resource_key())
    }

    /// Validate, route and send one command.
    ///
    /// Validation failures and in-flight conflicts are reported without
    /// touching the network.
    pub async fn dispatch(&self, command: &Command) -> Result<Ack, DispatchError> {
        let fail = |source: ConsoleError| DispatchError {
            device_id: command.device_id.clone(),
            action: command.action,
            target: command.target.clone(),
            source,
        };

        let request = route(command).map_err(fail)?;
        let _token = self.in_flight.try_acquire(command.resource_key()).map_err(fail)?;

        let request_id = Uuid::new_v4();
        tracing::debug!("[{}] {} ({} on {})", request_id, request, command.action, command.target);

        let outcome = tokio::time::timeout(self.timeout, self.client.send(request)).await;

        match outcome {
            Ok(Ok(response)) => {
                tracing::info!(
                    "Queued {} on {} for {} (request {})",
                    command.action,
                    command.target,
                    command.device_id,
                    request_id
                );
                Ok(Ack {
                    request_id,
                    device_id: command.device_id.clone(),
                    action: command.action,
                    target: command.target.clone(),
                    state: CommandState::Queued,
                    response,
                    queued_at: Utc::now(),
                })
            }
            Ok(Err(e)) => {
                let err = fail(e);
                tracing::warn!(
                    "Dispatch {} failed: {} (retry safe: {})",
                    request_id,
                    err.source,
                    err.is_retry_safe()
                );
                Err(err)
            }
            Err(_) => {
                let err = fail(ConsoleError::Timeout(self.timeout));
                tracing::warn!(
                    "Dispatch {} timed out after {:?} (retry safe: {})",
                    request_id,
                    self.timeout,
                    err.is_retry_safe()
                );
                Err(err)
            }
        }
    }
}
