//! Endpoint routing
//!
//! Maps a validated command onto the backend endpoint that queues it.
//! Every entry point goes through here so routing is uniform.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::json;

use super::transport::{ApiRequest, Method};
use crate::dispatch::{Action, Command, CommandPayload, KillMode, Target};
use crate::error::{ConsoleError, ConsoleResult};

/// Build the request that queues `command` on the backend.
pub fn route(command: &Command) -> ConsoleResult<ApiRequest> {
    command.validate()?;

    let device = segment(&command.device_id);

    let request = match &command.target {
        Target::Device => match command.action {
            Action::Patch => ApiRequest::new(Method::Post, format!("/api/devices/{}/actions/patch-system", device)),
            Action::EnableUsb => {
                let minutes = match command.payload {
                    Some(CommandPayload::DurationMinutes(m)) => m,
                    _ => {
                        return Err(ConsoleError::Validation(
                            "enable-usb requires a duration in minutes".to_string(),
                        ))
                    }
                };
                ApiRequest::new(Method::Post, format!("/api/devices/{}/action/enable-usb", device))
                    .with_body(json!({ "duration": minutes }))
            }
            action => ApiRequest::new(
                Method::Post,
                format!("/api/devices/{}/action/{}", device, action.as_str()),
            ),
        },
        Target::Software(name) => ApiRequest::new(
            Method::Delete,
            format!("/api/devices/{}/software/{}", device, segment(name)),
        ),
        Target::Extension(name) => ApiRequest::new(
            Method::Delete,
            format!("/api/devices/{}/extensions/{}", device, segment(name)),
        ),
        Target::Process(name) => {
            let mode = match command.payload {
                Some(CommandPayload::KillMode(mode)) => mode,
                _ => KillMode::default(),
            };
            ApiRequest::new(
                Method::Post,
                format!("/api/devices/{}/processes/{}/kill", device, segment(name)),
            )
            .with_body(json!({ "mode": mode }))
        }
        Target::Service(name) => ApiRequest::new(
            Method::Post,
            format!("/api/devices/{}/services/{}/{}", device, segment(name), command.action.as_str()),
        ),
    };

    Ok(request)
}

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Percent-encode a single path segment.
pub fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}
