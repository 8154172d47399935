// ABOUTME: Sends one deployment request to the trigger endpoint
// ABOUTME: Turns the acknowledgement into a job handle or a submission error

use serde_json::Value;
use tracing::{info, warn};

use super::request::{DeploymentRequest, JobHandle};
use crate::config::{DeployConfig, FormEncoding};
use crate::error::DeployError;
use crate::remote::models::{first_message, HttpReply, ACK_MESSAGE_FIELDS};
use crate::remote::DeployTransport;

pub struct Submitter<'a, T: DeployTransport + ?Sized> {
    transport: &'a T,
    encoding: FormEncoding,
    accept_any_success: bool,
}

impl<'a, T: DeployTransport + ?Sized> Submitter<'a, T> {
    pub fn new(transport: &'a T, config: &DeployConfig) -> Self {
        Self {
            transport,
            encoding: config.encoding,
            accept_any_success: config.accept_any_success,
        }
    }

    /// Exactly one trigger call; never retried.
    pub async fn submit(&self, request: &DeploymentRequest) -> Result<JobHandle, DeployError> {
        let reply = self
            .transport
            .trigger(request, self.encoding)
            .await
            .map_err(|e| {
                warn!("Trigger request failed: {}", e);
                DeployError::Submission(e.to_string())
            })?;

        let handle = interpret_acknowledgement(&reply, self.accept_any_success)?;
        info!("Deployment accepted, status at {}", handle.as_str());
        Ok(handle)
    }
}

/// Accepted means 202 (or any 2xx when `accept_any_success`) together with a
/// non-empty `status_url`. Anything else is rejected with the body's `error`,
/// then `message`, then the status line.
pub fn interpret_acknowledgement(
    reply: &HttpReply,
    accept_any_success: bool,
) -> Result<JobHandle, DeployError> {
    let body: Option<Value> = reply.json().ok();

    let accepted = if accept_any_success {
        reply.is_success()
    } else {
        reply.status == 202
    };

    let handle = body
        .as_ref()
        .and_then(|body| body.get("status_url"))
        .and_then(Value::as_str)
        .and_then(JobHandle::new);

    match handle {
        Some(handle) if accepted => Ok(handle),
        _ => {
            let message = body
                .as_ref()
                .and_then(|body| first_message(body, ACK_MESSAGE_FIELDS))
                .unwrap_or_else(|| reply.status_line());
            warn!(
                "Trigger endpoint rejected deployment ({}): {}",
                reply.status, message
            );
            Err(DeployError::Submission(message))
        }
    }
}
