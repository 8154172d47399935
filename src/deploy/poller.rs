// ABOUTME: Polls a job's status endpoint until it reaches a terminal state
// ABOUTME: Tolerates flaky status replies; gives up after the configured wait

use reqwest::Url;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::cancel::CancelSignal;
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::remote::{DeployTransport, JobStatus, StatusState};

pub struct Poller<'a, T: DeployTransport + ?Sized> {
    transport: &'a T,
    interval: Duration,
    max_wait: Duration,
}

impl<'a, T: DeployTransport + ?Sized> Poller<'a, T> {
    pub fn new(transport: &'a T, config: &DeployConfig) -> Self {
        Self::with_timing(transport, config.poll_interval(), config.max_wait())
    }

    pub fn with_timing(transport: &'a T, interval: Duration, max_wait: Duration) -> Self {
        Self {
            transport,
            interval,
            max_wait,
        }
    }

    /// Fetch `target` every `interval` until `done` or `error`.
    ///
    /// One request is in flight at a time and `callback` sees each parsed
    /// snapshot in fetch order. The wait budget is checked before every fetch,
    /// so the loop never ends with a timeout before `max_wait` has elapsed.
    pub async fn poll_until_complete(
        &self,
        target: &Url,
        cancel: &mut CancelSignal,
        mut callback: impl FnMut(&JobStatus),
    ) -> Result<JobStatus, DeployError> {
        let started = Instant::now();

        loop {
            if started.elapsed() >= self.max_wait {
                warn!("No terminal status from {} after {:?}", target, self.max_wait);
                return Err(DeployError::Timeout);
            }
            if cancel.is_cancelled() {
                info!("Stopped tracking {}", target);
                return Err(DeployError::Cancelled);
            }

            if let Some(status) = self.fetch(target).await {
                callback(&status);

                match status.state() {
                    StatusState::Done => {
                        info!("Deployment finished");
                        return Ok(status);
                    }
                    StatusState::Error => {
                        let reason = status.failure_reason();
                        warn!("Deployment failed: {}", reason);
                        return Err(DeployError::Deployment(reason));
                    }
                    state => debug!("Deployment still {}", state),
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    /// `None` for anything that is not a 2xx JSON body.
    async fn fetch(&self, target: &Url) -> Option<JobStatus> {
        let reply = match self.transport.get(target).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Status fetch failed, will retry: {}", e);
                return None;
            }
        };

        if !reply.is_success() {
            warn!("Status endpoint returned {}, will retry", reply.status_line());
            return None;
        }

        match JobStatus::parse(&reply.body) {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Unparseable status body, will retry: {}", e);
                None
            }
        }
    }
}
