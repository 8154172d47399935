// ABOUTME: Auto-fetch of configuration snippets pushed by the chat assistant
// ABOUTME: Applies a snippet only when its timestamp is newer than the last one applied

use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

use crate::deploy::CancelSignal;
use crate::error::DeployError;
use crate::remote::{DeployTransport, LatestSnippet};

pub const LATEST_PATH: &str = "/agent/latest";

#[derive(Debug, Default)]
pub struct SnippetWatcher {
    last_ts: f64,
}

impl SnippetWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_ts(&self) -> f64 {
        self.last_ts
    }

    /// Returns the code to apply, or `None` for stale, duplicate or empty snippets.
    pub fn offer(&mut self, snippet: LatestSnippet) -> Option<String> {
        let ts = snippet.ts?;
        let code = snippet.code.filter(|code| !code.is_empty())?;
        if ts > self.last_ts {
            self.last_ts = ts;
            Some(code)
        } else {
            None
        }
    }

    /// One fetch of the latest snippet. Failures of any kind yield `None`.
    pub async fn tick<T: DeployTransport + ?Sized>(
        &mut self,
        transport: &T,
        target: &Url,
    ) -> Option<String> {
        let reply = match transport.get(target).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Snippet fetch failed: {}", e);
                return None;
            }
        };
        if !reply.is_success() {
            debug!("Snippet endpoint returned {}", reply.status_line());
            return None;
        }
        let snippet: LatestSnippet = reply.json().ok()?;
        self.offer(snippet)
    }

    /// Fetch immediately, then every `interval`, until cancelled.
    pub async fn watch<T: DeployTransport + ?Sized>(
        &mut self,
        transport: &T,
        interval: Duration,
        mut cancel: CancelSignal,
        mut on_snippet: impl FnMut(&str),
    ) -> Result<(), DeployError> {
        let target = transport.base_url().join(LATEST_PATH).map_err(|e| {
            DeployError::Validation(format!("invalid snippet endpoint: {}", e))
        })?;
        info!("Watching {} for new snippets", target);

        while !cancel.is_cancelled() {
            if let Some(code) = self.tick(transport, &target).await {
                info!("Applying snippet from {}", self.last_ts);
                on_snippet(&code);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {}
            }
        }

        info!("Stopped watching for snippets");
        Ok(())
    }
}
