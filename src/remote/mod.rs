// ABOUTME: HTTP plumbing between the deployment client and its backend
// ABOUTME: Defines the transport seam the protocol code is written against

pub mod client;
pub mod models;

use async_trait::async_trait;
use reqwest::Url;

use crate::config::FormEncoding;
use crate::deploy::DeploymentRequest;
use crate::error::FetchError;

pub use client::RemoteClient;
pub use models::{HttpReply, JobStatus, LatestSnippet, StatusState};

/// Raw request/reply exchange with the backend. Replies are returned whatever
/// their status code; only failures to get a reply at all are errors.
#[async_trait]
pub trait DeployTransport: Send + Sync {
    /// Origin that relative job handles are resolved against.
    fn base_url(&self) -> &Url;

    /// `POST /trigger-deploy`.
    async fn trigger(
        &self,
        request: &DeploymentRequest,
        encoding: FormEncoding,
    ) -> Result<HttpReply, FetchError>;

    async fn get(&self, target: &Url) -> Result<HttpReply, FetchError>;
}
