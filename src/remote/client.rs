// ABOUTME: reqwest-backed client for the deployment backend
// ABOUTME: Sends trigger, status, snippet and generation requests

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use super::models::{
    first_message, GenerateRequest, GenerateResponse, HttpReply, ACK_MESSAGE_FIELDS,
};
use super::DeployTransport;
use crate::config::FormEncoding;
use crate::deploy::DeploymentRequest;
use crate::error::FetchError;

pub struct RemoteClient {
    client: Client,
    api_base_url: Url,
}

impl RemoteClient {
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let api_base_url = Url::parse(api_base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid backend URL '{}'", api_base_url))?;

        Ok(Self {
            client,
            api_base_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    /// Ask the backend to turn a plain-language description into configuration text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint("generate");
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                text: prompt.to_string(),
            })
            .send()
            .await
            .context("Failed to reach the generation endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| first_message(&value, ACK_MESSAGE_FIELDS))
                .unwrap_or(body);
            anyhow::bail!("Generation failed with status {}: {}", status, reason);
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse generation response")?;

        Ok(generated.terraform_code)
    }

    /// `POST /trigger-deploy` with the form body in the configured encoding.
    fn trigger_request(
        &self,
        request: &DeploymentRequest,
        encoding: FormEncoding,
    ) -> Result<reqwest::Request, FetchError> {
        let builder = self.client.post(self.endpoint("trigger-deploy"));
        let builder = match encoding {
            FormEncoding::Multipart => {
                let form = request
                    .form_fields()
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                builder.multipart(form)
            }
            FormEncoding::Urlencoded => builder.form(&request.form_fields()),
        };
        Ok(builder.build()?)
    }

    async fn read_reply(response: reqwest::Response) -> Result<HttpReply, FetchError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;
        Ok(HttpReply::new(status, body))
    }
}

#[async_trait]
impl DeployTransport for RemoteClient {
    fn base_url(&self) -> &Url {
        &self.api_base_url
    }

    async fn trigger(
        &self,
        request: &DeploymentRequest,
        encoding: FormEncoding,
    ) -> Result<HttpReply, FetchError> {
        let http_request = self.trigger_request(request, encoding)?;
        debug!("POST {} ({:?})", http_request.url(), encoding);

        let response = self.client.execute(http_request).await?;
        Self::read_reply(response).await
    }

    async fn get(&self, target: &Url) -> Result<HttpReply, FetchError> {
        debug!("GET {}", target);
        let response = self.client.get(target.clone()).send().await?;
        Self::read_reply(response).await
    }
}
