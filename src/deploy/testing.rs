// ABOUTME: Scripted transport used by the protocol tests
// ABOUTME: Replays canned replies and records every request it sees

use async_trait::async_trait;
use reqwest::Url;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

use super::request::DeploymentRequest;
use crate::config::FormEncoding;
use crate::error::FetchError;
use crate::remote::{DeployTransport, HttpReply};

pub const TEST_ORIGIN: &str = "http://deploy.test";

type Scripted = Result<HttpReply, String>;

pub struct ScriptedTransport {
    base: Url,
    trigger: Mutex<Option<Scripted>>,
    replies: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<HttpReply>>,
    triggers: Mutex<Vec<(DeploymentRequest, FormEncoding)>>,
    gets: Mutex<Vec<(Url, Instant)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            base: Url::parse(TEST_ORIGIN).unwrap(),
            trigger: Mutex::new(None),
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            triggers: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn with_trigger(self, reply: HttpReply) -> Self {
        *self.trigger.lock().unwrap() = Some(Ok(reply));
        self
    }

    pub fn with_trigger_failure(self, error: &str) -> Self {
        *self.trigger.lock().unwrap() = Some(Err(error.to_string()));
        self
    }

    /// Queue a 200 reply carrying `body`.
    pub fn then_body(self, body: &str) -> Self {
        self.then_reply(HttpReply::new(200, body))
    }

    pub fn then_reply(self, reply: HttpReply) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn then_failure(self, error: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(error.to_string()));
        self
    }

    /// Reply served once the queue is exhausted.
    pub fn otherwise(self, reply: HttpReply) -> Self {
        *self.fallback.lock().unwrap() = Some(reply);
        self
    }

    pub fn trigger_calls(&self) -> usize {
        self.triggers.lock().unwrap().len()
    }

    pub fn last_encoding(&self) -> Option<FormEncoding> {
        self.triggers.lock().unwrap().last().map(|(_, enc)| *enc)
    }

    pub fn get_targets(&self) -> Vec<Url> {
        self.gets.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn get_times(&self) -> Vec<Instant> {
        self.gets.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl DeployTransport for ScriptedTransport {
    fn base_url(&self) -> &Url {
        &self.base
    }

    async fn trigger(
        &self,
        request: &DeploymentRequest,
        encoding: FormEncoding,
    ) -> Result<HttpReply, FetchError> {
        self.triggers
            .lock()
            .unwrap()
            .push((request.clone(), encoding));
        match self.trigger.lock().unwrap().clone() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(error)) => Err(FetchError::Network(error)),
            None => Err(FetchError::Network("no trigger reply scripted".to_string())),
        }
    }

    async fn get(&self, target: &Url) -> Result<HttpReply, FetchError> {
        self.gets
            .lock()
            .unwrap()
            .push((target.clone(), Instant::now()));
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(error)) => Err(FetchError::Network(error)),
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| FetchError::Network("script exhausted".to_string())),
        }
    }
}
