// ABOUTME: Ties submitter, poller and status surface together for one form
// ABOUTME: Only one submission per form is tracked at a time; extra ones are rejected

use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::cancel::{cancel_pair, CancelHandle, CancelSignal};
use super::poller::Poller;
use super::request::{DeployForm, DeploymentRequest, JobHandle};
use super::status::{Phase, StatusSink};
use super::submitter::Submitter;
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::remote::{DeployTransport, JobStatus};

/// State of one submission, from accepted handle to terminal status.
pub struct DeploySession {
    handle: JobHandle,
    target: Url,
    last_seen: Option<JobStatus>,
    cancel: CancelSignal,
}

impl DeploySession {
    /// Resolves the handle once; every poll reuses the result.
    pub fn open(handle: JobHandle, base: &Url, cancel: CancelSignal) -> Result<Self, DeployError> {
        let target = handle.resolve(base)?;
        Ok(Self {
            handle,
            target,
            last_seen: None,
            cancel,
        })
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn last_seen(&self) -> Option<&JobStatus> {
        self.last_seen.as_ref()
    }

    pub async fn track<T: DeployTransport + ?Sized>(
        &mut self,
        poller: &Poller<'_, T>,
        status: &dyn StatusSink,
    ) -> Result<JobStatus, DeployError> {
        let last_seen = &mut self.last_seen;
        poller
            .poll_until_complete(&self.target, &mut self.cancel, |snapshot| {
                let state = snapshot.state();
                let changed = last_seen.as_ref().map(JobStatus::state) != Some(state.clone());
                if changed && !state.is_terminal() {
                    status.show(&Phase::Progress(state));
                }
                *last_seen = Some(snapshot.clone());
            })
            .await
    }
}

/// One deployment form: its backend, settings and status surface.
pub struct Deployer {
    transport: Arc<dyn DeployTransport>,
    status: Arc<dyn StatusSink>,
    config: DeployConfig,
    active: AtomicBool,
    cancel: Mutex<Option<CancelHandle>>,
}

struct ActiveGuard<'a> {
    deployer: &'a Deployer,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut cancel) = self.deployer.cancel.lock() {
            cancel.take();
        }
        self.deployer.active.store(false, Ordering::SeqCst);
    }
}

impl Deployer {
    pub fn new(
        transport: Arc<dyn DeployTransport>,
        status: Arc<dyn StatusSink>,
        config: DeployConfig,
    ) -> Self {
        Self {
            transport,
            status,
            config,
            active: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop polling the active session. A request already in flight completes.
    pub fn cancel(&self) {
        if let Ok(cancel) = self.cancel.lock() {
            if let Some(handle) = cancel.as_ref() {
                handle.cancel();
            }
        }
    }

    /// Validate, submit once, then poll to a terminal state.
    pub async fn submit(&self, form: &DeployForm) -> Result<JobStatus, DeployError> {
        let (_guard, signal) = self.begin()?;
        let result = self.run_submission(form, signal).await;
        self.report(&result);
        result
    }

    /// Poll a job submitted elsewhere.
    pub async fn track(&self, handle: JobHandle) -> Result<JobStatus, DeployError> {
        let (_guard, signal) = self.begin()?;
        self.status.show(&Phase::Started);
        let result = self.run_tracking(handle, signal).await;
        self.report(&result);
        result
    }

    fn begin(&self) -> Result<(ActiveGuard<'_>, CancelSignal), DeployError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected submission while another deployment is tracked");
            return Err(DeployError::Busy);
        }
        let guard = ActiveGuard { deployer: self };

        let (handle, signal) = cancel_pair();
        if let Ok(mut cancel) = self.cancel.lock() {
            *cancel = Some(handle);
        }
        Ok((guard, signal))
    }

    async fn run_submission(
        &self,
        form: &DeployForm,
        signal: CancelSignal,
    ) -> Result<JobStatus, DeployError> {
        let request = DeploymentRequest::from_form(form, self.config.require_credential)?;

        self.status.show(&Phase::Submitting);
        let handle = Submitter::new(self.transport.as_ref(), &self.config)
            .submit(&request)
            .await?;

        self.status.show(&Phase::Started);
        self.run_tracking(handle, signal).await
    }

    async fn run_tracking(
        &self,
        handle: JobHandle,
        signal: CancelSignal,
    ) -> Result<JobStatus, DeployError> {
        let mut session = DeploySession::open(handle, self.transport.base_url(), signal)?;
        info!("Tracking deployment at {}", session.target());

        let poller = Poller::new(self.transport.as_ref(), &self.config);
        session.track(&poller, self.status.as_ref()).await
    }

    fn report(&self, result: &Result<JobStatus, DeployError>) {
        let phase = match result {
            Ok(status) => Phase::Succeeded(status.message.clone()),
            Err(DeployError::Validation(message)) => Phase::Invalid(message.clone()),
            Err(err) => Phase::Failed(err.to_string()),
        };
        self.status.show(&phase);
    }
}
