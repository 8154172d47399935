// ABOUTME: Submit-and-poll deployment protocol
// ABOUTME: Validates form input, triggers a job once and tracks it to a terminal state

pub mod cancel;
pub mod poller;
pub mod request;
pub mod session;
pub mod status;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use poller::Poller;
pub use request::{DeployForm, DeploymentRequest, JobHandle};
pub use session::{DeploySession, Deployer};
pub use status::{format_status, ConsoleStatus, Phase, StatusLine, StatusSink};
pub use submitter::Submitter;
