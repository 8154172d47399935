// ABOUTME: Error types for the submit-and-poll deployment protocol
// ABOUTME: Every variant renders as the text shown after "Deployment failed:"

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// Local input was rejected; no request was sent.
    Validation(String),
    /// The trigger endpoint refused the job or acknowledged it without a handle.
    Submission(String),
    /// The backend reported a terminal `error` status.
    Deployment(String),
    Timeout,
    Cancelled,
    /// Another submission is still being tracked for this form.
    Busy,
}

impl DeployError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DeployError::Validation(_))
    }
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeployError::Validation(msg) => write!(f, "{}", msg),
            DeployError::Submission(msg) => write!(f, "{}", msg),
            DeployError::Deployment(msg) => write!(f, "{}", msg),
            DeployError::Timeout => write!(f, "Timed out waiting for deployment status"),
            DeployError::Cancelled => write!(f, "deployment tracking cancelled"),
            DeployError::Busy => write!(f, "a deployment is already being tracked"),
        }
    }
}

impl std::error::Error for DeployError {}

/// A single request that never produced a usable reply.
///
/// While polling these are transient and swallowed; during submission they
/// become a [`DeployError::Submission`].
#[derive(Debug)]
pub enum FetchError {
    Network(String),
    Body(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {}", msg),
            FetchError::Body(msg) => write!(f, "failed to read response body: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            DeployError::Timeout.to_string(),
            "Timed out waiting for deployment status"
        );
    }

    #[test]
    fn test_deployment_message_is_verbatim() {
        let err = DeployError::Deployment("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
