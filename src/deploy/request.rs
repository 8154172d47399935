// ABOUTME: User input for a deployment and the job handle returned for it
// ABOUTME: Validation happens here, before anything touches the network

use reqwest::Url;

use crate::error::DeployError;

pub const MISSING_CONFIGURATION: &str = "Please paste Terraform code before deploying.";
pub const MISSING_CREDENTIAL: &str = "Please provide a DigitalOcean token before deploying.";
pub const LOADED_FROM_CHAT: &str = "Loaded code from chat.";

/// Editable form contents: the configuration text area and the token field.
#[derive(Debug, Clone, Default)]
pub struct DeployForm {
    pub configuration: String,
    pub credential: Option<String>,
}

impl DeployForm {
    pub fn new(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Chat bridge: replace the configuration text with a pushed snippet.
    pub fn load_from_chat(&mut self, code: &str) -> &'static str {
        self.configuration = code.to_string();
        LOADED_FROM_CHAT
    }
}

/// Validated, immutable payload for one trigger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    configuration: String,
    credential: Option<String>,
}

impl DeploymentRequest {
    pub fn from_form(form: &DeployForm, require_credential: bool) -> Result<Self, DeployError> {
        let configuration = form.configuration.trim();
        if configuration.is_empty() {
            return Err(DeployError::Validation(MISSING_CONFIGURATION.to_string()));
        }

        let credential = form
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        if require_credential && credential.is_none() {
            return Err(DeployError::Validation(MISSING_CREDENTIAL.to_string()));
        }

        Ok(Self {
            configuration: configuration.to_string(),
            credential,
        })
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Form fields as sent to `/trigger-deploy`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("tf_code", self.configuration.clone())];
        if let Some(token) = &self.credential {
            fields.push(("do_token", token.clone()));
        }
        fields
    }
}

/// Where to poll for a submitted job: an absolute URL or an origin-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(String);

impl JobHandle {
    /// `None` for an empty reference.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against the backend origin into the URL every poll will hit.
    pub fn resolve(&self, base: &Url) -> Result<Url, DeployError> {
        base.join(self.0.trim()).map_err(|e| {
            DeployError::Submission(format!("invalid status_url '{}': {}", self.0, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_configuration_is_rejected() {
        for text in ["", "   ", "\n\t  \n"] {
            let err = DeploymentRequest::from_form(&DeployForm::new(text), false).unwrap_err();
            assert_eq!(err, DeployError::Validation(MISSING_CONFIGURATION.to_string()));
        }
    }

    #[test]
    fn test_configuration_is_trimmed() {
        let form = DeployForm::new("\n resource \"x\" {}\n");
        let request = DeploymentRequest::from_form(&form, false).unwrap();
        assert_eq!(request.configuration(), "resource \"x\" {}");
        assert_eq!(request.credential(), None);
    }

    #[test]
    fn test_required_credential() {
        let form = DeployForm::new("resource {}").with_credential("  ");
        let err = DeploymentRequest::from_form(&form, true).unwrap_err();
        assert_eq!(err, DeployError::Validation(MISSING_CREDENTIAL.to_string()));

        let form = DeployForm::new("resource {}").with_credential("dop_v1_abc");
        let request = DeploymentRequest::from_form(&form, true).unwrap();
        assert_eq!(request.credential(), Some("dop_v1_abc"));
    }

    #[test]
    fn test_form_fields_include_credential_only_when_present() {
        let request = DeploymentRequest::from_form(&DeployForm::new("a"), false).unwrap();
        assert_eq!(request.form_fields(), vec![("tf_code", "a".to_string())]);

        let form = DeployForm::new("a").with_credential("t");
        let request = DeploymentRequest::from_form(&form, false).unwrap();
        assert_eq!(
            request.form_fields(),
            vec![("tf_code", "a".to_string()), ("do_token", "t".to_string())]
        );
    }

    #[test]
    fn test_chat_bridge_replaces_configuration() {
        let mut form = DeployForm::new("old");
        assert_eq!(form.load_from_chat("new"), LOADED_FROM_CHAT);
        assert_eq!(form.configuration, "new");
    }

    #[test]
    fn test_empty_handle() {
        assert!(JobHandle::new("").is_none());
        assert!(JobHandle::new("  ").is_none());
    }

    #[test]
    fn test_relative_and_absolute_handles_resolve_alike() {
        let base = Url::parse("https://deploy.example.com").unwrap();
        let relative = JobHandle::new("/status/42").unwrap().resolve(&base).unwrap();
        let absolute = JobHandle::new("https://deploy.example.com/status/42")
            .unwrap()
            .resolve(&base)
            .unwrap();
        assert_eq!(relative, absolute);
        assert_eq!(relative.as_str(), "https://deploy.example.com/status/42");
    }

    #[test]
    fn test_absolute_handle_on_other_origin_is_kept() {
        let base = Url::parse("https://deploy.example.com").unwrap();
        let url = JobHandle::new("https://jobs.example.net/s/1")
            .unwrap()
            .resolve(&base)
            .unwrap();
        assert_eq!(url.as_str(), "https://jobs.example.net/s/1");
    }
}
