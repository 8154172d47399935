// ABOUTME: Library root for the Terraform deployment client
// ABOUTME: Exposes configuration, the HTTP transport, the deploy protocol and snippet auto-fetch

pub mod config;
pub mod deploy;
pub mod error;
pub mod remote;
pub mod snippets;

pub use config::{DeployConfig, FormEncoding};
pub use deploy::{DeployForm, Deployer, JobHandle};
pub use error::DeployError;
pub use remote::RemoteClient;
