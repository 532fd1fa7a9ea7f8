//! Service Module
//!
//! Job processing for the orchestrator: dispatch, the per-job worker and the
//! steps it drives through the automation driver.

pub mod dispatcher;
pub mod error;
pub mod generation;
pub mod locks;
pub mod login;
pub mod notifier;
pub mod playbook;
pub mod poller;
pub mod registry;
pub mod retry;
pub mod secrets;
pub mod worker;
pub mod workspace;

#[cfg(test)]
pub mod testing;

// Re-export for convenience
pub use dispatcher::{DispatchError, Dispatcher, spawn_worker_pool};
pub use error::AutomationError;
pub use notifier::{CallbackNotifier, HttpCallbackNotifier};
pub use playbook::SitePlaybook;
pub use registry::ActiveJobs;
pub use secrets::{EnvFileSecretResolver, SecretResolver, SecretSource};
pub use worker::{Collaborators, JobRunner};
