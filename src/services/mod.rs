//! External collaborators of the verification workflow
//!
//! The age classifier, the persistence endpoint and the post-verification
//! navigation are all owned by the host. The controller only talks to them
//! through these traits.

#[cfg(feature = "http")]
pub mod http;

use crate::types::{CapturedImage, PersistRequest};
use anyhow::Result;

#[cfg(feature = "http")]
pub use http::{HttpClassifier, HttpPersistence};

/// Age classification service
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// Estimate the subject's age from a still image
    async fn classify(&self, image: &CapturedImage) -> Result<u32>;
}

/// Storage for accepted verifications
#[async_trait::async_trait]
pub trait Persistence: Send + Sync {
    async fn persist(&self, request: PersistRequest) -> Result<()>;
}

/// Redirect invoked once a verification succeeds
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

/// Navigator that only logs the redirect
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, destination: &str) {
        log::info!("Navigating to {}", destination);
    }
}
