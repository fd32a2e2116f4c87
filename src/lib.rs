//! CrabGate: camera and upload driven age verification
//!
//! This crate drives a single verification flow: acquire a facial photo from
//! a live camera or an uploaded file, validate it, submit it to an external
//! age classifier and, when the estimated age falls inside the accepted
//! range, persist the result and redirect the user onward.
//!
//! # Features
//! - Explicit, serializable workflow state with a pure transition function
//! - Exclusive camera ownership with guaranteed release on every exit path
//! - Upload validation before any decoding or network access
//! - Classifier, persistence and navigation behind async traits
//! - Optional HTTP adapters (`http`, on by default) and native cameras (`native`)
//!
//! # Usage
//! ```rust,ignore
//! use crabgate::{GateConfig, VerificationController};
//! use crabgate::platform::NativeCameraSource;
//! use crabgate::services::LogNavigator;
//! use std::sync::Arc;
//!
//! let config = GateConfig::load_or_default();
//! let camera = Arc::new(NativeCameraSource::from_config(&config.capture));
//! let controller =
//!     VerificationController::with_http_services(config, camera, Arc::new(LogNavigator))?;
//!
//! controller.start_camera().await?;
//! controller.capture_from_stream().await?;
//! let verdict = controller.submit().await?;
//! ```
pub mod capture;
pub mod config;
pub mod device;
pub mod errors;
pub mod invariant_ppt;
pub mod platform;
pub mod services;
pub mod types;
pub mod validation;
pub mod workflow;

// Testing utilities - synthetic data and mock collaborators
pub mod testing;

// Re-exports for convenience
pub use config::GateConfig;
pub use device::{CameraSource, DeviceManager, MediaStream};
pub use errors::{AcquisitionError, TransitionError, ValidationError, VerifyError};
pub use services::{Classifier, Navigator, Persistence};
pub use types::{CapturedImage, FacingMode, ImageOrigin, RawFrame, UploadedFile};
pub use validation::{validate, MAX_UPLOAD_BYTES};
pub use workflow::{Event, Phase, Verdict, VerificationController, WorkflowState};

/// Initialize logging for the verification flow
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabgate=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        features: enabled_features(),
    }
}

fn enabled_features() -> Vec<String> {
    let mut features = Vec::new();
    if cfg!(feature = "http") {
        features.push("http".to_string());
    }
    if cfg!(feature = "native") {
        features.push("native".to_string());
    }
    features
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
}
