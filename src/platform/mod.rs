//! Host camera backends
//!
//! With the `native` feature, [`NativeCameraSource`] opens local cameras
//! through `nokhwa`. Desktop drivers rarely report which way a sensor faces,
//! so the facing mode is inferred from the device name.

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::NativeCameraSource;

use crate::errors::AcquisitionError;
use crate::types::FacingMode;

const USER_FACING_HINTS: [&str; 5] = ["front", "user", "facetime", "integrated", "selfie"];
const ENVIRONMENT_FACING_HINTS: [&str; 4] = ["back", "rear", "environment", "world"];

/// Facing mode suggested by a device's human readable name
pub fn facing_from_name(name: &str) -> Option<FacingMode> {
    let lower = name.to_lowercase();
    if USER_FACING_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(FacingMode::User)
    } else if ENVIRONMENT_FACING_HINTS
        .iter()
        .any(|hint| lower.contains(hint))
    {
        Some(FacingMode::Environment)
    } else {
        None
    }
}

/// Classify a backend error message
pub fn classify_backend_error(message: &str) -> AcquisitionError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        AcquisitionError::PermissionDenied
    } else if lower.contains("busy") || lower.contains("in use") {
        AcquisitionError::Busy
    } else {
        AcquisitionError::Backend(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_from_name() {
        assert_eq!(
            facing_from_name("FaceTime HD Camera"),
            Some(FacingMode::User)
        );
        assert_eq!(
            facing_from_name("Integrated Webcam"),
            Some(FacingMode::User)
        );
        assert_eq!(
            facing_from_name("Rear Camera"),
            Some(FacingMode::Environment)
        );
        assert_eq!(facing_from_name("OBSBOT Tiny 4K"), None);
    }

    #[test]
    fn test_classify_backend_error() {
        assert_eq!(
            classify_backend_error("Permission denied (os error 13)"),
            AcquisitionError::PermissionDenied
        );
        assert_eq!(
            classify_backend_error("Device or resource busy"),
            AcquisitionError::Busy
        );
        assert!(matches!(
            classify_backend_error("unsupported format"),
            AcquisitionError::Backend(_)
        ));
    }
}
