use thiserror::Error;

use crate::workflow::Phase;

/// Why the camera stream could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    NoDevice,
    #[error("camera is in use by another application")]
    Busy,
    #[error("no camera with the requested facing mode")]
    FacingUnavailable,
    #[error("camera backend error: {0}")]
    Backend(String),
}

/// Upload constraint that a selected file violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("file type '{declared_type}' is not an image")]
    NotAnImage { declared_type: String },
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Device acquisition error: {0}")]
    DeviceAcquisition(#[from] AcquisitionError),
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Classification error: {0}")]
    Classification(String),
    #[error("Detected age {age} is outside the accepted range {min}-{max}")]
    OutOfRange { age: u32, min: u32, max: u32 },
    #[error("verification is in progress")]
    Busy,
    #[error("controller has been disposed")]
    Disposed,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    InvalidTransition(TransitionError),
}

impl From<TransitionError> for VerifyError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Busy => VerifyError::Busy,
            other => VerifyError::InvalidTransition(other),
        }
    }
}

impl VerifyError {
    /// Text shown to the user when this error is attached to the workflow.
    pub fn user_message(&self) -> String {
        match self {
            VerifyError::DeviceAcquisition(AcquisitionError::PermissionDenied) => {
                "Unable to access camera. Please allow camera permissions and try again."
                    .to_string()
            }
            VerifyError::DeviceAcquisition(AcquisitionError::NoDevice)
            | VerifyError::DeviceAcquisition(AcquisitionError::FacingUnavailable) => {
                "No camera was found. You can upload a photo instead.".to_string()
            }
            VerifyError::DeviceAcquisition(AcquisitionError::Busy) => {
                "The camera is being used by another application.".to_string()
            }
            VerifyError::DeviceAcquisition(AcquisitionError::Backend(_)) => {
                "Unable to access camera. Please check permissions.".to_string()
            }
            VerifyError::Capture(_) => "Failed to capture photo. Please try again.".to_string(),
            VerifyError::Validation(ValidationError::NotAnImage { .. }) => {
                "Please upload an image file.".to_string()
            }
            VerifyError::Validation(ValidationError::TooLarge { .. }) => {
                "Image size must be less than 5MB.".to_string()
            }
            VerifyError::Decode(_) => "Failed to read the selected file.".to_string(),
            VerifyError::Classification(_) => {
                "Age verification failed. Please try again.".to_string()
            }
            VerifyError::OutOfRange { age, min, max } => format!(
                "Detected age {} is outside the allowed range ({}-{}). Verification rejected.",
                age, min, max
            ),
            VerifyError::Busy => "Verification is already in progress.".to_string(),
            VerifyError::Disposed => "This verification session has ended.".to_string(),
            VerifyError::Config(msg) => format!("Configuration error: {}", msg),
            VerifyError::InvalidTransition(_) => {
                "That action is not available right now.".to_string()
            }
        }
    }

    /// Expected business outcomes, as opposed to faults.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            VerifyError::Validation(_) | VerifyError::OutOfRange { .. }
        )
    }

    /// Whether the message is attached to the workflow state as an error overlay.
    pub fn is_attachable(&self) -> bool {
        !matches!(
            self,
            VerifyError::Busy
                | VerifyError::Disposed
                | VerifyError::Config(_)
                | VerifyError::InvalidTransition(_)
        )
    }
}

/// Rejected reducer transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("workflow is processing; input ignored")]
    Busy,
    #[error("cannot apply {event} while {from:?}")]
    Invalid { from: Phase, event: &'static str },
}
