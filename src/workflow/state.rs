//! Workflow state and its transition function
//!
//! [`WorkflowState`] is a plain serializable value. Every change goes through
//! [`WorkflowState::apply`], which either returns the next state or refuses
//! the event. The error overlay lives beside the phase rather than being a
//! phase of its own.

use crate::errors::TransitionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    CameraActive,
    PreviewReady,
    Processing,
}

impl Phase {
    /// A still image is held in this phase.
    pub fn holds_image(&self) -> bool {
        matches!(self, Phase::PreviewReady | Phase::Processing)
    }

    /// The camera stream is bound in this phase.
    pub fn holds_camera(&self) -> bool {
        matches!(self, Phase::CameraActive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub phase: Phase,
    /// User-facing error overlay
    pub error: Option<String>,
    /// Confirmation shown after an accepted verification
    pub notice: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Inputs to the transition function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    CameraStarted,
    CameraFailed(String),
    CameraStopped,
    Captured,
    CaptureFailed(String),
    UploadRejected(String),
    SubmitRequested,
    Verified { notice: String },
    Rejected(String),
    ClassificationFailed(String),
    Discarded,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CameraStarted => "CameraStarted",
            Event::CameraFailed(_) => "CameraFailed",
            Event::CameraStopped => "CameraStopped",
            Event::Captured => "Captured",
            Event::CaptureFailed(_) => "CaptureFailed",
            Event::UploadRejected(_) => "UploadRejected",
            Event::SubmitRequested => "SubmitRequested",
            Event::Verified { .. } => "Verified",
            Event::Rejected(_) => "Rejected",
            Event::ClassificationFailed(_) => "ClassificationFailed",
            Event::Discarded => "Discarded",
        }
    }
}

impl WorkflowState {
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            error: None,
            notice: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.phase == Phase::Processing
    }

    fn with_phase(phase: Phase) -> Self {
        Self {
            phase,
            error: None,
            notice: None,
        }
    }

    fn with_error(&self, message: String) -> Self {
        Self {
            phase: self.phase,
            error: Some(message),
            notice: None,
        }
    }

    /// Compute the state that follows `event`.
    pub fn apply(&self, event: &Event) -> Result<WorkflowState, TransitionError> {
        let invalid = || TransitionError::Invalid {
            from: self.phase,
            event: event.name(),
        };

        match (self.phase, event) {
            // Processing only ends through the classifier's answer.
            (Phase::Processing, Event::Verified { notice }) => Ok(Self {
                phase: Phase::Idle,
                error: None,
                notice: Some(notice.clone()),
            }),
            (Phase::Processing, Event::Rejected(msg))
            | (Phase::Processing, Event::ClassificationFailed(msg)) => Ok(Self {
                phase: Phase::PreviewReady,
                error: Some(msg.clone()),
                notice: None,
            }),
            (Phase::Processing, _) => Err(TransitionError::Busy),

            (_, Event::Verified { .. })
            | (_, Event::Rejected(_))
            | (_, Event::ClassificationFailed(_)) => Err(invalid()),

            (_, Event::CameraStarted) => Ok(Self::with_phase(Phase::CameraActive)),
            (_, Event::CameraFailed(msg))
            | (_, Event::CaptureFailed(msg))
            | (_, Event::UploadRejected(msg)) => Ok(self.with_error(msg.clone())),

            (Phase::CameraActive, Event::CameraStopped) => Ok(Self {
                phase: Phase::Idle,
                error: self.error.clone(),
                notice: None,
            }),
            (_, Event::CameraStopped) => Ok(self.clone()),

            (Phase::Idle, Event::Captured) | (Phase::CameraActive, Event::Captured) => {
                Ok(Self::with_phase(Phase::PreviewReady))
            }
            (_, Event::Captured) => Err(invalid()),

            (Phase::PreviewReady, Event::SubmitRequested) => {
                Ok(Self::with_phase(Phase::Processing))
            }
            (_, Event::SubmitRequested) => Err(invalid()),

            (_, Event::Discarded) => Ok(Self::idle()),
        }
    }
}
