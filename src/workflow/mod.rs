//! Verification workflow: state, transitions and the orchestrating controller

pub mod controller;
pub mod state;

pub use controller::{VerificationController, Verdict};
pub use state::{Event, Phase, WorkflowState};
