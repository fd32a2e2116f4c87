//! Testing utilities for CrabGate
//!
//! Synthetic frames and uploads plus mock collaborators, so the full
//! verification workflow can run without a camera or network.

pub mod mocks;
pub mod synthetic_data;

pub use mocks::{
    ClassifierGate, ClassifierResponse, MockCameraSource, MockClassifier, MockNavigator,
    MockPersistence,
};
pub use synthetic_data::{
    oversized_jpeg_upload, synthetic_frame, synthetic_jpeg_bytes, synthetic_jpeg_upload,
    synthetic_png_bytes, unreadable_upload,
};
