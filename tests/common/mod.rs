//! Shared setup for workflow tests
#![allow(dead_code)]

use crabgate::testing::{MockCameraSource, MockClassifier, MockNavigator, MockPersistence};
use crabgate::{GateConfig, VerificationController};
use std::sync::Arc;

pub struct Harness {
    pub controller: Arc<VerificationController>,
    pub camera: Arc<MockCameraSource>,
    pub classifier: Arc<MockClassifier>,
    pub persistence: Arc<MockPersistence>,
    pub navigator: Arc<MockNavigator>,
}

pub fn harness_with(
    camera: MockCameraSource,
    classifier: MockClassifier,
    persistence: MockPersistence,
) -> Harness {
    let camera = Arc::new(camera);
    let classifier = Arc::new(classifier);
    let persistence = Arc::new(persistence);
    let navigator = Arc::new(MockNavigator::new());

    let controller = Arc::new(VerificationController::new(
        GateConfig::default(),
        camera.clone(),
        classifier.clone(),
        persistence.clone(),
        navigator.clone(),
    ));

    Harness {
        controller,
        camera,
        classifier,
        persistence,
        navigator,
    }
}

pub fn harness(classifier: MockClassifier) -> Harness {
    harness_with(MockCameraSource::front(), classifier, MockPersistence::new())
}
