//! Callers that stop waiting on an operation must not wedge the workflow.

mod common;

use common::{harness, harness_with, Harness};
use crabgate::testing::{
    synthetic_jpeg_bytes, synthetic_jpeg_upload, MockCameraSource, MockClassifier,
    MockPersistence,
};
use crabgate::{Phase, UploadedFile};
use std::time::Duration;
use tokio::time::timeout;

fn assert_interactive(h: &Harness) {
    assert_ne!(h.controller.state().phase, Phase::Processing);
    assert_eq!(
        h.camera.live_streams(),
        usize::from(h.controller.is_camera_active())
    );
}

#[tokio::test]
async fn abandoned_submit_still_verifies() {
    let (classifier, gate) = MockClassifier::gated(15);
    let h = harness(classifier);
    h.controller
        .capture_from_file(synthetic_jpeg_upload("face.jpg"))
        .await
        .expect("upload");

    let abandoned = timeout(Duration::from_millis(20), h.controller.submit()).await;
    assert!(abandoned.is_err());
    assert_eq!(h.controller.state().phase, Phase::Processing);

    gate.release();
    h.controller.settle().await;

    assert_interactive(&h);
    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.notice.as_deref(), Some("Age verified successfully!"));
    assert!(h.controller.preview().is_none());
    assert_eq!(h.navigator.destinations(), vec!["/dashboard".to_string()]);

    let requests = h.persistence.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].age, 15);
}

#[tokio::test]
async fn abandoned_submit_rejection_allows_discard() {
    let (classifier, gate) = MockClassifier::gated(30);
    let h = harness(classifier);
    h.controller
        .capture_from_file(synthetic_jpeg_upload("face.jpg"))
        .await
        .expect("upload");

    assert!(timeout(Duration::from_millis(20), h.controller.submit())
        .await
        .is_err());
    gate.release();
    h.controller.settle().await;

    assert_interactive(&h);
    let state = h.controller.state();
    assert_eq!(state.phase, Phase::PreviewReady);
    assert!(state.error.expect("error attached").contains("30"));
    assert!(h.navigator.destinations().is_empty());

    h.controller.discard().expect("discard after rejection");
    assert_eq!(h.controller.state().phase, Phase::Idle);
}

#[tokio::test]
async fn abandoned_start_camera_leaves_no_stream() {
    let h = harness_with(
        MockCameraSource::front().with_open_delay(Duration::from_millis(200)),
        MockClassifier::age(15),
        MockPersistence::new(),
    );

    let abandoned = timeout(Duration::from_millis(10), h.controller.start_camera()).await;
    assert!(abandoned.is_err());

    assert_interactive(&h);
    assert_eq!(h.controller.state().phase, Phase::Idle);
    assert_eq!(h.camera.opened_count(), 0);

    h.controller.start_camera().await.expect("camera starts");
    assert_interactive(&h);
    assert_eq!(h.controller.state().phase, Phase::CameraActive);
}

#[tokio::test]
async fn abandoned_stream_capture_keeps_workflow_usable() {
    let h = harness_with(
        MockCameraSource::front().with_frame_size(1920, 1080),
        MockClassifier::age(15),
        MockPersistence::new(),
    );
    h.controller.start_camera().await.expect("camera");

    let _ = timeout(Duration::from_millis(1), h.controller.capture_from_stream()).await;

    assert_interactive(&h);
    let phase = h.controller.state().phase;
    assert!(matches!(phase, Phase::CameraActive | Phase::PreviewReady));
    if phase == Phase::CameraActive {
        h.controller
            .capture_from_stream()
            .await
            .expect("capture after abandoned attempt");
    }

    assert_interactive(&h);
    assert_eq!(h.controller.state().phase, Phase::PreviewReady);
    assert_eq!(h.camera.live_streams(), 0);
}

#[tokio::test]
async fn abandoned_file_capture_keeps_workflow_usable() {
    let h = harness(MockClassifier::age(15));
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("face.jpg");
    std::fs::write(&path, synthetic_jpeg_bytes(256, 256)).expect("write");

    let upload = UploadedFile::open(&path).await.expect("open");
    let _ = timeout(Duration::ZERO, h.controller.capture_from_file(upload)).await;

    assert_interactive(&h);
    let phase = h.controller.state().phase;
    assert!(matches!(phase, Phase::Idle | Phase::PreviewReady));
    if phase == Phase::Idle {
        let upload = UploadedFile::open(&path).await.expect("open");
        h.controller
            .capture_from_file(upload)
            .await
            .expect("upload after abandoned attempt");
    }

    assert_eq!(h.controller.state().phase, Phase::PreviewReady);
    let verdict = h.controller.submit().await.expect("accepted");
    assert_eq!(verdict.age, 15);
}
