//! Mock implementations of the camera and service seams.

use crate::device::{CameraSource, MediaStream};
use crate::errors::AcquisitionError;
use crate::services::{Classifier, Navigator, Persistence};
use crate::testing::synthetic_data::synthetic_frame;
use crate::types::{CapturedImage, FacingMode, PersistRequest, RawFrame};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StreamCounters {
    live: AtomicUsize,
    opened: AtomicUsize,
    stopped: AtomicUsize,
}

/// Camera source backed by synthetic devices.
///
/// Tracks how many streams are open so tests can prove none leak.
pub struct MockCameraSource {
    devices: Vec<(Option<FacingMode>, String)>,
    failure: Option<AcquisitionError>,
    frame_size: (u32, u32),
    open_delay: Option<Duration>,
    requests: Mutex<Vec<Option<FacingMode>>>,
    counters: Arc<StreamCounters>,
}

impl MockCameraSource {
    pub fn with_devices(devices: Vec<(Option<FacingMode>, &str)>) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|(facing, id)| (facing, id.to_string()))
                .collect(),
            failure: None,
            frame_size: (64, 48),
            open_delay: None,
            requests: Mutex::new(Vec::new()),
            counters: Arc::new(StreamCounters::default()),
        }
    }

    /// A front camera and a rear camera
    pub fn front() -> Self {
        Self::with_devices(vec![
            (Some(FacingMode::User), "front"),
            (Some(FacingMode::Environment), "rear"),
        ])
    }

    pub fn rear_only() -> Self {
        Self::with_devices(vec![(Some(FacingMode::Environment), "rear")])
    }

    /// A camera that reports no facing mode, like most USB webcams
    pub fn unlabeled() -> Self {
        Self::with_devices(vec![(None, "usb")])
    }

    /// Every open attempt fails with `err`
    pub fn failing(err: AcquisitionError) -> Self {
        let mut source = Self::with_devices(Vec::new());
        source.failure = Some(err);
        source
    }

    /// Streams whose frames have the given size; `(0, 0)` yields empty frames.
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Facing modes requested so far, in order
    pub fn requests(&self) -> Vec<Option<FacingMode>> {
        locked(&self.requests).clone()
    }

    /// Streams opened and not yet stopped
    pub fn live_streams(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn opened_count(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn stopped_count(&self) -> usize {
        self.counters.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CameraSource for MockCameraSource {
    async fn open(
        &self,
        facing: Option<FacingMode>,
    ) -> Result<Box<dyn MediaStream>, AcquisitionError> {
        locked(&self.requests).push(facing);
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.devices.is_empty() {
            return Err(AcquisitionError::NoDevice);
        }

        let (_, id) = self
            .devices
            .iter()
            .find(|(device_facing, _)| facing.is_none() || *device_facing == facing)
            .ok_or(AcquisitionError::FacingUnavailable)?;

        self.counters.live.fetch_add(1, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            id: id.clone(),
            live: true,
            frame_number: 0,
            frame_size: self.frame_size,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockStream {
    id: String,
    live: bool,
    frame_number: u64,
    frame_size: (u32, u32),
    counters: Arc<StreamCounters>,
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn grab_frame(&mut self) -> Result<Option<RawFrame>, String> {
        if !self.live {
            return Err("stream stopped".to_string());
        }
        self.frame_number += 1;
        let (width, height) = self.frame_size;
        if width == 0 || height == 0 {
            return Ok(Some(RawFrame::new(Vec::new(), 0, 0)));
        }
        Ok(Some(synthetic_frame(self.frame_number, width, height)))
    }

    fn stop_all_tracks(&mut self) {
        if self.live {
            self.live = false;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        if self.live {
            log::warn!("Mock stream {} dropped without being stopped", self.id);
        }
    }
}

/// Scripted classifier answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierResponse {
    Age(u32),
    Fail(String),
}

/// Holds a gated classifier call open until released.
#[derive(Clone, Default)]
pub struct ClassifierGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ClassifierGate {
    /// Wait until a classify call is in flight
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the in-flight call return
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Classifier replaying scripted responses; the last one repeats.
pub struct MockClassifier {
    responses: Mutex<VecDeque<ClassifierResponse>>,
    gate: Option<ClassifierGate>,
    calls: AtomicUsize,
    seen: Mutex<Vec<CapturedImage>>,
}

impl MockClassifier {
    pub fn sequence(responses: Vec<ClassifierResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            gate: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn age(age: u32) -> Self {
        Self::sequence(vec![ClassifierResponse::Age(age)])
    }

    pub fn failing(message: &str) -> Self {
        Self::sequence(vec![ClassifierResponse::Fail(message.to_string())])
    }

    /// Classifier that blocks every call until the returned gate is released
    pub fn gated(age: u32) -> (Self, ClassifierGate) {
        let gate = ClassifierGate::default();
        let mut classifier = Self::age(age);
        classifier.gate = Some(gate.clone());
        (classifier, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Images received, in call order
    pub fn seen(&self) -> Vec<CapturedImage> {
        locked(&self.seen).clone()
    }

    fn next_response(&self) -> ClassifierResponse {
        let mut responses = locked(&self.responses);
        if responses.len() > 1 {
            responses.pop_front().unwrap_or(ClassifierResponse::Age(0))
        } else {
            responses
                .front()
                .cloned()
                .unwrap_or_else(|| ClassifierResponse::Fail("no scripted response".to_string()))
        }
    }
}

#[async_trait::async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, image: &CapturedImage) -> anyhow::Result<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        locked(&self.seen).push(image.clone());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match self.next_response() {
            ClassifierResponse::Age(age) => Ok(age),
            ClassifierResponse::Fail(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

/// Persistence endpoint recording requests
#[derive(Default)]
pub struct MockPersistence {
    requests: Mutex<Vec<PersistRequest>>,
    fail: bool,
}

impl MockPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records requests, then reports failure for each
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<PersistRequest> {
        locked(&self.requests).clone()
    }
}

#[async_trait::async_trait]
impl Persistence for MockPersistence {
    async fn persist(&self, request: PersistRequest) -> anyhow::Result<()> {
        locked(&self.requests).push(request);
        if self.fail {
            anyhow::bail!("persistence endpoint unavailable");
        }
        Ok(())
    }
}

/// Navigator recording redirects
#[derive(Default)]
pub struct MockNavigator {
    destinations: Mutex<Vec<String>>,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destinations(&self) -> Vec<String> {
        locked(&self.destinations).clone()
    }
}

impl Navigator for MockNavigator {
    fn navigate(&self, destination: &str) {
        locked(&self.destinations).push(destination.to_string());
    }
}
