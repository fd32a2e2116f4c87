//! Verification controller
//!
//! Owns the camera, the held still image and the [`WorkflowState`], and drives
//! a capture or upload through the external classifier. All state changes go
//! through [`WorkflowState::apply`] under a single lock that is never held
//! across an await point.
//!
//! The classification call and the handling of its answer run on a detached
//! task: dropping a `submit` future does not cancel it, and the workflow
//! still leaves Processing when the answer arrives. Once the controller is
//! disposed, results that arrive later are logged and otherwise ignored.

use crate::assert_invariant;
use crate::capture::{decode_upload, encode_frame_async};
use crate::config::GateConfig;
use crate::device::{open_preferred, CameraSource, DeviceManager};
use crate::errors::{TransitionError, VerifyError};
use crate::invariant_ppt::{
    CAMERA_MATCHES_PHASE, CAMERA_PREVIEW_EXCLUSIVE, IMAGE_MATCHES_PHASE,
    NO_ERROR_WHILE_PROCESSING,
};
use crate::services::{Classifier, Navigator, Persistence};
use crate::types::{CapturedImage, PersistRequest, UploadedFile};
use crate::validation;
use crate::workflow::state::{Event, Phase, WorkflowState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Accepted verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub age: u32,
    pub destination: String,
}

struct Core {
    state: WorkflowState,
    device: DeviceManager,
    image: Option<CapturedImage>,
}

impl Core {
    /// Apply `event`, running `effect` on the held resources only if the
    /// transition is legal.
    fn transition(
        &mut self,
        event: Event,
        effect: impl FnOnce(&mut Core),
    ) -> Result<(), TransitionError> {
        let next = self.state.apply(&event)?;
        effect(self);
        self.state = next;
        self.check_invariants(event.name());
        Ok(())
    }

    /// Attach a user-facing error. Ignored while processing.
    fn attach(&mut self, err: &VerifyError, event: fn(String) -> Event) {
        if !err.is_attachable() {
            return;
        }
        if let Err(e) = self.transition(event(err.user_message()), |_| {}) {
            log::debug!("Not attaching error overlay: {}", e);
        }
    }

    fn check_invariants(&self, context: &str) {
        let camera = self.device.is_active();
        let image = self.image.is_some();
        assert_invariant!(!(camera && image), CAMERA_PREVIEW_EXCLUSIVE, context);
        assert_invariant!(
            camera == self.state.phase.holds_camera(),
            CAMERA_MATCHES_PHASE,
            context
        );
        assert_invariant!(
            image == self.state.phase.holds_image(),
            IMAGE_MATCHES_PHASE,
            context
        );
        assert_invariant!(
            !(self.state.is_processing() && self.state.error.is_some()),
            NO_ERROR_WHILE_PROCESSING,
            context
        );
    }
}

/// State shared between the controller and its detached tasks
struct Shared {
    config: GateConfig,
    source: Arc<dyn CameraSource>,
    classifier: Arc<dyn Classifier>,
    persistence: Arc<dyn Persistence>,
    navigator: Arc<dyn Navigator>,
    core: Mutex<Core>,
    alive: AtomicBool,
    state_tx: watch::Sender<WorkflowState>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Shared {
    fn is_disposed(&self) -> bool {
        !self.alive.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the core if the controller is still live.
    fn lock_live(&self) -> Result<MutexGuard<'_, Core>, VerifyError> {
        let core = self.lock();
        if self.is_disposed() {
            return Err(VerifyError::Disposed);
        }
        Ok(core)
    }

    fn publish(&self, core: &Core) {
        self.state_tx.send_replace(core.state.clone());
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Classify `image` and move the workflow out of Processing.
    async fn resolve(&self, image: CapturedImage) -> Result<Verdict, VerifyError> {
        let classifier = Arc::clone(&self.classifier);
        let task = tokio::spawn(async move { classifier.classify(&image).await });
        let result = match task.await {
            Ok(Ok(age)) => Ok(age),
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(e) => Err(format!("Task join error: {}", e)),
        };

        let mut core = match self.lock_live() {
            Ok(core) => core,
            Err(e) => {
                log::debug!(
                    "Ignoring classification result after teardown: {:?}",
                    result
                );
                return Err(e);
            }
        };

        let verification = &self.config.verification;
        match result {
            Ok(age) if verification.accepts(age) => {
                let mut accepted = None;
                core.transition(
                    Event::Verified {
                        notice: verification.success_notice.clone(),
                    },
                    |core| accepted = core.image.take(),
                )?;
                self.publish(&core);
                drop(core);

                log::info!("Age {} accepted", age);
                if let Some(image) = accepted {
                    self.persist_detached(image, age);
                }
                self.navigator.navigate(&verification.success_destination);
                Ok(Verdict {
                    age,
                    destination: verification.success_destination.clone(),
                })
            }
            Ok(age) => {
                let err = VerifyError::OutOfRange {
                    age,
                    min: verification.min_age,
                    max: verification.max_age,
                };
                log::warn!("{}", err);
                core.transition(Event::Rejected(err.user_message()), |_| {})?;
                self.publish(&core);
                Err(err)
            }
            Err(msg) => {
                let err = VerifyError::Classification(msg);
                log::error!("{}", err);
                core.transition(Event::ClassificationFailed(err.user_message()), |_| {})?;
                self.publish(&core);
                Err(err)
            }
        }
    }

    fn persist_detached(&self, image: CapturedImage, age: u32) {
        let persistence = Arc::clone(&self.persistence);
        let request = PersistRequest {
            image: image.to_data_uri(),
            age,
        };
        self.track(tokio::spawn(async move {
            match persistence.persist(request).await {
                Ok(()) => log::info!("Stored verification for image {}", image.id),
                Err(e) => log::error!(
                    "Failed to store verification for image {}: {:#}",
                    image.id,
                    e
                ),
            }
        }));
    }

    fn dispose(&self) {
        let mut core = self.lock();
        if core.device.is_active() {
            if let Err(e) = core.transition(Event::CameraStopped, |core| core.device.release()) {
                log::debug!("Camera stop not applied during teardown: {}", e);
            }
        }
        // Unconditional in case the phase did not admit the transition.
        core.device.release();
        if self.alive.swap(false, Ordering::SeqCst) {
            self.publish(&core);
            log::info!("Verification controller disposed");
        }
    }
}

pub struct VerificationController {
    shared: Arc<Shared>,
}

impl VerificationController {
    pub fn new(
        config: GateConfig,
        source: Arc<dyn CameraSource>,
        classifier: Arc<dyn Classifier>,
        persistence: Arc<dyn Persistence>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::idle());
        Self {
            shared: Arc::new(Shared {
                config,
                source,
                classifier,
                persistence,
                navigator,
                core: Mutex::new(Core {
                    state: WorkflowState::idle(),
                    device: DeviceManager::new(),
                    image: None,
                }),
                alive: AtomicBool::new(true),
                state_tx,
                background: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Controller talking to the classifier and persistence endpoints in `config`.
    #[cfg(feature = "http")]
    pub fn with_http_services(
        config: GateConfig,
        source: Arc<dyn CameraSource>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        use crate::services::{HttpClassifier, HttpPersistence};

        let classifier = Arc::new(HttpClassifier::from_config(&config.services)?);
        let persistence = Arc::new(HttpPersistence::from_config(&config.services)?);
        Ok(Self::new(config, source, classifier, persistence, navigator))
    }

    pub fn config(&self) -> &GateConfig {
        &self.shared.config
    }

    /// Snapshot of the current workflow state
    pub fn state(&self) -> WorkflowState {
        self.shared.lock().state.clone()
    }

    /// The held still image, if any
    pub fn preview(&self) -> Option<CapturedImage> {
        self.shared.lock().image.clone()
    }

    pub fn is_camera_active(&self) -> bool {
        self.shared.lock().device.is_active()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.shared.state_tx.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Open the camera, front-facing if available.
    pub async fn start_camera(&self) -> Result<(), VerifyError> {
        let shared = &self.shared;
        {
            let core = shared.lock_live()?;
            if core.state.is_processing() {
                return Err(VerifyError::Busy);
            }
            if core.device.is_active() {
                log::debug!("Camera already active");
                return Ok(());
            }
        }

        log::info!("Requesting camera stream");
        let opened = open_preferred(shared.source.as_ref()).await;

        let mut core = match shared.lock_live() {
            Ok(core) => core,
            Err(e) => {
                if let Ok(mut stream) = opened {
                    log::debug!("Controller disposed while opening camera, stopping stream");
                    stream.stop_all_tracks();
                }
                return Err(e);
            }
        };

        match opened {
            Ok(mut stream) => {
                // A stream that cannot be bound must still be stopped.
                if let Err(e) = core.state.apply(&Event::CameraStarted) {
                    stream.stop_all_tracks();
                    return Err(e.into());
                }
                core.transition(Event::CameraStarted, |core| {
                    core.image = None;
                    core.device.bind(stream);
                })?;
                shared.publish(&core);
                Ok(())
            }
            Err(e) => {
                let err = VerifyError::from(e);
                log::warn!("Failed to start camera: {}", err);
                core.attach(&err, Event::CameraFailed);
                shared.publish(&core);
                Err(err)
            }
        }
    }

    /// Stop the camera. Safe to call when it is not running.
    pub fn stop_camera(&self) {
        let mut core = self.shared.lock();
        if !core.device.is_active() {
            return;
        }
        if let Err(e) = core.transition(Event::CameraStopped, |core| core.device.release()) {
            log::debug!("Camera stop not applied: {}", e);
        }
        self.shared.publish(&core);
    }

    /// Grab the current camera frame as the still to verify. Releases the camera.
    ///
    /// A capture whose camera was stopped or replaced while the frame was
    /// being encoded is dropped.
    pub async fn capture_from_stream(&self) -> Result<(), VerifyError> {
        let shared = &self.shared;
        let (frame, binding) = {
            let mut core = shared.lock_live()?;
            if core.state.is_processing() {
                return Err(VerifyError::Busy);
            }
            match core.device.grab_frame() {
                Ok(frame) => (frame, core.device.binding()),
                Err(msg) => {
                    let err = VerifyError::Capture(msg);
                    log::warn!("Capture failed: {}", err);
                    core.attach(&err, Event::CaptureFailed);
                    shared.publish(&core);
                    return Err(err);
                }
            }
        };

        let encoded = encode_frame_async(frame, shared.config.capture.jpeg_quality).await;

        let mut core = shared.lock_live()?;
        if core.device.binding() != binding {
            let err =
                VerifyError::Capture("camera stopped before the capture completed".to_string());
            log::debug!("Dropping capture: {}", err);
            return Err(err);
        }
        match encoded {
            Ok(image) => {
                log::info!("Captured still {} ({} bytes)", image.id, image.len());
                core.transition(Event::Captured, |core| {
                    core.device.release();
                    core.image = Some(image);
                })?;
                shared.publish(&core);
                Ok(())
            }
            Err(err) => {
                log::warn!("Capture failed: {}", err);
                core.attach(&err, Event::CaptureFailed);
                shared.publish(&core);
                Err(err)
            }
        }
    }

    /// Validate and read a user-selected file as the still to verify.
    pub async fn capture_from_file(&self, file: UploadedFile) -> Result<(), VerifyError> {
        let shared = &self.shared;
        {
            let mut core = shared.lock_live()?;
            if core.state.is_processing() {
                log::debug!("Ignoring upload of {} while processing", file.name);
                return Err(VerifyError::Busy);
            }
            if let Err(e) = validation::validate(&file) {
                let err = VerifyError::from(e);
                log::warn!("Rejected upload {}: {}", file.name, err);
                core.attach(&err, Event::UploadRejected);
                shared.publish(&core);
                return Err(err);
            }
            // Refuse before reading the file if it could not be held anyway.
            if let Err(e) = core.state.apply(&Event::Captured) {
                log::debug!("Not loading upload {}: {}", file.name, e);
                return Err(e.into());
            }
        }

        let decoded = decode_upload(file).await;

        let mut core = shared.lock_live()?;
        match decoded {
            Ok(image) => {
                log::info!("Loaded upload {} ({} bytes)", image.id, image.len());
                core.transition(Event::Captured, |core| {
                    core.device.release();
                    core.image = Some(image);
                })?;
                shared.publish(&core);
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to load upload: {}", err);
                core.attach(&err, Event::UploadRejected);
                shared.publish(&core);
                Err(err)
            }
        }
    }

    /// Drop the held image and any error, returning to Idle.
    pub fn discard(&self) -> Result<(), VerifyError> {
        let mut core = self.shared.lock_live()?;
        core.transition(Event::Discarded, |core| {
            core.image = None;
            core.device.release();
        })?;
        self.shared.publish(&core);
        Ok(())
    }

    /// Discard the current image and reopen the camera.
    pub async fn retake(&self) -> Result<(), VerifyError> {
        self.discard()?;
        self.start_camera().await
    }

    /// Send the held image to the classifier and act on its answer.
    ///
    /// The answer is applied even if this future is dropped before it
    /// resolves.
    pub async fn submit(&self) -> Result<Verdict, VerifyError> {
        let image = {
            let mut core = self.shared.lock_live()?;
            core.transition(Event::SubmitRequested, |_| {})?;
            self.shared.publish(&core);
            core.image.clone().ok_or(VerifyError::InvalidTransition(
                TransitionError::Invalid {
                    from: Phase::Processing,
                    event: "SubmitRequested",
                },
            ))?
        };

        log::info!("Submitting image {} for age verification", image.id);
        let (tx, rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        self.shared.track(tokio::spawn(async move {
            let outcome = shared.resolve(image).await;
            if tx.send(outcome).is_err() {
                log::debug!("Verification finished after the caller stopped waiting");
            }
        }));

        rx.await.unwrap_or_else(|_| {
            Err(VerifyError::Classification(
                "verification task ended without a result".to_string(),
            ))
        })
    }

    /// Wait for detached verification and persistence tasks to finish.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(
                &mut *self
                    .shared
                    .background
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    log::warn!("Background task failed: {}", e);
                }
            }
        }
    }

    /// Tear the controller down: release the camera now and ignore any
    /// result that arrives later.
    pub fn dispose(&self) {
        self.shared.dispose();
    }
}

impl Drop for VerificationController {
    fn drop(&mut self) {
        self.dispose();
    }
}
