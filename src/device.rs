//! Camera device management
//!
//! The [`DeviceManager`] is the sole owner of the live camera stream. Hosts
//! plug their camera stack in through [`CameraSource`] and [`MediaStream`];
//! the `native` feature ships a `nokhwa` backed source.

use crate::errors::AcquisitionError;
use crate::types::{FacingMode, RawFrame};
use async_trait::async_trait;

/// An open camera stream.
pub trait MediaStream: Send {
    /// Identifier of the underlying device
    fn id(&self) -> &str;

    /// Current frame. `Ok(None)` while the stream has not produced one yet.
    fn grab_frame(&mut self) -> Result<Option<RawFrame>, String>;

    /// Stop every track and free the hardware. Must be safe to call twice.
    fn stop_all_tracks(&mut self);

    fn is_live(&self) -> bool;
}

/// Host camera stack.
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Open a stream. `Some(mode)` requires that facing mode and fails with
    /// [`AcquisitionError::FacingUnavailable`] when no such sensor exists.
    async fn open(
        &self,
        facing: Option<FacingMode>,
    ) -> Result<Box<dyn MediaStream>, AcquisitionError>;
}

/// Facing modes tried in order; `None` accepts any device.
pub const FACING_PREFERENCE: [Option<FacingMode>; 3] =
    [Some(FacingMode::User), Some(FacingMode::Environment), None];

/// Open a stream preferring the front sensor without requiring it.
pub async fn open_preferred(
    source: &dyn CameraSource,
) -> Result<Box<dyn MediaStream>, AcquisitionError> {
    let mut last_err = AcquisitionError::NoDevice;
    for facing in FACING_PREFERENCE {
        match source.open(facing).await {
            Ok(stream) => {
                log::info!(
                    "Opened camera {} (facing preference: {})",
                    stream.id(),
                    facing.map(|f| f.as_str()).unwrap_or("any")
                );
                return Ok(stream);
            }
            Err(AcquisitionError::FacingUnavailable) => {
                log::debug!("No camera facing {:?}, trying next preference", facing);
                last_err = AcquisitionError::FacingUnavailable;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err)
}

/// Owner of the active camera stream
#[derive(Default)]
pub struct DeviceManager {
    stream: Option<Box<dyn MediaStream>>,
    bindings: u64,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Device id of the bound stream
    pub fn device_id(&self) -> Option<&str> {
        self.stream.as_deref().map(|s| s.id())
    }

    /// Identifies the current binding; changes every time a stream is bound.
    pub fn binding(&self) -> Option<u64> {
        self.stream.as_ref().map(|_| self.bindings)
    }

    /// Bind a freshly opened stream, releasing any previous one first.
    pub fn bind(&mut self, stream: Box<dyn MediaStream>) {
        self.release();
        log::debug!("Binding camera stream {}", stream.id());
        self.bindings += 1;
        self.stream = Some(stream);
    }

    /// Current frame of the bound stream.
    pub fn grab_frame(&mut self) -> Result<RawFrame, String> {
        let stream = self
            .stream
            .as_deref_mut()
            .ok_or_else(|| "camera is not active".to_string())?;
        if !stream.is_live() {
            return Err(format!("camera {} is not producing frames", stream.id()));
        }
        stream
            .grab_frame()?
            .ok_or_else(|| format!("camera {} has no frame yet", stream.id()))
    }

    /// Stop all tracks and drop the stream. No-op when nothing is bound.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
            log::info!("Camera {} released", stream.id());
        }
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.release();
    }
}
