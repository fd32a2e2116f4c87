use super::{classify_backend_error, facing_from_name};
use crate::config::CaptureConfig;
use crate::device::{CameraSource, MediaStream};
use crate::errors::AcquisitionError;
use crate::types::{FacingMode, RawFrame};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat,
        RequestedFormatType, Resolution,
    },
    CallbackCamera,
};

/// Local cameras through `nokhwa`
pub struct NativeCameraSource {
    width: u32,
    height: u32,
}

impl NativeCameraSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.ideal_width, config.ideal_height)
    }
}

fn open_blocking(
    facing: Option<FacingMode>,
    width: u32,
    height: u32,
) -> Result<NativeStream, AcquisitionError> {
    let cameras = query(ApiBackend::Auto)
        .map_err(|e| classify_backend_error(&format!("Failed to query cameras: {}", e)))?;
    if cameras.is_empty() {
        return Err(AcquisitionError::NoDevice);
    }

    let info = cameras
        .into_iter()
        .find(|info| facing.is_none() || facing_from_name(&info.human_name()) == facing)
        .ok_or(AcquisitionError::FacingUnavailable)?;

    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30),
    ));
    let index: CameraIndex = info.index().clone();
    let mut camera = CallbackCamera::new(index, requested, |_| {})
        .map_err(|e| classify_backend_error(&format!("Failed to initialize camera: {}", e)))?;
    camera
        .open_stream()
        .map_err(|e| classify_backend_error(&format!("Failed to start stream: {}", e)))?;

    Ok(NativeStream {
        id: info.human_name(),
        camera,
        live: true,
    })
}

#[async_trait::async_trait]
impl CameraSource for NativeCameraSource {
    async fn open(
        &self,
        facing: Option<FacingMode>,
    ) -> Result<Box<dyn MediaStream>, AcquisitionError> {
        let (width, height) = (self.width, self.height);
        let stream = tokio::task::spawn_blocking(move || open_blocking(facing, width, height))
            .await
            .map_err(|e| AcquisitionError::Backend(format!("Task join error: {}", e)))??;
        Ok(Box::new(stream))
    }
}

struct NativeStream {
    id: String,
    camera: CallbackCamera,
    live: bool,
}

impl MediaStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn grab_frame(&mut self) -> Result<Option<RawFrame>, String> {
        let buffer = self
            .camera
            .poll_frame()
            .map_err(|e| format!("Failed to capture frame: {}", e))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| format!("Failed to decode frame: {}", e))?;
        let (width, height) = (decoded.width(), decoded.height());
        Ok(Some(RawFrame::new(decoded.into_raw(), width, height)))
    }

    fn stop_all_tracks(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera {}: {}", self.id, e);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}
