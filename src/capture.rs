//! Capture pipeline
//!
//! Turns a live frame or an uploaded file into a [`CapturedImage`].

use crate::errors::{ValidationError, VerifyError};
use crate::types::{CapturedImage, ImageOrigin, RawFrame, UploadContent, UploadedFile};
use crate::validation::MAX_UPLOAD_BYTES;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// MIME type of stills taken from the camera
pub const CAPTURE_MIME_TYPE: &str = "image/jpeg";

/// Draw a frame into an RGB buffer of matching size and JPEG-encode it.
pub fn encode_frame(frame: RawFrame, quality: u8) -> Result<CapturedImage, VerifyError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(VerifyError::Capture(
            "stream is not producing frames yet".to_string(),
        ));
    }

    let (width, height) = (frame.width, frame.height);
    let expected = frame.expected_len();
    let actual = frame.data.len();
    let img = image::RgbImage::from_vec(width, height, frame.data).ok_or_else(|| {
        VerifyError::Capture(format!(
            "frame buffer is {} bytes, {}x{} RGB needs {}",
            actual, width, height, expected
        ))
    })?;

    let dynamic_img = image::DynamicImage::ImageRgb8(img);
    let mut encoded = Vec::with_capacity(expected / 8);
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100));
    dynamic_img
        .write_with_encoder(encoder)
        .map_err(|e| VerifyError::Capture(format!("JPEG encoding failed: {}", e)))?;

    log::debug!(
        "Encoded {}x{} frame to {} bytes at quality {}",
        width,
        height,
        encoded.len(),
        quality
    );
    Ok(CapturedImage::new(CAPTURE_MIME_TYPE, encoded, ImageOrigin::Camera))
}

/// [`encode_frame`] on the blocking pool.
pub async fn encode_frame_async(frame: RawFrame, quality: u8) -> Result<CapturedImage, VerifyError> {
    tokio::task::spawn_blocking(move || encode_frame(frame, quality))
        .await
        .map_err(|e| VerifyError::Capture(format!("Task join error: {}", e)))?
}

/// Read an uploaded file into a still image. The file is consumed either way.
pub async fn decode_upload(file: UploadedFile) -> Result<CapturedImage, VerifyError> {
    let UploadedFile {
        name,
        declared_type,
        content,
        ..
    } = file;

    let bytes: bytes::Bytes = match content {
        UploadContent::Memory(bytes) => bytes,
        UploadContent::Path(path) => read_bounded(&path).await?.into(),
    };

    if bytes.is_empty() {
        return Err(VerifyError::Decode(format!("{} is empty", name)));
    }

    // The declared length comes from the host and may not match what was read.
    if bytes.len() as u64 > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: bytes.len() as u64,
            limit: MAX_UPLOAD_BYTES,
        }
        .into());
    }

    let format = image::guess_format(&bytes).map_err(|e| {
        VerifyError::Decode(format!("{} is not a readable image: {}", name, e))
    })?;

    log::debug!(
        "Decoded upload {} ({} bytes, declared {}, detected {:?})",
        name,
        bytes.len(),
        declared_type,
        format
    );
    Ok(CapturedImage::new(declared_type, bytes, ImageOrigin::Upload))
}

/// Read at most one byte past the ceiling, so an oversized file is detected
/// without loading all of it.
async fn read_bounded(path: &Path) -> Result<Vec<u8>, VerifyError> {
    let read_error =
        |e: std::io::Error| VerifyError::Decode(format!("failed to read {}: {}", path.display(), e));

    let file = tokio::fs::File::open(path).await.map_err(read_error)?;
    let mut bytes = Vec::new();
    file.take(MAX_UPLOAD_BYTES + 1)
        .read_to_end(&mut bytes)
        .await
        .map_err(read_error)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{synthetic_frame, synthetic_jpeg_bytes};

    #[test]
    fn test_encode_frame_produces_jpeg() {
        let image = encode_frame(synthetic_frame(0, 64, 48), 90).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.origin, ImageOrigin::Camera);
        assert_eq!(&image.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_zero_sized_frame_fails() {
        let result = encode_frame(RawFrame::new(Vec::new(), 0, 0), 90);
        assert!(matches!(result, Err(VerifyError::Capture(_))));
    }

    #[test]
    fn test_encode_mismatched_buffer_fails() {
        let result = encode_frame(RawFrame::new(vec![0u8; 10], 64, 48), 90);
        assert!(matches!(result, Err(VerifyError::Capture(_))));
    }

    #[test]
    fn test_quality_affects_size() {
        let low = encode_frame(synthetic_frame(3, 128, 128), 10).unwrap();
        let high = encode_frame(synthetic_frame(3, 128, 128), 95).unwrap();
        assert!(high.len() > low.len());
    }

    #[tokio::test]
    async fn test_decode_upload_from_memory() {
        let file = UploadedFile::from_bytes("face.jpg", "image/jpeg", synthetic_jpeg_bytes(32, 32));
        let image = decode_upload(file).await.unwrap();
        assert_eq!(image.origin, ImageOrigin::Upload);
        assert!(image.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_decode_upload_garbage_fails() {
        let file = UploadedFile::from_bytes("face.jpg", "image/jpeg", vec![1u8, 2, 3, 4, 5, 6]);
        let result = decode_upload(file).await;
        assert!(matches!(result, Err(VerifyError::Decode(_))));
    }

    #[tokio::test]
    async fn test_decode_upload_missing_path_fails() {
        let file = UploadedFile::from_path("/definitely/not/here.jpg", "image/jpeg", 100);
        let result = decode_upload(file).await;
        assert!(matches!(result, Err(VerifyError::Decode(_))));
    }

    #[tokio::test]
    async fn test_decode_upload_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("face.jpg");
        std::fs::write(&path, synthetic_jpeg_bytes(16, 16)).expect("write");

        let file = UploadedFile::open(&path).await.expect("open");
        assert_eq!(file.declared_type, "image/jpeg");
        let image = decode_upload(file).await.unwrap();
        assert!(!image.is_empty());
    }

    #[tokio::test]
    async fn test_decode_upload_understated_size_stops_at_ceiling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("face.jpg");
        let mut content = synthetic_jpeg_bytes(16, 16);
        content.resize(MAX_UPLOAD_BYTES as usize * 2, 0);
        std::fs::write(&path, &content).expect("write");

        let file = UploadedFile::from_path(path.clone(), "image/jpeg", 1024);
        let result = decode_upload(file).await;
        assert!(matches!(
            result,
            Err(VerifyError::Validation(ValidationError::TooLarge { size, .. }))
                if size == MAX_UPLOAD_BYTES + 1
        ));
    }
}
