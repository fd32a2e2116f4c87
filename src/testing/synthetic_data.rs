//! Synthetic camera frames and upload payloads
//!
//! Lets the capture and workflow paths run offline, without a camera or
//! fixture files on disk.

use crate::types::{RawFrame, UploadedFile};
use crate::validation::MAX_UPLOAD_BYTES;
use std::io::Cursor;

/// Gradient RGB8 frame whose content shifts with `frame_number`
pub fn synthetic_frame(frame_number: u64, width: u32, height: u32) -> RawFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    RawFrame::new(data, width, height)
}

fn encode_synthetic(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let frame = synthetic_frame(7, width, height);
    let img = image::RgbImage::from_vec(width, height, frame.data)
        .expect("synthetic frame matches its dimensions");
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("in-memory encode");
    out.into_inner()
}

/// Real JPEG bytes of a gradient image
pub fn synthetic_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_synthetic(width, height, image::ImageFormat::Jpeg)
}

/// Real PNG bytes of a gradient image
pub fn synthetic_png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_synthetic(width, height, image::ImageFormat::Png)
}

/// In-memory JPEG upload
pub fn synthetic_jpeg_upload(name: &str) -> UploadedFile {
    UploadedFile::from_bytes(name, "image/jpeg", synthetic_jpeg_bytes(64, 64))
}

/// Upload declaring `size` bytes whose content cannot be read.
///
/// Any attempt to decode it fails with a decode error, which makes it easy to
/// prove that validation stopped the upload first.
pub fn unreadable_upload(declared_type: &str, size: u64) -> UploadedFile {
    UploadedFile::from_path("/nonexistent/crabgate/upload.bin", declared_type, size)
}

/// 6 MiB JPEG upload, one MiB over the ceiling
pub fn oversized_jpeg_upload() -> UploadedFile {
    unreadable_upload("image/jpeg", MAX_UPLOAD_BYTES + 1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frame_correct_size() {
        let frame = synthetic_frame(0, 320, 240);
        assert_eq!(frame.width, 320);
        assert_eq!(frame.height, 240);
        assert_eq!(frame.data.len(), frame.expected_len());
    }

    #[test]
    fn test_synthetic_frames_differ() {
        let frame0 = synthetic_frame(0, 32, 24);
        let frame1 = synthetic_frame(1, 32, 24);
        assert_ne!(frame0.data[0], frame1.data[0]);
    }

    #[test]
    fn test_synthetic_encodings_are_recognised() {
        assert_eq!(
            image::guess_format(&synthetic_jpeg_bytes(8, 8)).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert_eq!(
            image::guess_format(&synthetic_png_bytes(8, 8)).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[test]
    fn test_oversized_upload_is_six_mib() {
        assert_eq!(oversized_jpeg_upload().size, 6 * 1024 * 1024);
    }
}
