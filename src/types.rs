use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Camera sensor preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front sensor, facing the user
    User,
    /// Rear sensor
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single RGB8 frame read from a live stream
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Byte length an RGB8 buffer of these dimensions must have
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Where a still image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Camera,
    Upload,
}

/// Still image held for verification, encoded bytes plus MIME type
#[derive(Clone)]
pub struct CapturedImage {
    pub id: Uuid,
    pub mime_type: String,
    pub bytes: Bytes,
    pub origin: ImageOrigin,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Bytes>, origin: ImageOrigin) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            origin,
            captured_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Parse a base64 data URI back into an image. Returns `None` for anything else.
    pub fn from_data_uri(uri: &str, origin: ImageOrigin) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        let bytes = STANDARD.decode(payload).ok()?;
        Some(Self::new(mime_type, bytes, origin))
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("id", &self.id)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("origin", &self.origin)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Backing bytes of a user-selected file
#[derive(Debug, Clone)]
pub enum UploadContent {
    Memory(Bytes),
    Path(PathBuf),
}

/// A user-selected file as reported by the host: declared type and length plus content
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub declared_type: String,
    pub size: u64,
    pub content: UploadContent,
}

impl UploadedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            size: bytes.len() as u64,
            content: UploadContent::Memory(bytes),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>, declared_type: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            declared_type: declared_type.into(),
            size,
            content: UploadContent::Path(path),
        }
    }

    /// Describe a file on disk, declaring its type from the extension.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let declared_type = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        Ok(Self::from_path(path, declared_type, metadata.len()))
    }
}

/// Body sent to the persistence endpoint after an accepted verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistRequest {
    pub image: String,
    pub age: u32,
}
