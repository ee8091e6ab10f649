//! Turning uploaded files into storable image payloads.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use wardrobe_closet::ImageData;

/// A raw uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk; the upload name is the file name component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| DecodeError::Io {
            name: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{0}: file is empty")]
    Empty(String),

    #[error("{0}: not a recognized image format")]
    UnsupportedFormat(String),

    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Produces a displayable image encoding from an upload.
#[async_trait]
pub trait FileDecoder: Send + Sync + std::fmt::Debug {
    async fn decode(&self, file: &UploadFile) -> Result<ImageData, DecodeError>;
}

/// Encodes uploads as base64 `data:` URIs after sniffing the image type.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlDecoder;

#[async_trait]
impl FileDecoder for DataUrlDecoder {
    async fn decode(&self, file: &UploadFile) -> Result<ImageData, DecodeError> {
        if file.bytes.is_empty() {
            return Err(DecodeError::Empty(file.name.clone()));
        }
        let mime = sniff_mime(&file.bytes)
            .or_else(|| mime_from_extension(&file.name))
            .ok_or_else(|| DecodeError::UnsupportedFormat(file.name.clone()))?;
        Ok(ImageData::from_bytes(mime, &file.bytes))
    }
}

/// Media type from magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, ..] => Some("image/png"),
        [0xff, 0xd8, 0xff, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'B', b'M', ..] if is_bmp(bytes) => Some("image/bmp"),
        _ => None,
    }
}

/// `BM` alone is too weak: require the file header's reserved words to be zero
/// and a known DIB header size to follow it.
fn is_bmp(bytes: &[u8]) -> bool {
    let [b'B', b'M', _, _, _, _, 0, 0, 0, 0, _, _, _, _, d0, d1, d2, d3, ..] = bytes else {
        return false;
    };
    matches!(
        u32::from_le_bytes([*d0, *d1, *d2, *d3]),
        12 | 40 | 52 | 56 | 64 | 108 | 124
    )
}

fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}
