//! Image file decoding.
//!
//! Uploaded images are stored inline as `data:` URLs. Turning a file into
//! that payload is the only asynchronous step in the system: it either
//! resolves to a [`DecodedImage`] or fails, and a failed decode stores
//! nothing.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ImageConfig;
use crate::error::{Error, Result};

/// A decoded image ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// File name the image was read from.
    pub name: String,
    /// `data:<mime>;base64,<payload>` URL.
    pub data_url: String,
}

/// Turns image files into storable payloads.
#[async_trait::async_trait]
pub trait ImageDecoder: Send + Sync {
    /// Read and encode the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an accepted image.
    async fn decode(&self, path: &Path) -> Result<DecodedImage>;
}

/// Decoder reading image files from the local file system.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    max_file_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl FileDecoder {
    /// Create a decoder from the image configuration.
    #[must_use]
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    fn mime_for(&self, path: &Path) -> Result<&'static str> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| Error::UnsupportedImage {
                path: path.to_path_buf(),
            })?;

        if !self.allowed_extensions.contains(&ext) {
            return Err(Error::UnsupportedImage {
                path: path.to_path_buf(),
            });
        }

        mime_for_extension(&ext).ok_or_else(|| Error::UnsupportedImage {
            path: path.to_path_buf(),
        })
    }
}

impl Default for FileDecoder {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}

#[async_trait::async_trait]
impl ImageDecoder for FileDecoder {
    async fn decode(&self, path: &Path) -> Result<DecodedImage> {
        let mime = self.mime_for(path)?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::image_decode(path, e.to_string()))?;
        if !metadata.is_file() {
            return Err(Error::image_decode(path, "not a regular file"));
        }
        if metadata.len() > self.max_file_bytes {
            warn!(
                "Rejecting {} ({} bytes > {})",
                path.display(),
                metadata.len(),
                self.max_file_bytes
            );
            return Err(Error::ImageTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: self.max_file_bytes,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::image_decode(path, e.to_string()))?;
        if bytes.is_empty() {
            return Err(Error::image_decode(path, "file is empty"));
        }

        let name = file_name(path);
        debug!("Decoded {name} ({} bytes, {mime})", bytes.len());
        Ok(DecodedImage {
            name,
            data_url: encode_data_url(mime, &bytes),
        })
    }
}

/// MIME type for a lowercase image file extension.
#[must_use]
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Encode raw bytes as a base64 `data:` URL.
#[must_use]
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

fn data_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/]+={0,2})$")
            .expect("Invalid data URL pattern")
    })
}

/// Validate a caller-supplied image `data:` URL and return its MIME type.
///
/// # Errors
///
/// Returns [`Error::InvalidDataUrl`] if the URL is not a base64 image payload.
pub fn parse_data_url(data_url: &str) -> Result<&str> {
    let caps = data_url_pattern()
        .captures(data_url)
        .ok_or_else(|| Error::InvalidDataUrl(truncate(data_url, 40)))?;

    let payload = caps.get(2).map_or("", |m| m.as_str());
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidDataUrl(e.to_string()))?;

    Ok(caps.get(1).map_or("", |m| m.as_str()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Path helper used by the CLI for `--file` arguments.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
