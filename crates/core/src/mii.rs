//! Mii payload extraction.
//!
//! A mii arrives either as base64 text, as a raw binary upload, or as an
//! image containing a QR code whose payload is the binary. All three end up
//! as the same base64 string when the decoded blob is exactly
//! [`MII_DATA_LEN`] bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Size of a mii blob in bytes.
pub const MII_DATA_LEN: usize = 112;

/// MIME type that marks an upload as raw binary.
const OCTET_STREAM: &str = "application/octet-stream";

/// Filename extension that marks an upload as raw binary.
const BINARY_EXTENSION: &str = ".bin";

/// A file uploaded alongside a form submission.
#[derive(Debug, Clone, Default)]
pub struct MiiUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MiiUpload {
    /// Whether the upload should be used as-is rather than scanned as an image.
    pub fn is_raw_binary(&self) -> bool {
        let declared_binary = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.eq_ignore_ascii_case(OCTET_STREAM));
        let binary_name = self
            .filename
            .as_deref()
            .is_some_and(|name| name.to_lowercase().ends_with(BINARY_EXTENSION));
        declared_binary || binary_name
    }
}

/// Why an image could not be turned into a QR payload.
#[derive(Debug, thiserror::Error)]
pub enum QrScanError {
    #[error("Could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Found a QR code but could not decode it: {0}")]
    CodeDecode(String),
}

/// Scan an encoded image for a QR code and return its raw payload.
///
/// `Ok(None)` means the image decoded fine but contained no code.
pub fn scan_qr_payload(bytes: &[u8]) -> Result<Option<Vec<u8>>, QrScanError> {
    let luma = image::load_from_memory(bytes)?.to_luma8();
    let (width, height) = luma.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            luma.get_pixel(x as u32, y as u32).0[0]
        });

    let grids = prepared.detect_grids();
    let Some(grid) = grids.first() else {
        return Ok(None);
    };

    let mut payload = Vec::new();
    grid.decode_to(&mut payload)
        .map_err(|e| QrScanError::CodeDecode(format!("{e:?}")))?;
    Ok(Some(payload))
}

/// Base64-encode `raw` if it has the mii length.
pub fn encode_mii(raw: &[u8]) -> Option<String> {
    (raw.len() == MII_DATA_LEN).then(|| STANDARD.encode(raw))
}

/// Validate base64 mii text, returning its canonical encoding.
pub fn normalize_mii_base64(text: &str) -> Option<String> {
    let raw = STANDARD.decode(text.trim()).ok()?;
    encode_mii(&raw)
}

/// Extract a mii from an upload. Scan failures are swallowed and logged;
/// callers only see whether a valid mii came out.
pub fn extract_mii(upload: &MiiUpload) -> Option<String> {
    if upload.is_raw_binary() {
        return encode_mii(&upload.bytes);
    }

    match scan_qr_payload(&upload.bytes) {
        Ok(Some(payload)) => encode_mii(&payload),
        Ok(None) => {
            tracing::debug!(filename = ?upload.filename, "No QR code found in mii upload");
            None
        }
        Err(e) => {
            tracing::debug!(filename = ?upload.filename, error = %e, "Mii image scan failed");
            None
        }
    }
}
