//! QR decoding from image content.
//!
//! A decoder turns an image file into zero or more identifier candidates.
//! An image without any readable QR code is a perfectly normal result, not
//! an error; only a file that can't be opened or parsed at all errors.

#[cfg(feature = "qr")]
mod image;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "qr")]
pub use self::image::ImageDecoder;
#[cfg(feature = "mock")]
pub use self::mock::MockDecoder;
use crate::error::Result;
use std::path::Path;

/// Extract identifier candidates from an image file.
///
/// Decoding is CPU-bound and synchronous; the intake pipeline is
/// sequential anyway and calls this inline.
pub trait QrDecoder: Send + Sync {
    /// Zero or more decoded strings, in detection order.
    fn decode(&self, image: &Path) -> Result<Vec<String>>;
}
