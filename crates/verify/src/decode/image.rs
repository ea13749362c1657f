//! QR decoding backed by `image` + `rqrr`.

use crate::decode::QrDecoder;
use crate::error::{ErrorKind, Result};
use std::path::Path;

/// Decodes QR codes from JPEG/PNG files the imaging devices produce.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl QrDecoder for ImageDecoder {
    fn decode(&self, image: &Path) -> Result<Vec<String>> {
        let luma = ::image::open(image)
            .map_err(|e| {
                tracing::debug!(path = %image.display(), error = %e, "image open failed");
                ErrorKind::UnreadableImage(image.to_path_buf())
            })?
            .to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(luma);
        let mut codes = Vec::new();
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => codes.push(content),
                // A grid that detects but doesn't decode (blur, glare) is
                // the same as no grid at all.
                Err(e) => tracing::debug!(path = %image.display(), error = %e, "undecodable grid"),
            }
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_decodes_to_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("blank.png");
        ::image::GrayImage::from_pixel(64, 64, ::image::Luma([255u8])).save(&path).unwrap();
        let codes = ImageDecoder.decode(&path).unwrap();
        assert!(codes.is_empty());
    }

    #[test]
    fn test_unreadable_file_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("not-an-image.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let err = ImageDecoder.decode(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnreadableImage(_)));
    }
}
