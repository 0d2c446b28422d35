//! Transport payload encoding.
//!
//! Every image is decoded and re-encoded as an RGB JPEG before it is sent to
//! the model, whatever its container. Decoding runs on the blocking pool.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;

use crate::error::PipelineError;
use crate::llm::ImagePayload;

/// Turns image files into base64 JPEG payloads.
#[derive(Debug, Clone, Copy)]
pub struct PayloadEncoder {
    quality: u8,
}

impl PayloadEncoder {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Read, decode and re-encode the file at `path`.
    pub async fn encode(&self, path: &Path) -> Result<ImagePayload, PipelineError> {
        let path_owned = path.to_path_buf();
        let quality = self.quality;

        tokio::task::spawn_blocking(move || Self::encode_sync(&path_owned, quality))
            .await
            .map_err(|e| PipelineError::Encode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            })?
    }

    /// Synchronous encode (runs in spawn_blocking).
    fn encode_sync(path: &Path, quality: u8) -> Result<ImagePayload, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let encode_err = |message: String| PipelineError::Encode {
            path: path.to_path_buf(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| encode_err(e.to_string()))?;
        let image = image::load_from_memory(&bytes).map_err(|e| encode_err(e.to_string()))?;

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut jpeg = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))
            .map_err(|e| encode_err(format!("JPEG encode: {}", e)))?;

        tracing::trace!(
            "Encoded payload for {:?}: {} -> {} bytes",
            path,
            bytes.len(),
            jpeg.len()
        );
        Ok(ImagePayload::from_jpeg_bytes(&jpeg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::metadata::test_images::png_rgba_bytes;
    use base64::Engine;

    #[tokio::test]
    async fn test_png_becomes_jpeg_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        std::fs::write(&path, png_rgba_bytes(12, 9)).unwrap();

        let payload = PayloadEncoder::new(100).encode(&path).await.unwrap();
        let jpeg = base64::engine::general_purpose::STANDARD
            .decode(&payload.data)
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert!(payload.data_url().starts_with("data:image/jpeg;base64,/9j/"));

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 9));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = PayloadEncoder::new(100)
            .encode(Path::new("/nonexistent/photo.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_undecodable_file_is_encode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let err = PayloadEncoder::new(100).encode(&path).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Encode);
    }
}
