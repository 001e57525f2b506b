//! Image preparation for upload: downscale, JPEG-encode, base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::ImageConfig;
use crate::error::AnalysisError;

/// MIME type of every prepared image.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// A JPEG ready to embed in a provider request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64-encoded JPEG bytes
    pub data: String,
    /// Always `image/jpeg`
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Downscales and encodes bitmaps before they are sent to a provider.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    max_dimension: u32,
    quality: u8,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}

impl ImageCodec {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// Resize so neither side exceeds `max_dimension`. Images already within
    /// bounds are returned untouched.
    pub fn resize(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        let (target_w, target_h) = fit_within(width, height, self.max_dimension);
        if (target_w, target_h) == (width, height) {
            return image.clone();
        }
        image.resize_exact(target_w, target_h, FilterType::Triangle)
    }

    /// Resize, encode as JPEG and base64 the result.
    pub fn encode(&self, image: &DynamicImage) -> Result<EncodedImage, AnalysisError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let resized = self.resize(image);
        let rgb = resized.to_rgb8();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode_image(&rgb)
            .map_err(|e| AnalysisError::InvalidImage(format!("JPEG encoding failed: {e}")))?;

        if bytes.is_empty() {
            return Err(AnalysisError::InvalidImage(
                "JPEG encoder produced no data".to_string(),
            ));
        }

        tracing::trace!(
            "Prepared {}x{} JPEG ({} bytes) from {}x{} source",
            rgb.width(),
            rgb.height(),
            bytes.len(),
            image.width(),
            image.height()
        );

        Ok(EncodedImage {
            data: BASE64.encode(&bytes),
            media_type: JPEG_MEDIA_TYPE,
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

/// Dimensions that fit inside a `max` x `max` box with aspect ratio kept.
///
/// The longer side becomes exactly `max`; the shorter side is rounded and
/// never drops below one pixel.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || longest == 0 {
        return (width, height);
    }
    let scale = max as f64 / longest as f64;
    let scaled = |side: u32| -> u32 {
        if side == longest {
            max
        } else {
            ((side as f64 * scale).round() as u32).max(1)
        }
    };
    (scaled(width), scaled(height))
}
