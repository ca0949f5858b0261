use std::io::Cursor;

use anyhow::Context;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use crate::{ImagePayload, ImageRequest, ImageService, ServiceError};

const DRYRUN_SIZE: u32 = 64;

/// Offline stand-in: a solid swatch whose color is derived from the request.
pub struct DryrunImageService;

impl ImageService for DryrunImageService {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &ImageRequest) -> Result<ImagePayload, ServiceError> {
        let (r, g, b) = color_from_prompt(&request.prompt, &request.api_key);
        let mut image = RgbImage::new(DRYRUN_SIZE, DRYRUN_SIZE);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode dryrun image")?;
        Ok(ImagePayload::new("image/png", bytes))
    }
}

fn color_from_prompt(prompt: &str, api_key: &str) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(api_key.as_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}

#[cfg(test)]
mod tests {
    use animefusion_contracts::ViewAngle;

    use super::*;

    fn request(prompt: &str) -> ImageRequest {
        ImageRequest {
            prompt: prompt.to_string(),
            model: "dryrun-image-1".to_string(),
            api_key: "key".to_string(),
            view: ViewAngle::Front,
        }
    }

    #[test]
    fn dryrun_returns_png_bytes() -> anyhow::Result<()> {
        let payload = DryrunImageService.generate(&request("a"))?;
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(&payload.bytes[..4], &[0x89, b'P', b'N', b'G']);

        let decoded = image::load_from_memory(&payload.bytes)?;
        assert_eq!(decoded.width(), DRYRUN_SIZE);
        Ok(())
    }

    #[test]
    fn dryrun_is_deterministic_per_prompt() -> anyhow::Result<()> {
        let first = DryrunImageService.generate(&request("front"))?;
        let again = DryrunImageService.generate(&request("front"))?;
        let other = DryrunImageService.generate(&request("back"))?;
        assert_eq!(first, again);
        assert_ne!(first, other);
        Ok(())
    }
}
