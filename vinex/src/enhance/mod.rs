//! Document enhancement: exposure normalization, residual denoising, then
//! sharpening and local contrast equalization.

pub mod postprocessing;
pub mod preprocessing;

use image::GrayImage;

use crate::denoise::DenoiseEngine;
use crate::error::{Result, VinexError};

pub use postprocessing::{clahe, finish, sharpen};
pub use preprocessing::{decode, downscale_to_fit, encode_png, normalize, ExposureBranch};

/// Cheap to clone; every clone shares the loaded model.
#[derive(Debug, Clone)]
pub struct Enhancer {
    engine: DenoiseEngine,
}

impl Enhancer {
    pub fn new(engine: DenoiseEngine) -> Self {
        Self { engine }
    }

    /// Full pipeline on the calling thread.
    pub fn enhance_blocking(&self, image: &GrayImage) -> Result<GrayImage> {
        let normalized = normalize(image);
        let denoised = self.engine.infer(&normalized)?;
        Ok(finish(&denoised))
    }

    /// Full pipeline on the blocking thread pool.
    pub async fn enhance(&self, image: GrayImage) -> Result<GrayImage> {
        let enhancer = self.clone();
        let (width, height) = image.dimensions();
        let started = std::time::Instant::now();

        let enhanced = tokio::task::spawn_blocking(move || enhancer.enhance_blocking(&image))
            .await
            .map_err(|e| VinexError::Internal(format!("Enhancement worker failed: {e}")))??;

        tracing::debug!(
            width,
            height,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enhanced image"
        );
        Ok(enhanced)
    }
}
