//! Residual convolutional denoising.
//!
//! Production weights are an ONNX export run through `ort`. A small native
//! backend ([`DenoiseModel`]) evaluates convolution stacks in process and
//! backs the tests. A [`DenoiseEngine`] handle only exists once a model has
//! been loaded and validated.

mod conv;
mod model;
mod onnx;
pub mod weights;

use std::sync::Arc;

use image::{GrayImage, Luma};
use ndarray::{Array4, Axis};
use tokio::sync::OnceCell;

use crate::config::{ModelConfig, ModelOutput};
use crate::error::{Result, VinexError};

pub use conv::conv2d;
pub use model::{Activation, ConvLayer, DenoiseModel};
pub use onnx::OnnxDenoiser;

static SHARED: OnceCell<DenoiseEngine> = OnceCell::const_new();

#[derive(Debug)]
enum Backend {
    Onnx(OnnxDenoiser),
    Native(DenoiseModel),
}

#[derive(Debug, Clone)]
pub struct DenoiseEngine {
    backend: Arc<Backend>,
    output: ModelOutput,
}

impl DenoiseEngine {
    /// Resolve, verify and open the configured ONNX model.
    pub async fn load(config: &ModelConfig) -> Result<Self> {
        let bytes = weights::fetch(config).await?;
        let threads = config.threads;
        let denoiser = tokio::task::spawn_blocking(move || OnnxDenoiser::from_bytes(&bytes, threads))
            .await
            .map_err(|e| VinexError::ModelLoad(format!("model loader failed: {e}")))??;

        tracing::info!(
            weights = %config.weights,
            output = ?config.output,
            "Loaded denoise model"
        );

        Ok(Self {
            backend: Arc::new(Backend::Onnx(denoiser)),
            output: config.output,
        })
    }

    /// Process-wide engine. The first caller loads; concurrent callers wait
    /// for that load and share its result. A failed load is not cached.
    pub async fn shared(config: &ModelConfig) -> Result<Self> {
        SHARED
            .get_or_try_init(|| Self::load(config))
            .await
            .cloned()
    }

    /// Wrap an in-process network that predicts the noise residual.
    pub fn from_model(model: DenoiseModel) -> Self {
        Self {
            backend: Arc::new(Backend::Native(model)),
            output: ModelOutput::Residual,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend.as_ref() {
            Backend::Onnx(_) => "onnx",
            Backend::Native(_) => "native",
        }
    }

    pub fn output(&self) -> ModelOutput {
        self.output
    }

    /// Whether two handles share the same loaded model.
    pub fn same_model(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    /// Denoise an image of any size. CPU bound; call off the async executor.
    pub fn infer(&self, image: &GrayImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        let input = Array4::from_shape_fn(
            (1, 1, height as usize, width as usize),
            |(_, _, y, x)| f32::from(image.get_pixel(x as u32, y as u32)[0]) / 255.0,
        );

        let output = self.infer_tensor(input)?;

        // Truncating quantization, same as a uint8 cast of the clipped float.
        Ok(GrayImage::from_fn(width, height, |x, y| {
            let v = output[[0, 0, y as usize, x as usize]];
            Luma([(v.clamp(0.0, 1.0) * 255.0) as u8])
        }))
    }

    /// Run the network on a `(1, 1, H, W)` tensor with values in `[0, 1]`.
    ///
    /// Returns the clean image clipped to `[0, 1]` with the same shape. For
    /// residual models that is `clip(input - residual, 0, 1)`.
    pub fn infer_tensor(&self, input: Array4<f32>) -> Result<Array4<f32>> {
        let (batch, channels, height, width) = input.dim();
        if batch != 1 {
            return Err(VinexError::InferenceShape(format!(
                "batch size must be 1, got {batch}"
            )));
        }
        if channels != 1 {
            return Err(VinexError::InferenceShape(format!(
                "model takes 1 channel, got {channels}"
            )));
        }
        if height == 0 || width == 0 {
            return Err(VinexError::InferenceShape(format!(
                "spatial dimensions must be non-zero, got {height}x{width}"
            )));
        }

        let raw = match self.backend.as_ref() {
            Backend::Onnx(denoiser) => denoiser.run(&input)?,
            Backend::Native(model) => model
                .residual(&input.index_axis(Axis(0), 0).to_owned())
                .insert_axis(Axis(0)),
        };

        let clean = match self.output {
            ModelOutput::Denoised => raw,
            ModelOutput::Residual => &input - &raw,
        };
        Ok(clean.mapv_into(|v| v.clamp(0.0, 1.0)))
    }
}
