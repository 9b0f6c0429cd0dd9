use std::fmt;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::{Result, VinexError};

/// An ONNX denoising graph with one `(1, 1, H, W)` float input and one output
/// of the same shape.
pub struct OnnxDenoiser {
    // `Session::run` takes `&mut self`.
    session: Mutex<Session>,
}

impl fmt::Debug for OnnxDenoiser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxDenoiser").finish_non_exhaustive()
    }
}

impl OnnxDenoiser {
    /// Build a session from serialized model bytes. `threads == 0` keeps the
    /// runtime's default intra-op pool.
    pub fn from_bytes(bytes: &[u8], threads: usize) -> Result<Self> {
        let mut builder = Session::builder()
            .map_err(|e| VinexError::ModelLoad(format!("ONNX runtime init failed: {e}")))?;
        if threads > 0 {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| VinexError::ModelLoad(format!("ONNX thread setup failed: {e}")))?;
        }
        let session = builder
            .commit_from_memory(bytes)
            .map_err(|e| VinexError::ModelLoad(format!("ONNX load failed: {e}")))?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Run the graph and return its first output, checked against the input shape.
    pub fn run(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let (batch, channels, height, width) = input.dim();
        let tensor = TensorRef::from_array_view(input)
            .map_err(|e| VinexError::Internal(format!("input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VinexError::Internal("ONNX session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VinexError::Internal(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VinexError::Internal(format!("output extraction: {e}")))?;

        let expected = [batch, channels, height, width].map(|d| d as i64);
        if shape.len() != 4 || shape[..] != expected[..] {
            return Err(VinexError::InferenceShape(format!(
                "model returned shape {shape:?}, expected {expected:?}"
            )));
        }

        Array4::from_shape_vec((batch, channels, height, width), data.to_vec())
            .map_err(|e| VinexError::InferenceShape(e.to_string()))
    }
}
