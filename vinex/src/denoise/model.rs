use ndarray::{Array1, Array2, Array3};

use super::conv::conv2d;
use crate::error::{Result, VinexError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    None,
    Relu,
}

impl Activation {
    #[inline]
    pub fn apply(self, v: f32) -> f32 {
        match self {
            Self::None => v,
            Self::Relu => v.max(0.0),
        }
    }
}

/// One same-padded 2-D convolution with its activation.
#[derive(Debug, Clone)]
pub struct ConvLayer {
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    /// Filter bank flattened to `(out, in * k * k)`.
    weights: Array2<f32>,
    bias: Option<Array1<f32>>,
    activation: Activation,
}

impl ConvLayer {
    /// `weights` is laid out `out × in × k × k`, row-major.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        weights: Vec<f32>,
        bias: Option<Vec<f32>>,
        activation: Activation,
    ) -> Result<Self> {
        if in_channels == 0 || out_channels == 0 {
            return Err(VinexError::ModelLoad(
                "layer channel counts must be non-zero".to_string(),
            ));
        }
        if kernel == 0 || kernel % 2 == 0 {
            return Err(VinexError::ModelLoad(format!(
                "kernel size must be odd, got {kernel}"
            )));
        }

        let patch = in_channels * kernel * kernel;
        let weights = Array2::from_shape_vec((out_channels, patch), weights).map_err(|e| {
            VinexError::ModelLoad(format!(
                "expected {} weights for a {out_channels}x{in_channels}x{kernel}x{kernel} layer: {e}",
                out_channels * patch
            ))
        })?;

        let bias = match bias {
            Some(b) if b.len() != out_channels => {
                return Err(VinexError::ModelLoad(format!(
                    "expected {out_channels} bias values, got {}",
                    b.len()
                )))
            }
            Some(b) => Some(Array1::from(b)),
            None => None,
        };

        Ok(Self {
            in_channels,
            out_channels,
            kernel,
            weights,
            bias,
            activation,
        })
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn kernel(&self) -> usize {
        self.kernel
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn bias(&self) -> Option<&Array1<f32>> {
        self.bias.as_ref()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

/// Frozen residual denoiser: a head, body and tail of convolutions mapping a
/// one-channel image to its predicted noise.
#[derive(Debug, Clone)]
pub struct DenoiseModel {
    layers: Vec<ConvLayer>,
}

impl DenoiseModel {
    pub fn new(layers: Vec<ConvLayer>) -> Result<Self> {
        if layers.len() < 2 {
            return Err(VinexError::ModelLoad(format!(
                "model needs at least a head and a tail layer, got {}",
                layers.len()
            )));
        }
        if layers[0].in_channels != 1 {
            return Err(VinexError::ModelLoad(format!(
                "head layer must take 1 channel, takes {}",
                layers[0].in_channels
            )));
        }
        let tail = &layers[layers.len() - 1];
        if tail.out_channels != 1 {
            return Err(VinexError::ModelLoad(format!(
                "tail layer must produce 1 channel, produces {}",
                tail.out_channels
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].out_channels != pair[1].in_channels {
                return Err(VinexError::ModelLoad(format!(
                    "layer {} produces {} channels but layer {} takes {}",
                    i,
                    pair[0].out_channels,
                    i + 1,
                    pair[1].in_channels
                )));
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[ConvLayer] {
        &self.layers
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.bias.as_ref().map_or(0, |b| b.len()))
            .sum()
    }

    /// Predicted noise for a `(1, height, width)` map.
    pub fn residual(&self, input: &Array3<f32>) -> Array3<f32> {
        self.layers
            .iter()
            .fold(input.clone(), |features, layer| conv2d(&features, layer))
    }
}
