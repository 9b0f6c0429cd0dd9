use ndarray::{Array2, Array3};

use super::model::ConvLayer;

/// Output rows lowered to a patch matrix at a time. Bounds the im2col buffer
/// to `in * k * k * BAND_ROWS * width` floats.
const BAND_ROWS: usize = 16;

/// Same-padded, stride-1 convolution of a `(channels, height, width)` map.
///
/// Pixels outside the image read as zero. Bias and activation are applied to
/// the result.
pub fn conv2d(input: &Array3<f32>, layer: &ConvLayer) -> Array3<f32> {
    let (channels, height, width) = input.dim();
    debug_assert_eq!(channels, layer.in_channels());

    let k = layer.kernel();
    let pad = (k / 2) as isize;
    let out_channels = layer.out_channels();
    let mut output = Array3::<f32>::zeros((out_channels, height, width));

    let mut row0 = 0;
    while row0 < height {
        let rows = BAND_ROWS.min(height - row0);
        let mut cols = Array2::<f32>::zeros((channels * k * k, rows * width));

        for c in 0..channels {
            for ky in 0..k {
                for kx in 0..k {
                    let r = (c * k + ky) * k + kx;
                    for y in 0..rows {
                        let sy = (row0 + y) as isize + ky as isize - pad;
                        if sy < 0 || sy >= height as isize {
                            continue;
                        }
                        for x in 0..width {
                            let sx = x as isize + kx as isize - pad;
                            if sx < 0 || sx >= width as isize {
                                continue;
                            }
                            cols[[r, y * width + x]] = input[[c, sy as usize, sx as usize]];
                        }
                    }
                }
            }
        }

        let product = layer.weights().dot(&cols);
        let activation = layer.activation();
        for o in 0..out_channels {
            let bias = layer.bias().map_or(0.0, |b| b[o]);
            for y in 0..rows {
                for x in 0..width {
                    output[[o, row0 + y, x]] = activation.apply(product[[o, y * width + x]] + bias);
                }
            }
        }

        row0 += rows;
    }

    output
}
