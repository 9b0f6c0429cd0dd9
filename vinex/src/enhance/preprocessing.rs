use std::io::Cursor;

use image::{GrayImage, ImageFormat, ImageReader, Luma};

use crate::error::{Result, VinexError};

/// Mean intensity above which an image is treated as overexposed.
pub const BRIGHT_MEAN_THRESHOLD: f64 = 120.0;
/// Mean intensity below which an image is treated as underexposed.
pub const DARK_MEAN_THRESHOLD: f64 = 80.0;

/// Exposure correction chosen from an image's mean intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureBranch {
    Bright,
    Dark,
    Neutral,
}

impl ExposureBranch {
    pub fn select(mean: f64) -> Self {
        if mean > BRIGHT_MEAN_THRESHOLD {
            Self::Bright
        } else if mean < DARK_MEAN_THRESHOLD {
            Self::Dark
        } else {
            Self::Neutral
        }
    }

    /// `(gain, offset)` applied as `gain * p + offset`.
    pub fn coefficients(self) -> (f64, f64) {
        match self {
            Self::Bright => (1.2, -20.0),
            Self::Dark => (1.4, 0.0),
            Self::Neutral => (1.2, 0.0),
        }
    }
}

pub fn mean_intensity(image: &GrayImage) -> f64 {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    sum as f64 / pixels.len() as f64
}

/// Exposure-normalize a grayscale image.
pub fn normalize(image: &GrayImage) -> GrayImage {
    let branch = ExposureBranch::select(mean_intensity(image));
    let (gain, offset) = branch.coefficients();

    let mut lut = [0u8; 256];
    for (p, out) in lut.iter_mut().enumerate() {
        *out = (gain * p as f64 + offset).clamp(0.0, 255.0).round_ties_even() as u8;
    }

    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
    output
}

/// Area-averaging downscale so that neither side exceeds `max_dim`.
///
/// Images already within bounds (or `max_dim == 0`) are returned unchanged.
pub fn downscale_to_fit(image: &GrayImage, max_dim: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if max_dim == 0 || longest <= max_dim {
        return image.clone();
    }

    let scaled = |dim: u32| ((u64::from(dim) * u64::from(max_dim)) / u64::from(longest)).max(1) as u32;
    let (new_width, new_height) = (scaled(width), scaled(height));

    let x_taps = area_taps(width, new_width);
    let y_taps = area_taps(height, new_height);

    // Horizontal pass into f32 rows, then vertical pass.
    let src = image.as_raw();
    let w = width as usize;
    let nw = new_width as usize;
    let mut horizontal = vec![0f32; nw * height as usize];
    for y in 0..height as usize {
        let row = &src[y * w..(y + 1) * w];
        for (x, taps) in x_taps.iter().enumerate() {
            horizontal[y * nw + x] = taps.iter().map(|&(i, wt)| f32::from(row[i]) * wt).sum();
        }
    }

    let mut output = GrayImage::new(new_width, new_height);
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..nw {
            let v: f32 = taps.iter().map(|&(i, wt)| horizontal[i * nw + x] * wt).sum();
            output.put_pixel(x as u32, y as u32, Luma([v.round().clamp(0.0, 255.0) as u8]));
        }
    }
    output
}

/// Source indices and weights averaged into each destination sample.
fn area_taps(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|d| {
            let start = f64::from(d) * scale;
            let end = (start + scale).min(f64::from(src_len));
            let mut taps = Vec::with_capacity(scale.ceil() as usize + 1);
            let mut s = start.floor() as usize;
            while (s as f64) < end {
                let lo = start.max(s as f64);
                let hi = end.min(s as f64 + 1.0);
                if hi > lo {
                    taps.push((s, ((hi - lo) / scale) as f32));
                }
                s += 1;
            }
            taps
        })
        .collect()
}

/// Decode any raster format the `image` crate recognises into 8-bit gray.
pub fn decode(bytes: &[u8]) -> Result<GrayImage> {
    if bytes.is_empty() {
        return Err(VinexError::Decode("empty image payload".to_string()));
    }
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| VinexError::Decode(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|e| VinexError::Decode(format!("Failed to decode image: {e}")))?
        .to_luma8();

    if image.width() == 0 || image.height() == 0 {
        return Err(VinexError::Decode("image has no pixels".to_string()));
    }
    Ok(image)
}

pub fn ensure_min_dimension(image: &GrayImage, min_dim: u32) -> Result<()> {
    let (width, height) = image.dimensions();
    if width < min_dim || height < min_dim {
        return Err(VinexError::Validation(format!(
            "Image too small: {width}x{height}, minimum {min_dim}x{min_dim}"
        )));
    }
    Ok(())
}

pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| VinexError::Internal(format!("Failed to encode image: {e}")))?;
    Ok(output)
}
