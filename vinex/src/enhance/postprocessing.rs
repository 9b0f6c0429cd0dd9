use image::{imageops, GrayImage, Luma};

pub const BLUR_SIGMA: f32 = 1.0;
pub const SHARPEN_AMOUNT: f32 = 1.5;
pub const CLAHE_TILES: u32 = 8;
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;

/// Unsharp mask: `1.5 * original - 0.5 * gaussian(original)`.
pub fn sharpen(image: &GrayImage) -> GrayImage {
    let blurred = imageops::blur(image, BLUR_SIGMA);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([unsharp(image.get_pixel(x, y)[0], blurred.get_pixel(x, y)[0])])
    })
}

/// One unsharp-mask sample on the `[0, 1]` scale, clipped then truncated.
fn unsharp(original: u8, blurred: u8) -> u8 {
    let amount = f64::from(SHARPEN_AMOUNT);
    let o = f64::from(original) / 255.0;
    let b = f64::from(blurred) / 255.0;
    let v = amount * o - (amount - 1.0) * b;
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

/// Contrast-limited adaptive histogram equalization.
///
/// Each of the `tiles_x * tiles_y` tiles gets its own clipped-histogram
/// mapping; pixels blend the mappings of the four nearest tile centres.
/// Images smaller than one pixel per tile are returned unchanged.
pub fn clahe(image: &GrayImage, tiles_x: u32, tiles_y: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || tiles_x == 0 || tiles_y == 0 {
        return image.clone();
    }
    let (w, h) = (width as usize, height as usize);
    let (tiles_x, tiles_y) = (tiles_x as usize, tiles_y as usize);
    let tile_w = w / tiles_x;
    let tile_h = h / tiles_y;
    if tile_w == 0 || tile_h == 0 {
        return image.clone();
    }

    let src = image.as_raw();
    let mut maps = vec![[0u8; 256]; tiles_x * tiles_y];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles_x - 1 { w } else { x0 + tile_w };
            let y1 = if ty == tiles_y - 1 { h } else { y0 + tile_h };
            let tile_pixels = (x1 - x0) * (y1 - y0);

            let mut hist = [0u32; 256];
            for row in y0..y1 {
                for &p in &src[row * w + x0..row * w + x1] {
                    hist[p as usize] += 1;
                }
            }

            let clip = ((clip_limit * tile_pixels as f32 / 256.0) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let per_bin = excess / 256;
            let remainder = (excess % 256) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += per_bin;
                if i < remainder {
                    *bin += 1;
                }
            }

            let scale = 255.0 / tile_pixels as f32;
            let map = &mut maps[ty * tiles_x + tx];
            let mut cdf = 0u32;
            for (i, &count) in hist.iter().enumerate() {
                cdf += count;
                map[i] = (cdf as f32 * scale).round().min(255.0) as u8;
            }
        }
    }

    let tw = tile_w as f32;
    let th = tile_h as f32;
    let last_tx = tiles_x as i64 - 1;
    let last_ty = tiles_y as i64 - 1;
    let mut output = GrayImage::new(width, height);

    for y in 0..h {
        let fy = (y as f32 + 0.5) / th - 0.5;
        let fy_floor = fy.floor();
        let ty0 = (fy_floor as i64).clamp(0, last_ty) as usize;
        let ty1 = (fy_floor as i64 + 1).clamp(0, last_ty) as usize;
        let ay = fy - fy_floor;

        for x in 0..w {
            let fx = (x as f32 + 0.5) / tw - 0.5;
            let fx_floor = fx.floor();
            let tx0 = (fx_floor as i64).clamp(0, last_tx) as usize;
            let tx1 = (fx_floor as i64 + 1).clamp(0, last_tx) as usize;
            let ax = fx - fx_floor;

            let p = src[y * w + x] as usize;
            let v00 = f32::from(maps[ty0 * tiles_x + tx0][p]);
            let v10 = f32::from(maps[ty0 * tiles_x + tx1][p]);
            let v01 = f32::from(maps[ty1 * tiles_x + tx0][p]);
            let v11 = f32::from(maps[ty1 * tiles_x + tx1][p]);

            let top = v00 + (v10 - v00) * ax;
            let bottom = v01 + (v11 - v01) * ax;
            let v = top + (bottom - top) * ay;
            output.put_pixel(x as u32, y as u32, Luma([v.round().clamp(0.0, 255.0) as u8]));
        }
    }

    output
}

/// Sharpen, then equalize local contrast.
pub fn finish(image: &GrayImage) -> GrayImage {
    clahe(&sharpen(image), CLAHE_TILES, CLAHE_TILES, CLAHE_CLIP_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpen_keeps_flat_regions() {
        let image = GrayImage::from_pixel(12, 12, Luma([77]));
        assert!(sharpen(&image).pixels().all(|p| p[0].abs_diff(77) <= 1));
    }

    #[test]
    fn test_unsharp_truncates_and_clips() {
        // 1.5 * 101 - 0.5 * 100 = 101.5
        assert_eq!(unsharp(101, 100), 101);
        assert_eq!(unsharp(0, 200), 0);
        assert_eq!(unsharp(255, 0), 255);
    }

    #[test]
    fn test_sharpen_increases_edge_contrast() {
        let image = GrayImage::from_fn(20, 4, |x, _| Luma([if x < 10 { 60 } else { 180 }]));
        let out = sharpen(&image);
        assert!(out.get_pixel(9, 2)[0] < 60, "dark side of edge should darken");
        assert!(out.get_pixel(10, 2)[0] > 180, "bright side of edge should brighten");
        assert!(out.get_pixel(0, 2)[0].abs_diff(60) <= 1);
    }

    #[test]
    fn test_clahe_preserves_dimensions() {
        let image = GrayImage::from_fn(80, 60, |x, y| Luma([((x * y) % 256) as u8]));
        assert_eq!(clahe(&image, 8, 8, 2.0).dimensions(), (80, 60));
    }

    #[test]
    fn test_clahe_uniform_image_stays_uniform() {
        let image = GrayImage::from_pixel(64, 64, Luma([128]));
        let out = clahe(&image, 8, 8, 2.0);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_clahe_stretches_low_contrast() {
        let image = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x % 8) as u8]));
        let out = clahe(&image, 8, 8, 2.0);
        let (min, max) = out
            .pixels()
            .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        assert!(max - min > 7, "range {min}..{max} should widen");
    }

    #[test]
    fn test_clahe_tiny_image_is_returned_unchanged() {
        let image = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 10 + y) as u8]));
        assert_eq!(clahe(&image, 8, 8, 2.0), image);
    }

    #[test]
    fn test_finish_is_deterministic() {
        let image = GrayImage::from_fn(48, 32, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        assert_eq!(finish(&image), finish(&image));
    }
}
