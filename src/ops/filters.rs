// ============================================================================
// FILTER OPERATIONS — grayscale / sepia / invert / blur / sharpen
// ============================================================================
//
// All filters are pure functions on a buffer plus layer-targeted wrappers.
// Neighborhood filters (blur, sharpen) read the source buffer while writing
// a fresh one, row-parallel via rayon.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::CanvasState;
use crate::ops::adjustments::transform_pixels;

pub const DEFAULT_BLUR_RADIUS: u32 = 2;

/// Per-pixel perceptual luma replace (Rec.601 weights). Alpha preserved.
pub fn grayscale_buffer(src: &RgbaImage) -> RgbaImage {
    transform_pixels(src, |r, g, b, a| {
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        (luma, luma, luma, a)
    })
}

/// Fixed 3×3 sepia transform, channels clamped (not wrapped). Alpha preserved.
pub fn sepia_buffer(src: &RgbaImage) -> RgbaImage {
    transform_pixels(src, |r, g, b, a| {
        let tr = 0.393 * r + 0.769 * g + 0.189 * b;
        let tg = 0.349 * r + 0.686 * g + 0.168 * b;
        let tb = 0.272 * r + 0.534 * g + 0.131 * b;
        (tr.min(255.0), tg.min(255.0), tb.min(255.0), a)
    })
}

/// RGB inversion. Alpha preserved.
pub fn invert_buffer(src: &RgbaImage) -> RgbaImage {
    transform_pixels(src, |r, g, b, a| (255.0 - r, 255.0 - g, 255.0 - b, a))
}

/// Box blur: every pixel becomes the unweighted average of the
/// `(2*radius+1)²` window clipped to the buffer bounds. Edge pixels average
/// fewer samples; nothing is wrapped or mirrored.
pub fn box_blur_buffer(src: &RgbaImage, radius: u32) -> RgbaImage {
    let w = src.width() as i64;
    let h = src.height() as i64;
    if w == 0 || h == 0 || radius == 0 {
        return src.clone();
    }
    let r = radius as i64;

    let src_raw = src.as_raw();
    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; src_raw.len()];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let y = y as i64;
        let y0 = (y - r).max(0);
        let y1 = (y + r).min(h - 1);
        for x in 0..w {
            let x0 = (x - r).max(0);
            let x1 = (x + r).min(w - 1);

            let mut sum = [0u32; 4];
            for sy in y0..=y1 {
                let row = &src_raw[sy as usize * stride..(sy as usize + 1) * stride];
                for sx in x0..=x1 {
                    let pi = sx as usize * 4;
                    sum[0] += row[pi] as u32;
                    sum[1] += row[pi + 1] as u32;
                    sum[2] += row[pi + 2] as u32;
                    sum[3] += row[pi + 3] as u32;
                }
            }
            let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as u32;
            let pi = x as usize * 4;
            for c in 0..4 {
                row_out[pi + c] = ((sum[c] + count / 2) / count) as u8;
            }
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}

/// Fixed 5-tap sharpen: `out = 5*center - top - left - right - bottom`,
/// clamped per channel. Border pixels are left unmodified (the kernel needs
/// the full neighborhood).
pub fn sharpen_buffer(src: &RgbaImage) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w < 3 || h < 3 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = src_raw.clone();

    dst_raw[stride..(h - 1) * stride]
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row_out)| {
            let y = i + 1;
            let above = &src_raw[(y - 1) * stride..y * stride];
            let center = &src_raw[y * stride..(y + 1) * stride];
            let below = &src_raw[(y + 1) * stride..(y + 2) * stride];
            for x in 1..w - 1 {
                let pi = x * 4;
                for c in 0..3 {
                    let v = 5 * center[pi + c] as i32
                        - above[pi + c] as i32
                        - below[pi + c] as i32
                        - center[pi - 4 + c] as i32
                        - center[pi + 4 + c] as i32;
                    row_out[pi + c] = v.clamp(0, 255) as u8;
                }
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}

// ============================================================================
// LAYER-TARGETED WRAPPERS — out-of-range index is a no-op
// ============================================================================

pub fn grayscale(state: &mut CanvasState, layer_idx: usize) {
    apply_filter(state, layer_idx, grayscale_buffer);
}

pub fn sepia(state: &mut CanvasState, layer_idx: usize) {
    apply_filter(state, layer_idx, sepia_buffer);
}

pub fn invert(state: &mut CanvasState, layer_idx: usize) {
    apply_filter(state, layer_idx, invert_buffer);
}

pub fn box_blur(state: &mut CanvasState, layer_idx: usize, radius: u32) {
    apply_filter(state, layer_idx, |src| box_blur_buffer(src, radius));
}

pub fn sharpen(state: &mut CanvasState, layer_idx: usize) {
    apply_filter(state, layer_idx, sharpen_buffer);
}

fn apply_filter<F>(state: &mut CanvasState, layer_idx: usize, filter: F)
where
    F: Fn(&RgbaImage) -> RgbaImage,
{
    if layer_idx >= state.layers.len() {
        return;
    }
    state.layers[layer_idx].pixels = filter(&state.layers[layer_idx].pixels);
    state.mark_modified();
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn test_image(w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::new(w, h);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([
                (x * 31 % 256) as u8,
                (y * 67 % 256) as u8,
                ((x * y + 5) % 256) as u8,
                255,
            ]);
        }
        img
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let out = grayscale_buffer(&test_image(8, 8));
        for p in out.pixels() {
            assert_eq!(p[0], p[1]);
            assert_eq!(p[1], p[2]);
            assert_eq!(p[3], 255);
        }
    }

    #[test]
    fn sepia_clamps_instead_of_wrapping() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let out = sepia_buffer(&img);
        // white saturates the red and green rows of the matrix
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 239, 255]));
    }

    #[test]
    fn invert_is_its_own_inverse() {
        let img = test_image(6, 6);
        assert_eq!(invert_buffer(&invert_buffer(&img)), img);
    }

    #[test]
    fn blur_of_uniform_image_is_identity() {
        let img = RgbaImage::from_pixel(9, 9, Rgba([42, 81, 12, 255]));
        assert_eq!(box_blur_buffer(&img, DEFAULT_BLUR_RADIUS), img);
    }

    #[test]
    fn blur_edge_pixels_average_clipped_window() {
        // single white pixel at the corner of a black image, radius 1:
        // corner window covers 4 pixels, so the corner becomes 255/4
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        let out = box_blur_buffer(&img, 1);
        let p = out.get_pixel(0, 0);
        assert_eq!(p[0], 64); // round(255/4)
    }

    #[test]
    fn blur_radius_zero_is_noop() {
        let img = test_image(5, 5);
        assert_eq!(box_blur_buffer(&img, 0), img);
    }

    #[test]
    fn sharpen_leaves_border_untouched() {
        let img = test_image(7, 7);
        let out = sharpen_buffer(&img);
        for x in 0..7 {
            assert_eq!(out.get_pixel(x, 0), img.get_pixel(x, 0));
            assert_eq!(out.get_pixel(x, 6), img.get_pixel(x, 6));
        }
        for y in 0..7 {
            assert_eq!(out.get_pixel(0, y), img.get_pixel(0, y));
            assert_eq!(out.get_pixel(6, y), img.get_pixel(6, y));
        }
    }

    #[test]
    fn sharpen_of_uniform_interior_is_identity() {
        let img = RgbaImage::from_pixel(5, 5, Rgba([100, 150, 200, 255]));
        // 5*c - 4*c = c on flat regions
        assert_eq!(sharpen_buffer(&img), img);
    }

    #[test]
    fn sharpen_amplifies_center_of_a_spike() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([100, 100, 100, 255]));
        img.put_pixel(2, 2, Rgba([150, 150, 150, 255]));
        let out = sharpen_buffer(&img);
        // 5*150 - 4*100 = 350 → clamped
        assert_eq!(out.get_pixel(2, 2)[0], 255);
        // direct neighbors dip: 5*100 - (150 + 3*100) = 50
        assert_eq!(out.get_pixel(1, 2)[0], 50);
    }

    #[test]
    fn wrapper_out_of_range_is_noop() {
        let mut state = CanvasState::new();
        state.add_layer(test_image(4, 4), "A".into());
        let before = state.layers[0].pixels.clone();
        grayscale(&mut state, 3);
        sharpen(&mut state, 99);
        assert_eq!(state.layers[0].pixels, before);
    }
}
