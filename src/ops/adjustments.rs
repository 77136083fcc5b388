// ============================================================================
// ADJUSTMENT OPERATIONS — brightness / contrast / saturation / hue
// ============================================================================
//
// The pipeline is pure: a source buffer plus parameters produces a new
// buffer. Layer-targeted wrappers mutate the active document in place.
// Operations are parallelized via rayon for multi-core performance.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::CanvasState;

/// Apply a per-pixel transform to a buffer, producing a new buffer.
/// `transform` receives (r, g, b, a) as f32 and returns (r, g, b, a) as f32.
pub(crate) fn transform_pixels<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];
    let stride = w * 4;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let a = row_in[pi + 3] as f32;
            let (nr, ng, nb, na) = transform(r, g, b, a);
            row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    // Dimensions match by construction
    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}

/// The full adjustment pipeline, applied strictly in the order
/// brightness → contrast → saturation → hue. The order is part of the
/// contract: each stage reads the previous stage's RGB. A stage whose
/// parameter is zero is skipped entirely, so all-zero input is the
/// pixel-exact identity.
///
/// Parameter ranges: brightness/contrast/saturation in [-100, 100],
/// hue in degrees.
pub fn apply_adjustments(
    src: &RgbaImage,
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
) -> RgbaImage {
    if brightness == 0.0 && contrast == 0.0 && saturation == 0.0 && hue == 0.0 {
        return src.clone();
    }

    let contrast_factor = 259.0 * (contrast + 255.0) / (255.0 * (259.0 - contrast));
    let saturation_factor = 1.0 + saturation / 100.0;

    transform_pixels(src, |r, g, b, a| {
        let (mut r, mut g, mut b) = (r, g, b);

        if brightness != 0.0 {
            r = (r + brightness).clamp(0.0, 255.0);
            g = (g + brightness).clamp(0.0, 255.0);
            b = (b + brightness).clamp(0.0, 255.0);
        }

        if contrast != 0.0 {
            r = (contrast_factor * (r - 128.0) + 128.0).clamp(0.0, 255.0);
            g = (contrast_factor * (g - 128.0) + 128.0).clamp(0.0, 255.0);
            b = (contrast_factor * (b - 128.0) + 128.0).clamp(0.0, 255.0);
        }

        if saturation != 0.0 {
            let gray = 0.299 * r + 0.587 * g + 0.114 * b;
            r = (gray + saturation_factor * (r - gray)).clamp(0.0, 255.0);
            g = (gray + saturation_factor * (g - gray)).clamp(0.0, 255.0);
            b = (gray + saturation_factor * (b - gray)).clamp(0.0, 255.0);
        }

        if hue != 0.0 {
            let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
            let mut h = h + hue / 360.0;
            h -= h.floor(); // wrap into [0, 1)
            let (nr, ng, nb) = hsl_to_rgb(h, s, l);
            r = nr * 255.0;
            g = ng * 255.0;
            b = nb * 255.0;
        }

        (r, g, b, a)
    })
}

/// In-place adjustment of one layer. Out-of-range index is a no-op.
pub fn adjust_layer(
    state: &mut CanvasState,
    layer_idx: usize,
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
) {
    if layer_idx >= state.layers.len() {
        return;
    }
    let out = apply_adjustments(&state.layers[layer_idx].pixels, brightness, contrast, saturation, hue);
    state.layers[layer_idx].pixels = out;
    state.mark_modified();
}

// ============================================================================
// COLOR SPACE HELPERS
// ============================================================================

/// RGB (0..1) → HSL (H: 0..1, S: 0..1, L: 0..1)
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-6 {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if (max - r).abs() < 1e-6 {
        let mut h = (g - b) / d;
        if h < 0.0 {
            h += 6.0;
        }
        h / 6.0
    } else if (max - g).abs() < 1e-6 {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    (h, s, l)
}

/// HSL (H: 0..1, S: 0..1, L: 0..1) → RGB (0..1)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s.abs() < 1e-6 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (r, g, b)
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
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
                (x * 37 % 256) as u8,
                (y * 53 % 256) as u8,
                ((x + y) * 11 % 256) as u8,
                255,
            ]);
        }
        img
    }

    #[test]
    fn all_zero_is_pixel_exact_identity() {
        let img = test_image(16, 12);
        assert_eq!(apply_adjustments(&img, 0.0, 0.0, 0.0, 0.0), img);
    }

    #[test]
    fn brightness_shifts_channels() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([100, 150, 200, 255]));
        let out = apply_adjustments(&img, 40.0, 0.0, 0.0, 0.0);
        assert_eq!(*out.get_pixel(0, 0), Rgba([140, 190, 240, 255]));

        let out = apply_adjustments(&img, 100.0, 0.0, 0.0, 0.0);
        assert_eq!(*out.get_pixel(0, 0), Rgba([200, 250, 255, 255]));
    }

    #[test]
    fn contrast_pivots_around_midgray() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
        let out = apply_adjustments(&img, 0.0, 80.0, 0.0, 0.0);
        assert_eq!(*out.get_pixel(0, 0), Rgba([128, 128, 128, 255]));

        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 60, 128, 255]));
        let out = apply_adjustments(&img, 0.0, 50.0, 0.0, 0.0);
        let p = out.get_pixel(0, 0);
        assert!(p[0] > 200);
        assert!(p[1] < 60);
        assert_eq!(p[2], 128);
    }

    #[test]
    fn saturation_minus_100_is_grayscale() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([250, 20, 90, 255]));
        let out = apply_adjustments(&img, 0.0, 0.0, -100.0, 0.0);
        let p = out.get_pixel(0, 0);
        let gray = (0.299 * 250.0 + 0.587 * 20.0 + 0.114 * 90.0_f32).round() as u8;
        assert!((p[0] as i32 - gray as i32).abs() <= 1);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn hue_360_wraps_to_identity() {
        let img = test_image(8, 8);
        let out = apply_adjustments(&img, 0.0, 0.0, 0.0, 360.0);
        for (a, b) in img.pixels().zip(out.pixels()) {
            for c in 0..3 {
                assert!((a[c] as i32 - b[c] as i32).abs() <= 2);
            }
            assert_eq!(a[3], b[3]);
        }
    }

    #[test]
    fn hue_shift_moves_red_toward_green() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let out = apply_adjustments(&img, 0.0, 0.0, 0.0, 120.0);
        let p = out.get_pixel(0, 0);
        assert!(p[1] > 200, "expected green, got {:?}", p);
        assert!(p[0] < 50 && p[2] < 50);
    }

    #[test]
    fn alpha_is_never_touched() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([10, 200, 77, 93]));
        let out = apply_adjustments(&img, 50.0, -30.0, 60.0, 45.0);
        for p in out.pixels() {
            assert_eq!(p[3], 93);
        }
    }

    #[test]
    fn adjust_layer_out_of_range_is_noop() {
        let mut state = CanvasState::new();
        state.add_layer(test_image(4, 4), "A".into());
        let before = state.layers[0].pixels.clone();
        adjust_layer(&mut state, 7, 50.0, 0.0, 0.0, 0.0);
        assert_eq!(state.layers[0].pixels, before);
    }

    #[test]
    fn hsl_roundtrip() {
        for &(r, g, b) in &[(1.0, 0.0, 0.0), (0.2, 0.7, 0.4), (0.5, 0.5, 0.5), (0.0, 0.3, 0.9)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (r2, g2, b2) = hsl_to_rgb(h, s, l);
            assert!((r - r2).abs() < 1e-3);
            assert!((g - g2).abs() < 1e-3);
            assert!((b - b2).abs() < 1e-3);
        }
    }
}
