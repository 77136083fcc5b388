// ============================================================================
// TRANSFORM OPERATIONS — rotate, flip, resize, crop
// ============================================================================
//
// The orthogonal transforms and flips touch only the addressed layer.
// Resize and crop apply uniformly to every layer in the stack.
// ============================================================================

use image::{Rgba, RgbaImage, imageops};
use rayon::prelude::*;

use crate::canvas::{CanvasState, blend_pixel, BlendMode};

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    fn to_filter_type(self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

// ============================================================================
// ORTHOGONAL TRANSFORMS — addressed layer only
// ============================================================================

pub fn rotate90_cw(state: &mut CanvasState, layer_idx: usize) {
    if layer_idx >= state.layers.len() {
        return;
    }
    state.layers[layer_idx].pixels = imageops::rotate90(&state.layers[layer_idx].pixels);
    state.mark_modified();
}

pub fn rotate90_ccw(state: &mut CanvasState, layer_idx: usize) {
    if layer_idx >= state.layers.len() {
        return;
    }
    state.layers[layer_idx].pixels = imageops::rotate270(&state.layers[layer_idx].pixels);
    state.mark_modified();
}

pub fn rotate180(state: &mut CanvasState, layer_idx: usize) {
    if layer_idx >= state.layers.len() {
        return;
    }
    state.layers[layer_idx].pixels = imageops::rotate180(&state.layers[layer_idx].pixels);
    state.mark_modified();
}

pub fn flip_horizontal(state: &mut CanvasState, layer_idx: usize) {
    if layer_idx >= state.layers.len() {
        return;
    }
    imageops::flip_horizontal_in_place(&mut state.layers[layer_idx].pixels);
    state.mark_modified();
}

pub fn flip_vertical(state: &mut CanvasState, layer_idx: usize) {
    if layer_idx >= state.layers.len() {
        return;
    }
    imageops::flip_vertical_in_place(&mut state.layers[layer_idx].pixels);
    state.mark_modified();
}

// ============================================================================
// ARBITRARY-ANGLE ROTATION
// ============================================================================

/// Rotate the addressed layer by `degrees` (clockwise positive) with
/// bilinear resampling. The output grows to the rotated bounding box; the
/// uncovered corners stay transparent unless `background` has alpha, in
/// which case the result is composited over that solid color.
pub fn rotate_by_angle(state: &mut CanvasState, layer_idx: usize, degrees: f32, background: Rgba<u8>) {
    if layer_idx >= state.layers.len() {
        return;
    }
    let src = &state.layers[layer_idx].pixels;
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return;
    }

    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let new_w = (w as f32 * cos.abs() + h as f32 * sin.abs()).ceil() as u32;
    let new_h = (w as f32 * sin.abs() + h as f32 * cos.abs()).ceil() as u32;

    let src_cx = w as f32 / 2.0;
    let src_cy = h as f32 / 2.0;
    let dst_cx = new_w as f32 / 2.0;
    let dst_cy = new_h as f32 / 2.0;

    let src_raw = src.as_raw();
    let src_stride = w as usize * 4;

    // Bilinear sample at fractional source coordinates; transparent outside.
    let sample = |fx: f32, fy: f32| -> [f32; 4] {
        if fx < -1.0 || fy < -1.0 || fx > w as f32 || fy > h as f32 {
            return [0.0; 4];
        }
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let fetch = |xi: i64, yi: i64| -> [f32; 4] {
            if xi < 0 || yi < 0 || xi >= w as i64 || yi >= h as i64 {
                return [0.0; 4];
            }
            let pi = yi as usize * src_stride + xi as usize * 4;
            [
                src_raw[pi] as f32,
                src_raw[pi + 1] as f32,
                src_raw[pi + 2] as f32,
                src_raw[pi + 3] as f32,
            ]
        };

        let p00 = fetch(x0 as i64, y0 as i64);
        let p10 = fetch(x0 as i64 + 1, y0 as i64);
        let p01 = fetch(x0 as i64, y0 as i64 + 1);
        let p11 = fetch(x0 as i64 + 1, y0 as i64 + 1);

        let mut out = [0.0f32; 4];
        for c in 0..4 {
            let top = p00[c] * (1.0 - tx) + p10[c] * tx;
            let bot = p01[c] * (1.0 - tx) + p11[c] * tx;
            out[c] = top * (1.0 - ty) + bot * ty;
        }
        out
    };

    let stride = new_w as usize * 4;
    let mut dst_raw = vec![0u8; new_w as usize * new_h as usize * 4];
    let fill_background = background[3] > 0;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let dy = y as f32 + 0.5 - dst_cy;
        for x in 0..new_w {
            let dx = x as f32 + 0.5 - dst_cx;
            // inverse rotation back into source space
            let sx = cos * dx + sin * dy + src_cx - 0.5;
            let sy = -sin * dx + cos * dy + src_cy - 0.5;
            let s = sample(sx, sy);
            let mut pixel = Rgba([
                s[0].round().clamp(0.0, 255.0) as u8,
                s[1].round().clamp(0.0, 255.0) as u8,
                s[2].round().clamp(0.0, 255.0) as u8,
                s[3].round().clamp(0.0, 255.0) as u8,
            ]);
            if fill_background {
                pixel = blend_pixel(background, pixel, BlendMode::Normal, 1.0);
            }
            let pi = x as usize * 4;
            row[pi..pi + 4].copy_from_slice(&pixel.0);
        }
    });

    if let Some(out) = RgbaImage::from_raw(new_w, new_h, dst_raw) {
        state.layers[layer_idx].pixels = out;
        state.mark_modified();
    }
}

// ============================================================================
// WHOLE-DOCUMENT OPERATIONS — every layer uniformly
// ============================================================================

/// Rescale every layer to `new_w` × `new_h` (aspect ratio is the caller's
/// responsibility). An empty target size or empty document is a no-op.
pub fn resize_image(state: &mut CanvasState, new_w: u32, new_h: u32, interp: Interpolation) {
    if new_w == 0 || new_h == 0 || state.layers.is_empty() {
        return;
    }
    let filter = interp.to_filter_type();
    state.layers.par_iter_mut().for_each(|layer| {
        layer.pixels = imageops::resize(&layer.pixels, new_w, new_h, filter);
    });
    state.mark_modified();
}

/// Crop every layer to the same document-space rectangle. The rectangle is
/// clamped into each layer's bounds; a degenerate result is a no-op.
pub fn crop_layers(state: &mut CanvasState, x: u32, y: u32, w: u32, h: u32) {
    if w == 0 || h == 0 || state.layers.is_empty() {
        return;
    }
    state.layers.par_iter_mut().for_each(|layer| {
        let lw = layer.pixels.width();
        let lh = layer.pixels.height();
        let cx = x.min(lw.saturating_sub(1));
        let cy = y.min(lh.saturating_sub(1));
        let cw = w.min(lw - cx);
        let ch = h.min(lh - cy);
        if cw == 0 || ch == 0 {
            return;
        }
        layer.pixels = imageops::crop_imm(&layer.pixels, cx, cy, cw, ch).to_image();
    });
    state.mark_modified();
}

// ============================================================================
// TESTS
// ============================================================================
