// ============================================================================
// CANVAS STATE — layers, blend modes, compositing
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Layers painted at or below this opacity are skipped during compositing.
const OPACITY_EPSILON: f32 = 0.001;

// ============================================================================
// BLEND MODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// Returns all blend modes for UI display
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::ColorDodge,
            BlendMode::ColorBurn,
            BlendMode::HardLight,
            BlendMode::SoftLight,
            BlendMode::Difference,
            BlendMode::Exclusion,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "Color Dodge",
            BlendMode::ColorBurn => "Color Burn",
            BlendMode::HardLight => "Hard Light",
            BlendMode::SoftLight => "Soft Light",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
        }
    }
}

// ============================================================================
// LAYER
// ============================================================================

pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub pixels: RgbaImage,
}

impl Layer {
    pub fn new(name: String, width: u32, height: u32, fill_color: Rgba<u8>) -> Self {
        Self {
            name,
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            pixels: RgbaImage::from_pixel(width, height, fill_color),
        }
    }

    pub fn from_image(name: String, pixels: RgbaImage) -> Self {
        Self {
            name,
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            pixels,
        }
    }

    /// True when the compositor would paint this layer.
    pub fn renders(&self) -> bool {
        self.visible && self.opacity > OPACITY_EPSILON
    }
}

impl Clone for Layer {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            visible: self.visible,
            opacity: self.opacity,
            blend_mode: self.blend_mode,
            pixels: self.pixels.clone(),
        }
    }
}

// ============================================================================
// CANVAS STATE — the open document
// ============================================================================

/// Ordered layer stack (index 0 = bottom) plus the active-layer cursor.
/// All index-based mutators are defensive no-ops on out-of-range input.
#[derive(Default)]
pub struct CanvasState {
    pub layers: Vec<Layer>,
    pub active_layer_index: Option<usize>,
    /// Set by any pixel-mutating operation; cleared after a successful save.
    pub modified: bool,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document width. The document's pixel size is the bottom layer's size.
    pub fn width(&self) -> u32 {
        self.layers.first().map_or(0, |l| l.pixels.width())
    }

    /// Document height. See `width`.
    pub fn height(&self) -> u32 {
        self.layers.first().map_or(0, |l| l.pixels.height())
    }

    pub fn has_content(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active_layer_index.and_then(|i| self.layers.get(i))
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        self.active_layer_index.and_then(|i| self.layers.get_mut(i))
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Drop every layer. The active index goes back to the empty sentinel.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.active_layer_index = None;
        self.modified = false;
    }

    // ------------------------------------------------------------------------
    // Layer stack mutators
    // ------------------------------------------------------------------------

    /// Append a layer on top of the stack and make it active.
    pub fn add_layer(&mut self, pixels: RgbaImage, name: String) {
        self.layers.push(Layer::from_image(name, pixels));
        self.active_layer_index = Some(self.layers.len() - 1);
        self.mark_modified();
    }

    /// Remove a layer. The active index is re-clamped so it stays valid
    /// (or becomes the empty sentinel when the last layer goes).
    pub fn remove_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            return;
        }
        self.layers.remove(index);

        self.active_layer_index = if self.layers.is_empty() {
            None
        } else {
            match self.active_layer_index {
                Some(a) if a > index => Some(a - 1),
                Some(a) => Some(a.min(self.layers.len() - 1)),
                None => None,
            }
        };
        self.mark_modified();
    }

    /// Swap a layer with the one above it (toward the top of the paint order).
    /// The active cursor follows whichever of the two layers it was on.
    pub fn move_layer_up(&mut self, index: usize) {
        if index + 1 >= self.layers.len() {
            return;
        }
        self.layers.swap(index, index + 1);
        self.active_layer_index = match self.active_layer_index {
            Some(a) if a == index => Some(index + 1),
            Some(a) if a == index + 1 => Some(index),
            other => other,
        };
        self.mark_modified();
    }

    /// Swap a layer with the one below it. No-op at the bottom.
    pub fn move_layer_down(&mut self, index: usize) {
        if index == 0 || index >= self.layers.len() {
            return;
        }
        self.layers.swap(index, index - 1);
        self.active_layer_index = match self.active_layer_index {
            Some(a) if a == index => Some(index - 1),
            Some(a) if a == index - 1 => Some(index),
            other => other,
        };
        self.mark_modified();
    }

    /// Deep-copy a layer (pixels and attributes) and insert the copy
    /// immediately above the source. The copy becomes active.
    pub fn duplicate_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            return;
        }
        let mut copy = self.layers[index].clone();
        copy.name = format!("{} Copy", copy.name);
        self.layers.insert(index + 1, copy);
        self.active_layer_index = Some(index + 1);
        self.mark_modified();
    }

    pub fn set_active_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            return;
        }
        self.active_layer_index = Some(index);
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.visible = visible;
            self.mark_modified();
        }
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.opacity = opacity.clamp(0.0, 1.0);
            self.mark_modified();
        }
    }

    pub fn set_layer_blend_mode(&mut self, index: usize, mode: BlendMode) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.blend_mode = mode;
            self.mark_modified();
        }
    }

    pub fn set_layer_name(&mut self, index: usize, name: String) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.name = name;
        }
    }

    // ------------------------------------------------------------------------
    // Compositor
    // ------------------------------------------------------------------------

    /// Flatten the stack into a single image, bottom to top.
    ///
    /// The output is sized to the bottom layer. Layers whose own buffers are
    /// smaller or larger than the document contribute only where they overlap.
    /// The result is a fresh snapshot, not a live view.
    pub fn flatten(&self) -> RgbaImage {
        let width = self.width();
        let height = self.height();
        if width == 0 || height == 0 {
            return RgbaImage::new(0, 0);
        }

        let rendered: Vec<&Layer> = self.layers.iter().filter(|l| l.renders()).collect();

        let stride = width as usize * 4;
        let mut raw = vec![0u8; stride * height as usize];

        raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            let y = y as u32;
            for x in 0..width {
                let mut base = Rgba([0, 0, 0, 0]);
                for layer in &rendered {
                    if x < layer.pixels.width() && y < layer.pixels.height() {
                        let top = *layer.pixels.get_pixel(x, y);
                        base = blend_pixel(base, top, layer.blend_mode, layer.opacity);
                    }
                }
                let pi = x as usize * 4;
                row[pi..pi + 4].copy_from_slice(&base.0);
            }
        });

        RgbaImage::from_raw(width, height, raw).unwrap_or_else(|| RgbaImage::new(width, height))
    }
}

// ============================================================================
// PER-PIXEL BLENDING
// ============================================================================

/// Composite one straight-alpha pixel over another with the given blend mode
/// and layer opacity.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    // Fast path: fully transparent top pixel — nothing to blend
    if top[3] == 0 {
        return base;
    }

    // Fast path: Normal blend, full opacity, fully opaque top pixel — just overwrite
    if matches!(mode, BlendMode::Normal) && opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.clamp(0.0, 1.0);

    let base_r = base[0] as f32 / 255.0;
    let base_g = base[1] as f32 / 255.0;
    let base_b = base[2] as f32 / 255.0;
    let base_a = base[3] as f32 / 255.0;

    let top_r = top[0] as f32 / 255.0;
    let top_g = top[1] as f32 / 255.0;
    let top_b = top[2] as f32 / 255.0;
    let top_a = (top[3] as f32 / 255.0) * opacity;

    let (r, g, b) = match mode {
        BlendMode::Normal => (top_r, top_g, top_b),
        BlendMode::Multiply => (base_r * top_r, base_g * top_g, base_b * top_b),
        BlendMode::Screen => (
            1.0 - (1.0 - base_r) * (1.0 - top_r),
            1.0 - (1.0 - base_g) * (1.0 - top_g),
            1.0 - (1.0 - base_b) * (1.0 - top_b),
        ),
        BlendMode::Overlay => (
            overlay_channel(base_r, top_r),
            overlay_channel(base_g, top_g),
            overlay_channel(base_b, top_b),
        ),
        BlendMode::Darken => (base_r.min(top_r), base_g.min(top_g), base_b.min(top_b)),
        BlendMode::Lighten => (base_r.max(top_r), base_g.max(top_g), base_b.max(top_b)),
        BlendMode::ColorDodge => (
            color_dodge_channel(base_r, top_r),
            color_dodge_channel(base_g, top_g),
            color_dodge_channel(base_b, top_b),
        ),
        BlendMode::ColorBurn => (
            color_burn_channel(base_r, top_r),
            color_burn_channel(base_g, top_g),
            color_burn_channel(base_b, top_b),
        ),
        BlendMode::HardLight => (
            overlay_channel(top_r, base_r),
            overlay_channel(top_g, base_g),
            overlay_channel(top_b, base_b),
        ),
        BlendMode::SoftLight => (
            soft_light_channel(base_r, top_r),
            soft_light_channel(base_g, top_g),
            soft_light_channel(base_b, top_b),
        ),
        BlendMode::Difference => (
            (base_r - top_r).abs(),
            (base_g - top_g).abs(),
            (base_b - top_b).abs(),
        ),
        BlendMode::Exclusion => (
            base_r + top_r - 2.0 * base_r * top_r,
            base_g + top_g - 2.0 * base_g * top_g,
            base_b + top_b - 2.0 * base_b * top_b,
        ),
    };

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let out_r = (r * top_a + base_r * base_a * (1.0 - top_a)) / out_a;
    let out_g = (g * top_a + base_g * base_a * (1.0 - top_a)) / out_a;
    let out_b = (b * top_a + base_b * base_a * (1.0 - top_a)) / out_a;

    Rgba([
        (out_r * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_g * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_b * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

// Blend mode helper functions
fn overlay_channel(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

fn color_burn_channel(base: f32, top: f32) -> f32 {
    if top == 0.0 {
        0.0
    } else {
        (1.0 - (1.0 - base) / top).max(0.0)
    }
}

fn color_dodge_channel(base: f32, top: f32) -> f32 {
    if top >= 1.0 {
        1.0
    } else {
        (base / (1.0 - top)).min(1.0)
    }
}

/// W3C Soft Light formula.
fn soft_light_channel(base: f32, top: f32) -> f32 {
    if top <= 0.5 {
        base - (1.0 - 2.0 * top) * base * (1.0 - base)
    } else {
        let d = if base <= 0.25 {
            ((16.0 * base - 12.0) * base + 4.0) * base
        } else {
            base.sqrt()
        };
        base + (2.0 * top - 1.0) * (d - base)
    }
}

// ============================================================================
// TESTS
// ============================================================================
