// ============================================================================
// DRAWING TOOLS — brush / eraser stroke rasterization
// ============================================================================
//
// Strokes arrive as pointer gestures in document-pixel coordinates. Each
// gesture is a press → drag → release state machine; moves are interpolated
// in unit steps so fast pointer motion leaves no gaps.
// ============================================================================

use image::{Rgba, RgbaImage};

use crate::canvas::{BlendMode, CanvasState, blend_pixel};

/// The selected tool. Brushes carry their edge hardness; the eraser has no
/// parameters beyond the shared size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tool {
    None,
    Brush { hardness: f32 },
    Eraser,
}

pub struct ToolState {
    pub tool: Tool,
    color: Rgba<u8>,
    size: f32,
    opacity: f32,
    /// Last stamped point of the in-flight stroke, if any.
    anchor: Option<(i32, i32)>,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::None,
            color: Rgba([0, 0, 0, 255]),
            size: 10.0,
            opacity: 1.0,
            anchor: None,
        }
    }
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.anchor = None;
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size.max(1.0);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Adjust the brush hardness. No-op for other tools.
    pub fn set_hardness(&mut self, value: f32) {
        if let Tool::Brush { hardness } = &mut self.tool {
            *hardness = value.clamp(0.0, 1.0);
        }
    }

    pub fn is_stroking(&self) -> bool {
        self.anchor.is_some()
    }

    /// Pointer press: stamp one dab and open the stroke. Returns whether a
    /// stroke actually started (a disabled tool or empty document refuses).
    pub fn begin_stroke(&mut self, state: &mut CanvasState, x: i32, y: i32) -> bool {
        if matches!(self.tool, Tool::None) || state.active_layer_index.is_none() {
            return false;
        }
        self.stamp(state, x, y);
        self.anchor = Some((x, y));
        state.mark_modified();
        true
    }

    /// Pointer move while pressed: stamp dabs along the line from the last
    /// point, one per unit step of the dominant axis, endpoints included.
    pub fn continue_stroke(&mut self, state: &mut CanvasState, x: i32, y: i32) {
        let Some((lx, ly)) = self.anchor else {
            return;
        };
        let dx = x - lx;
        let dy = y - ly;
        let steps = dx.abs().max(dy.abs());

        if steps == 0 {
            self.stamp(state, x, y);
        } else {
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let px = (lx as f32 + t * dx as f32).round() as i32;
                let py = (ly as f32 + t * dy as f32).round() as i32;
                self.stamp(state, px, py);
            }
        }
        self.anchor = Some((x, y));
        state.mark_modified();
    }

    /// Pointer release: close the stroke. Returns whether one was open.
    pub fn end_stroke(&mut self) -> bool {
        self.anchor.take().is_some()
    }

    fn stamp(&self, state: &mut CanvasState, cx: i32, cy: i32) {
        let tool = self.tool;
        let color = self.color;
        let size = self.size;
        let opacity = self.opacity;
        let Some(layer) = state.active_layer_mut() else {
            return;
        };
        match tool {
            Tool::Brush { hardness } => {
                brush_dab(&mut layer.pixels, cx, cy, size, color, opacity, hardness);
            }
            Tool::Eraser => eraser_dab(&mut layer.pixels, cx, cy, size),
            Tool::None => {}
        }
    }
}

/// One brush stamp: a radial falloff disc composited source-over.
///
/// The alpha profile holds the full tool opacity from the center out to
/// `hardness` of the radius, then fades linearly to `opacity * (1 - hardness)`
/// at the rim. A hardness of 1.0 gives a crisp full-opacity circle.
fn brush_dab(
    pixels: &mut RgbaImage,
    cx: i32,
    cy: i32,
    size: f32,
    color: Rgba<u8>,
    opacity: f32,
    hardness: f32,
) {
    let radius = size / 2.0;
    let (w, h) = (pixels.width() as i32, pixels.height() as i32);

    let x0 = ((cx as f32 - radius).floor() as i32).max(0);
    let x1 = ((cx as f32 + radius).ceil() as i32).min(w - 1);
    let y0 = ((cy as f32 - radius).floor() as i32).max(0);
    let y1 = ((cy as f32 + radius).ceil() as i32).min(h - 1);

    for py in y0..=y1 {
        for px in x0..=x1 {
            let dist = ((px - cx).pow(2) as f32 + (py - cy).pow(2) as f32).sqrt();
            let t = dist / radius;
            if t > 1.0 {
                continue;
            }
            let alpha = if t <= hardness || hardness >= 1.0 {
                opacity
            } else {
                let fade = (t - hardness) / (1.0 - hardness);
                opacity * (1.0 - fade * hardness)
            };
            if alpha <= 0.0 {
                continue;
            }
            let src = Rgba([
                color[0],
                color[1],
                color[2],
                (alpha * color[3] as f32).round().clamp(0.0, 255.0) as u8,
            ]);
            let dst = pixels.get_pixel_mut(px as u32, py as u32);
            *dst = blend_pixel(*dst, src, BlendMode::Normal, 1.0);
        }
    }
}

/// One eraser stamp: a filled circle written with the clear operator (covered
/// pixels become fully transparent, nothing is blended).
fn eraser_dab(pixels: &mut RgbaImage, cx: i32, cy: i32, size: f32) {
    let radius = size / 2.0;
    let (w, h) = (pixels.width() as i32, pixels.height() as i32);

    let x0 = ((cx as f32 - radius).floor() as i32).max(0);
    let x1 = ((cx as f32 + radius).ceil() as i32).min(w - 1);
    let y0 = ((cy as f32 - radius).floor() as i32).max(0);
    let y1 = ((cy as f32 + radius).ceil() as i32).min(h - 1);

    for py in y0..=y1 {
        for px in x0..=x1 {
            let dist = ((px - cx).pow(2) as f32 + (py - cy).pow(2) as f32).sqrt();
            if dist <= radius {
                pixels.put_pixel(px as u32, py as u32, Rgba([0, 0, 0, 0]));
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_state(w: u32, h: u32) -> CanvasState {
        let mut state = CanvasState::new();
        state.add_layer(RgbaImage::new(w, h), "Background".into());
        state
    }

    fn brush(hardness: f32) -> ToolState {
        let mut tools = ToolState::new();
        tools.set_tool(Tool::Brush { hardness });
        tools
    }

    #[test]
    fn parameters_are_clamped() {
        let mut tools = brush(0.5);
        tools.set_size(-3.0);
        assert_eq!(tools.size(), 1.0);
        tools.set_opacity(2.0);
        assert_eq!(tools.opacity(), 1.0);
        tools.set_hardness(7.0);
        assert_eq!(tools.tool, Tool::Brush { hardness: 1.0 });
    }

    #[test]
    fn no_tool_or_empty_document_refuses_stroke() {
        let mut state = blank_state(8, 8);
        let mut tools = ToolState::new();
        assert!(!tools.begin_stroke(&mut state, 2, 2));

        let mut empty = CanvasState::new();
        let mut tools = brush(1.0);
        assert!(!tools.begin_stroke(&mut empty, 2, 2));
    }

    #[test]
    fn horizontal_stroke_paints_every_column() {
        let mut state = blank_state(16, 4);
        let mut tools = brush(1.0);
        tools.set_size(1.0);
        tools.set_color(Rgba([255, 0, 0, 255]));

        assert!(tools.begin_stroke(&mut state, 0, 0));
        tools.continue_stroke(&mut state, 10, 0);
        assert!(tools.end_stroke());

        let px = &state.layers[0].pixels;
        for x in 0..=10 {
            assert_eq!(px.get_pixel(x, 0)[3], 255, "gap at x = {x}");
            assert_eq!(px.get_pixel(x, 0)[0], 255);
        }
        assert_eq!(px.get_pixel(11, 0)[3], 0);
    }

    #[test]
    fn diagonal_stroke_has_no_gaps_on_dominant_axis() {
        let mut state = blank_state(20, 20);
        let mut tools = brush(1.0);
        tools.set_size(1.0);
        tools.set_color(Rgba([0, 255, 0, 255]));

        tools.begin_stroke(&mut state, 0, 0);
        tools.continue_stroke(&mut state, 12, 5);
        tools.end_stroke();

        let px = &state.layers[0].pixels;
        for x in 0..=12 {
            let painted = (0..=5).any(|y| px.get_pixel(x, y)[3] > 0);
            assert!(painted, "column {x} has no paint");
        }
    }

    #[test]
    fn soft_brush_fades_toward_the_rim() {
        let mut state = blank_state(32, 32);
        let mut tools = brush(0.5);
        tools.set_size(20.0);
        tools.set_color(Rgba([0, 0, 255, 255]));

        tools.begin_stroke(&mut state, 16, 16);
        tools.end_stroke();

        let px = &state.layers[0].pixels;
        let center = px.get_pixel(16, 16)[3];
        let mid = px.get_pixel(16 + 7, 16)[3];
        let outside = px.get_pixel(16, 2)[3];
        assert_eq!(center, 255);
        assert!(mid > 0 && mid < center, "rim alpha {mid}");
        assert_eq!(outside, 0);
    }

    #[test]
    fn eraser_clears_covered_pixels_completely() {
        let mut state = CanvasState::new();
        state.add_layer(
            RgbaImage::from_pixel(10, 10, Rgba([200, 100, 50, 255])),
            "Paint".into(),
        );
        let mut tools = ToolState::new();
        tools.set_tool(Tool::Eraser);
        tools.set_size(4.0);

        tools.begin_stroke(&mut state, 5, 5);
        tools.end_stroke();

        let px = &state.layers[0].pixels;
        assert_eq!(*px.get_pixel(5, 5), Rgba([0, 0, 0, 0]));
        assert_eq!(*px.get_pixel(0, 0), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn stroke_marks_the_document_modified() {
        let mut state = blank_state(8, 8);
        state.modified = false;
        let mut tools = brush(1.0);
        tools.begin_stroke(&mut state, 1, 1);
        assert!(state.modified);
    }
}
