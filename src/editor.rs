// ============================================================================
// EDITOR — the facade the presentation layer drives
// ============================================================================
//
// Owns the document, viewport, tool state, and the two exclusive modes
// (crop, adjustments). Every entry point is a plain synchronous call; state
// changes are reported through the event queue, never through callbacks.
// ============================================================================

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::canvas::{BlendMode, CanvasState};
use crate::crop::CropSelection;
use crate::events::{EditorEvent, EventQueue};
use crate::geom::Point;
use crate::io::{self, CodecError};
use crate::ops::{adjustments, filters, transform};
use crate::session::AdjustmentSession;
use crate::tools::ToolState;
use crate::viewport::Viewport;
use crate::{log_err, log_info};

pub struct Editor {
    pub canvas: CanvasState,
    pub viewport: Viewport,
    pub tools: ToolState,
    pub events: EventQueue,
    crop: Option<CropSelection>,
    session: Option<AdjustmentSession>,
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            canvas: CanvasState::new(),
            viewport: Viewport::new(),
            tools: ToolState::new(),
            events: EventQueue::default(),
            crop: None,
            session: None,
        }
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Query predicates — polled by the host to enable/disable actions
    // ------------------------------------------------------------------------

    pub fn has_image(&self) -> bool {
        self.canvas.has_content()
    }

    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }

    pub fn is_adjusting(&self) -> bool {
        self.session.is_some()
    }

    /// Document mutators are allowed only outside the exclusive modes.
    fn can_edit(&self) -> bool {
        self.has_image() && !self.is_cropping() && !self.is_adjusting()
    }

    // ------------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------------

    /// Replace the document with the decoded file. On failure the current
    /// document, modes, and viewport are left untouched.
    pub fn load(&mut self, path: &Path) -> Result<(), CodecError> {
        let img = match io::load_image(path) {
            Ok(img) => img,
            Err(e) => {
                log_err!("failed to load {}: {}", path.display(), e);
                return Err(e);
            }
        };
        log_info!("loaded {} ({}x{})", path.display(), img.width(), img.height());

        self.crop = None;
        self.session = None;
        self.canvas.clear();
        self.canvas.add_layer(img, io::layer_name_for(path));
        self.canvas.modified = false;
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.viewport.actual_size(w, h);
        self.events.push(EditorEvent::ImageLoaded);
        self.events.push(EditorEvent::ActiveLayerChanged);
        Ok(())
    }

    /// Encode the flattened composite. A save failure leaves the document
    /// marked dirty; an empty document writes nothing.
    pub fn save(&mut self, path: &Path) -> Result<(), CodecError> {
        if !self.has_image() {
            return Ok(());
        }
        let flat = self.canvas.flatten();
        match io::save_image(&flat, path) {
            Ok(()) => {
                log_info!("saved {}", path.display());
                self.canvas.modified = false;
                Ok(())
            }
            Err(e) => {
                log_err!("failed to save {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Close the document: drop all layers, leave both modes, reset the view.
    pub fn clear_image(&mut self) {
        self.crop = None;
        self.session = None;
        self.canvas.clear();
        self.viewport.reset_pan();
        self.viewport.set_zoom_level(1.0, 0, 0);
        self.events.push(EditorEvent::ImageModified);
    }

    // ------------------------------------------------------------------------
    // Viewport gestures
    // ------------------------------------------------------------------------

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.viewport.set_viewport_size(width, height, w, h);
        self.sync_crop_rect();
    }

    pub fn zoom_in(&mut self) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if self.viewport.zoom_in(w, h) {
            self.after_zoom_change();
        }
    }

    pub fn zoom_out(&mut self) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if self.viewport.zoom_out(w, h) {
            self.after_zoom_change();
        }
    }

    pub fn set_zoom_level(&mut self, level: f32) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if self.viewport.set_zoom_level(level, w, h) {
            self.after_zoom_change();
        }
    }

    pub fn fit_to_window(&mut self) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if self.viewport.fit_to_window(w, h) {
            self.after_zoom_change();
        }
    }

    pub fn actual_size(&mut self) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if self.viewport.actual_size(w, h) {
            self.after_zoom_change();
        }
    }

    pub fn wheel_zoom(&mut self, delta: f32, at: Point) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if self.viewport.wheel_zoom(delta, at, w, h) {
            self.after_zoom_change();
        }
    }

    pub fn pan_by(&mut self, delta: Point) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.viewport.pan_by(delta, w, h);
        self.sync_crop_rect();
    }

    fn after_zoom_change(&mut self) {
        self.sync_crop_rect();
        self.events.push(EditorEvent::ZoomChanged);
    }

    /// A pending crop selection is anchored to the document's screen rect,
    /// which moves with every viewport change.
    fn sync_crop_rect(&mut self) {
        if let Some(crop) = &mut self.crop {
            let rect = self
                .viewport
                .document_rect(self.canvas.width(), self.canvas.height());
            crop.set_image_rect(rect);
        }
    }

    // ------------------------------------------------------------------------
    // Crop mode
    // ------------------------------------------------------------------------

    /// Enter crop mode. Refused while adjusting, while already cropping, or
    /// with no document.
    pub fn start_crop(&mut self) -> bool {
        if !self.has_image() || self.is_cropping() || self.is_adjusting() {
            return false;
        }
        self.tools.end_stroke();
        let rect = self
            .viewport
            .document_rect(self.canvas.width(), self.canvas.height());
        self.crop = Some(CropSelection::begin(rect));
        self.events.push(EditorEvent::CropModeEntered);
        true
    }

    pub fn crop_selection(&self) -> Option<&CropSelection> {
        self.crop.as_ref()
    }

    pub fn crop_press(&mut self, p: Point) -> bool {
        self.crop.as_mut().is_some_and(|c| c.press(p))
    }

    pub fn crop_drag(&mut self, p: Point) {
        if let Some(c) = &mut self.crop {
            c.drag_to(p);
        }
    }

    pub fn crop_release(&mut self) {
        if let Some(c) = &mut self.crop {
            c.release();
        }
    }

    /// Map the selection back into document pixels and crop every layer.
    pub fn apply_crop(&mut self) {
        let Some(crop) = self.crop.take() else {
            return;
        };
        self.events.push(EditorEvent::CropModeExited);

        let doc_w = self.canvas.width();
        let doc_h = self.canvas.height();
        let origin = self.viewport.document_rect(doc_w, doc_h).top_left();
        let zoom = self.viewport.zoom_level();
        let sel = crop.rect();

        // invert the viewport transform, then clamp into the document
        let x = (((sel.left() - origin.x) / zoom).max(0.0) as u32).min(doc_w.saturating_sub(1));
        let y = (((sel.top() - origin.y) / zoom).max(0.0) as u32).min(doc_h.saturating_sub(1));
        let w = ((sel.width / zoom) as u32).clamp(1, doc_w - x);
        let h = ((sel.height / zoom) as u32).clamp(1, doc_h - y);

        log_info!("crop to {}x{} at ({}, {})", w, h, x, y);
        transform::crop_layers(&mut self.canvas, x, y, w, h);
        self.viewport.reset_pan();
        self.events.push(EditorEvent::ImageModified);
    }

    /// Leave crop mode without touching any layer.
    pub fn cancel_crop(&mut self) {
        if self.crop.take().is_some() {
            self.events.push(EditorEvent::CropModeExited);
        }
    }

    // ------------------------------------------------------------------------
    // Adjustment mode
    // ------------------------------------------------------------------------

    /// Open a preview session on the active layer. Refused while cropping or
    /// while a session is already open.
    pub fn start_adjustments(&mut self) -> bool {
        if self.is_cropping() || self.is_adjusting() {
            return false;
        }
        self.tools.end_stroke();
        match AdjustmentSession::start(&self.canvas) {
            Some(session) => {
                self.session = Some(session);
                self.events.push(EditorEvent::AdjustmentModeEntered);
                true
            }
            None => false,
        }
    }

    /// Re-run the preview with new slider values (clamped to their ranges).
    pub fn preview_adjustments(&mut self, brightness: f32, contrast: f32, saturation: f32, hue: f32) {
        if let Some(session) = &self.session {
            session.preview(
                &mut self.canvas,
                brightness.clamp(-100.0, 100.0),
                contrast.clamp(-100.0, 100.0),
                saturation.clamp(-100.0, 100.0),
                hue.clamp(-180.0, 180.0),
            );
        }
    }

    pub fn commit_adjustments(&mut self) {
        if let Some(session) = self.session.take() {
            session.commit(&mut self.canvas);
            self.events.push(EditorEvent::AdjustmentModeExited);
            self.events.push(EditorEvent::ImageModified);
        }
    }

    pub fn cancel_adjustments(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel(&mut self.canvas);
            self.events.push(EditorEvent::AdjustmentModeExited);
        }
    }

    // ------------------------------------------------------------------------
    // Geometry and filters — active layer, outside the exclusive modes
    // ------------------------------------------------------------------------

    pub fn rotate90_cw(&mut self) {
        self.with_active_layer(transform::rotate90_cw);
    }

    pub fn rotate90_ccw(&mut self) {
        self.with_active_layer(transform::rotate90_ccw);
    }

    pub fn rotate180(&mut self) {
        self.with_active_layer(transform::rotate180);
    }

    pub fn flip_horizontal(&mut self) {
        self.with_active_layer(transform::flip_horizontal);
    }

    pub fn flip_vertical(&mut self) {
        self.with_active_layer(transform::flip_vertical);
    }

    pub fn rotate_by_angle(&mut self, degrees: f32, background: Rgba<u8>) {
        self.with_active_layer(|state, idx| {
            transform::rotate_by_angle(state, idx, degrees, background)
        });
    }

    pub fn grayscale(&mut self) {
        self.with_active_layer(filters::grayscale);
    }

    pub fn sepia(&mut self) {
        self.with_active_layer(filters::sepia);
    }

    pub fn invert(&mut self) {
        self.with_active_layer(filters::invert);
    }

    pub fn box_blur(&mut self, radius: u32) {
        self.with_active_layer(|state, idx| filters::box_blur(state, idx, radius));
    }

    pub fn sharpen(&mut self) {
        self.with_active_layer(filters::sharpen);
    }

    /// One-shot adjustment of the active layer, outside any session.
    pub fn adjust(&mut self, brightness: f32, contrast: f32, saturation: f32, hue: f32) {
        self.with_active_layer(|state, idx| {
            adjustments::adjust_layer(
                state,
                idx,
                brightness.clamp(-100.0, 100.0),
                contrast.clamp(-100.0, 100.0),
                saturation.clamp(-100.0, 100.0),
                hue.clamp(-180.0, 180.0),
            )
        });
    }

    /// Rescale every layer and reset the view to 100%.
    pub fn resize_image(&mut self, new_w: u32, new_h: u32, interp: transform::Interpolation) {
        if !self.can_edit() || new_w == 0 || new_h == 0 {
            return;
        }
        transform::resize_image(&mut self.canvas, new_w, new_h, interp);
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.viewport.reset_pan();
        self.viewport.set_zoom_level(1.0, w, h);
        self.events.push(EditorEvent::ImageModified);
        self.events.push(EditorEvent::ZoomChanged);
    }

    fn with_active_layer<F>(&mut self, op: F)
    where
        F: FnOnce(&mut CanvasState, usize),
    {
        if !self.can_edit() {
            return;
        }
        let Some(idx) = self.canvas.active_layer_index else {
            return;
        };
        op(&mut self.canvas, idx);
        self.events.push(EditorEvent::ImageModified);
    }

    // ------------------------------------------------------------------------
    // Layer stack
    // ------------------------------------------------------------------------

    /// Add a transparent layer sized to the document, on top of the stack.
    /// Like all structural stack edits, refused while a mode is open — an
    /// adjustment session addresses its layer by index, so the stack must
    /// not shift underneath it.
    pub fn add_blank_layer(&mut self, name: String) {
        if !self.can_edit() {
            return;
        }
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.canvas.add_layer(RgbaImage::new(w, h), name);
        self.events.push(EditorEvent::LayerAdded);
        self.events.push(EditorEvent::ActiveLayerChanged);
    }

    pub fn remove_layer(&mut self, index: usize) {
        if !self.can_edit() || index >= self.canvas.layers.len() {
            return;
        }
        self.canvas.remove_layer(index);
        self.events.push(EditorEvent::LayerRemoved);
        self.events.push(EditorEvent::ActiveLayerChanged);
    }

    pub fn move_layer_up(&mut self, index: usize) {
        if self.can_edit() && index + 1 < self.canvas.layers.len() {
            self.canvas.move_layer_up(index);
            self.events.push(EditorEvent::LayerMoved);
        }
    }

    pub fn move_layer_down(&mut self, index: usize) {
        if self.can_edit() && index > 0 && index < self.canvas.layers.len() {
            self.canvas.move_layer_down(index);
            self.events.push(EditorEvent::LayerMoved);
        }
    }

    pub fn duplicate_layer(&mut self, index: usize) {
        if !self.can_edit() || index >= self.canvas.layers.len() {
            return;
        }
        self.canvas.duplicate_layer(index);
        self.events.push(EditorEvent::LayerAdded);
        self.events.push(EditorEvent::ActiveLayerChanged);
    }

    pub fn set_active_layer(&mut self, index: usize) {
        if index < self.canvas.layers.len() && self.canvas.active_layer_index != Some(index) {
            self.canvas.set_active_layer(index);
            self.events.push(EditorEvent::ActiveLayerChanged);
        }
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) {
        if index < self.canvas.layers.len() {
            self.canvas.set_layer_visible(index, visible);
            self.events.push(EditorEvent::ImageModified);
        }
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) {
        if index < self.canvas.layers.len() {
            self.canvas.set_layer_opacity(index, opacity);
            self.events.push(EditorEvent::ImageModified);
        }
    }

    pub fn set_layer_blend_mode(&mut self, index: usize, mode: BlendMode) {
        if index < self.canvas.layers.len() {
            self.canvas.set_layer_blend_mode(index, mode);
            self.events.push(EditorEvent::ImageModified);
        }
    }

    pub fn set_layer_name(&mut self, index: usize, name: String) {
        self.canvas.set_layer_name(index, name);
    }

    // ------------------------------------------------------------------------
    // Tool strokes — document-pixel coordinates, blocked during modes
    // ------------------------------------------------------------------------

    pub fn stroke_begin(&mut self, x: i32, y: i32) -> bool {
        if self.is_cropping() || self.is_adjusting() {
            return false;
        }
        let started = self.tools.begin_stroke(&mut self.canvas, x, y);
        if started {
            self.events.push(EditorEvent::ImageModified);
        }
        started
    }

    pub fn stroke_move(&mut self, x: i32, y: i32) {
        if self.is_cropping() || self.is_adjusting() {
            return;
        }
        if self.tools.is_stroking() {
            self.tools.continue_stroke(&mut self.canvas, x, y);
            self.events.push(EditorEvent::ImageModified);
        }
    }

    pub fn stroke_end(&mut self) {
        self.tools.end_stroke();
    }
}

// ============================================================================
// TESTS
// ============================================================================
