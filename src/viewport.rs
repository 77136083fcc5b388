// ============================================================================
// VIEWPORT — document ↔ screen mapping (zoom level + pan offset)
// ============================================================================

use crate::geom::{Point, Rect};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;
/// Multiplier applied per zoom-in / zoom-out step.
pub const ZOOM_STEP: f32 = 1.25;
/// Fit-to-window leaves a small margin around the document.
const FIT_MARGIN: f32 = 0.95;
/// How far (in screen px) the document may be dragged past the window edge.
const PAN_SLACK: f32 = 100.0;

/// Zoom/pan state. The document rectangle is derived, never stored: the
/// scaled document is centered in the viewport, then shifted by the pan
/// offset.
pub struct Viewport {
    zoom_level: f32,
    pan_offset: Point,
    viewport_width: f32,
    viewport_height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            pan_offset: Point::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    pub fn pan_offset(&self) -> Point {
        self.pan_offset
    }

    /// Called by the host whenever the display area is resized.
    pub fn set_viewport_size(&mut self, width: f32, height: f32, doc_w: u32, doc_h: u32) {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
        self.constrain_pan(doc_w, doc_h);
    }

    /// Set the zoom level, clamped to [`MIN_ZOOM`], [`MAX_ZOOM`]. Returns
    /// whether the level actually changed (a fuzzy-equal set is a no-op).
    pub fn set_zoom_level(&mut self, level: f32, doc_w: u32, doc_h: u32) -> bool {
        let level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        if (level - self.zoom_level).abs() < 1e-6 {
            return false;
        }
        self.zoom_level = level;
        self.constrain_pan(doc_w, doc_h);
        true
    }

    pub fn zoom_in(&mut self, doc_w: u32, doc_h: u32) -> bool {
        self.set_zoom_level(self.zoom_level * ZOOM_STEP, doc_w, doc_h)
    }

    pub fn zoom_out(&mut self, doc_w: u32, doc_h: u32) -> bool {
        self.set_zoom_level(self.zoom_level / ZOOM_STEP, doc_w, doc_h)
    }

    /// Zoom so the whole document fits with a small margin, and recenter.
    /// Reports a change when either the zoom level or the pan moved.
    pub fn fit_to_window(&mut self, doc_w: u32, doc_h: u32) -> bool {
        if doc_w == 0 || doc_h == 0 || self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return false;
        }
        let scale_x = self.viewport_width / doc_w as f32;
        let scale_y = self.viewport_height / doc_h as f32;
        let scale = scale_x.min(scale_y) * FIT_MARGIN;
        let pan_moved = self.pan_offset != Point::default();
        self.pan_offset = Point::default();
        self.set_zoom_level(scale, doc_w, doc_h) || pan_moved
    }

    /// 100% zoom, recentered. Reports a change when either the zoom level
    /// or the pan moved.
    pub fn actual_size(&mut self, doc_w: u32, doc_h: u32) -> bool {
        let pan_moved = self.pan_offset != Point::default();
        self.pan_offset = Point::default();
        self.set_zoom_level(1.0, doc_w, doc_h) || pan_moved
    }

    pub fn reset_pan(&mut self) {
        self.pan_offset = Point::default();
    }

    /// Accumulate a pointer drag into the pan offset.
    pub fn pan_by(&mut self, delta: Point, doc_w: u32, doc_h: u32) {
        self.pan_offset = self.pan_offset + delta;
        self.constrain_pan(doc_w, doc_h);
    }

    /// Anchor-preserving zoom: the document point under `screen_point` stays
    /// under it after the zoom change. The fractional position of the anchor
    /// inside the scaled document is captured before the zoom, then the pan
    /// offset is solved so that position lands back on the same screen point.
    pub fn zoom_at_point(&mut self, factor: f32, screen_point: Point, doc_w: u32, doc_h: u32) -> bool {
        if doc_w == 0 || doc_h == 0 {
            return false;
        }
        let old_scaled_w = doc_w as f32 * self.zoom_level;
        let old_scaled_h = doc_h as f32 * self.zoom_level;
        if old_scaled_w <= 0.0 || old_scaled_h <= 0.0 {
            return false;
        }

        let old_origin = self.document_rect(doc_w, doc_h).top_left();
        let rel_x = (screen_point.x - old_origin.x) / old_scaled_w;
        let rel_y = (screen_point.y - old_origin.y) / old_scaled_h;

        let new_zoom = (self.zoom_level * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom_level).abs() < 1e-6 {
            return false;
        }
        self.zoom_level = new_zoom;

        let new_scaled_w = doc_w as f32 * new_zoom;
        let new_scaled_h = doc_h as f32 * new_zoom;
        let new_origin = Point::new(
            screen_point.x - rel_x * new_scaled_w,
            screen_point.y - rel_y * new_scaled_h,
        );
        let centered_origin = Point::new(
            (self.viewport_width - new_scaled_w) / 2.0,
            (self.viewport_height - new_scaled_h) / 2.0,
        );
        self.pan_offset = new_origin - centered_origin;
        self.constrain_pan(doc_w, doc_h);
        true
    }

    /// Wheel gesture: positive delta zooms in around the cursor.
    pub fn wheel_zoom(&mut self, delta: f32, screen_point: Point, doc_w: u32, doc_h: u32) -> bool {
        if delta > 0.0 {
            self.zoom_at_point(ZOOM_STEP, screen_point, doc_w, doc_h)
        } else if delta < 0.0 {
            self.zoom_at_point(1.0 / ZOOM_STEP, screen_point, doc_w, doc_h)
        } else {
            false
        }
    }

    /// Screen-space rectangle currently occupied by the document.
    pub fn document_rect(&self, doc_w: u32, doc_h: u32) -> Rect {
        let scaled_w = doc_w as f32 * self.zoom_level;
        let scaled_h = doc_h as f32 * self.zoom_level;
        Rect::new(
            (self.viewport_width - scaled_w) / 2.0 + self.pan_offset.x,
            (self.viewport_height - scaled_h) / 2.0 + self.pan_offset.y,
            scaled_w,
            scaled_h,
        )
    }

    /// Invert the viewport transform: screen point → document pixel coords.
    /// The result may lie outside `[0, doc)` when the point is off-image.
    pub fn screen_to_document(&self, p: Point, doc_w: u32, doc_h: u32) -> Point {
        let origin = self.document_rect(doc_w, doc_h).top_left();
        Point::new(
            (p.x - origin.x) / self.zoom_level,
            (p.y - origin.y) / self.zoom_level,
        )
    }

    /// Keep the document reachable: the pan offset may not push the scaled
    /// document further than `(overflow / 2) + PAN_SLACK` off-center per axis.
    fn constrain_pan(&mut self, doc_w: u32, doc_h: u32) {
        let scaled_w = doc_w as f32 * self.zoom_level;
        let scaled_h = doc_h as f32 * self.zoom_level;
        let max_pan_x = ((scaled_w - self.viewport_width) / 2.0 + PAN_SLACK).max(0.0);
        let max_pan_y = ((scaled_h - self.viewport_height) / 2.0 + PAN_SLACK).max(0.0);
        self.pan_offset.x = self.pan_offset.x.clamp(-max_pan_x, max_pan_x);
        self.pan_offset.y = self.pan_offset.y.clamp(-max_pan_y, max_pan_y);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_800x600() -> Viewport {
        let mut vp = Viewport::new();
        vp.set_viewport_size(800.0, 600.0, 400, 300);
        vp
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = viewport_800x600();
        vp.set_zoom_level(50.0, 400, 300);
        assert_eq!(vp.zoom_level(), MAX_ZOOM);
        vp.set_zoom_level(0.0001, 400, 300);
        assert_eq!(vp.zoom_level(), MIN_ZOOM);
    }

    #[test]
    fn fuzzy_equal_set_is_noop() {
        let mut vp = viewport_800x600();
        assert!(!vp.set_zoom_level(1.0 + 1e-8, 400, 300));
        assert!(vp.set_zoom_level(2.0, 400, 300));
    }

    #[test]
    fn zoom_in_out_steps() {
        let mut vp = viewport_800x600();
        vp.zoom_in(400, 300);
        assert!((vp.zoom_level() - 1.25).abs() < 1e-6);
        vp.zoom_out(400, 300);
        assert!((vp.zoom_level() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fit_to_window_centers_with_margin() {
        let mut vp = viewport_800x600();
        vp.fit_to_window(400, 300);
        // limiting axis is height: 600/300 = 2.0, times 0.95
        assert!((vp.zoom_level() - 1.9).abs() < 1e-6);
        assert_eq!(vp.pan_offset(), Point::default());

        let rect = vp.document_rect(400, 300);
        let center = rect.center();
        assert!((center.x - 400.0).abs() < 0.5);
        assert!((center.y - 300.0).abs() < 0.5);
    }

    #[test]
    fn actual_size_resets() {
        let mut vp = viewport_800x600();
        vp.set_zoom_level(3.0, 400, 300);
        vp.pan_by(Point::new(40.0, -30.0), 400, 300);
        vp.actual_size(400, 300);
        assert_eq!(vp.zoom_level(), 1.0);
        assert_eq!(vp.pan_offset(), Point::default());
    }

    #[test]
    fn pan_is_constrained() {
        let mut vp = viewport_800x600();
        // at zoom 1 the 400x300 doc fits entirely: overflow is negative,
        // so the pan budget is 0 per axis
        vp.pan_by(Point::new(5000.0, 5000.0), 400, 300);
        assert_eq!(vp.pan_offset(), Point::default());

        // zoomed to 10x the doc overflows; slack allows some panning
        vp.set_zoom_level(10.0, 400, 300);
        vp.pan_by(Point::new(1e6, 0.0), 400, 300);
        let expected = (400.0 * 10.0 - 800.0) / 2.0 + 100.0;
        assert!((vp.pan_offset().x - expected).abs() < 1e-3);
    }

    #[test]
    fn zoom_at_point_keeps_anchor_under_cursor() {
        // start from a zoom where the scaled document exceeds the viewport,
        // so the pan clamp has budget to honor the anchor solve
        let mut vp = Viewport::new();
        vp.set_viewport_size(800.0, 600.0, 640, 480);
        vp.set_zoom_level(2.0, 640, 480);

        let anchor = Point::new(250.0, 180.0);
        let doc_before = vp.screen_to_document(anchor, 640, 480);

        vp.zoom_at_point(1.25, anchor, 640, 480);
        let doc_after = vp.screen_to_document(anchor, 640, 480);

        assert!((doc_before.x - doc_after.x).abs() < 1.0);
        assert!((doc_before.y - doc_after.y).abs() < 1.0);
    }

    #[test]
    fn zoom_at_point_roundtrip_restores_zoom() {
        let mut vp = viewport_800x600();
        let anchor = Point::new(300.0, 200.0);
        let doc_before = vp.screen_to_document(anchor, 400, 300);
        vp.zoom_at_point(1.25, anchor, 400, 300);
        vp.zoom_at_point(0.8, anchor, 400, 300);
        assert!((vp.zoom_level() - 1.0).abs() < 1e-4);

        let doc_after = vp.screen_to_document(anchor, 400, 300);
        assert!((doc_before.x - doc_after.x).abs() < 1.0);
        assert!((doc_before.y - doc_after.y).abs() < 1.0);
    }

    #[test]
    fn fit_reports_change_when_only_the_pan_moves() {
        let mut vp = viewport_800x600();
        assert!(vp.fit_to_window(400, 300));

        // at fit zoom the slack still allows a small pan
        vp.pan_by(Point::new(50.0, 40.0), 400, 300);
        assert_ne!(vp.pan_offset(), Point::default());

        // zoom is already the fit scale; the recenter alone is a change
        assert!(vp.fit_to_window(400, 300));
        assert_eq!(vp.pan_offset(), Point::default());

        // nothing left to change
        assert!(!vp.fit_to_window(400, 300));
    }

    #[test]
    fn actual_size_reports_change_when_only_the_pan_moves() {
        let mut vp = Viewport::new();
        vp.set_viewport_size(800.0, 600.0, 1000, 800);
        vp.actual_size(1000, 800);
        vp.pan_by(Point::new(50.0, 0.0), 1000, 800);
        assert_ne!(vp.pan_offset(), Point::default());

        assert!(vp.actual_size(1000, 800));
        assert_eq!(vp.pan_offset(), Point::default());
        assert!(!vp.actual_size(1000, 800));
    }

    #[test]
    fn wheel_maps_sign_to_direction() {
        let mut vp = viewport_800x600();
        let p = Point::new(400.0, 300.0);
        vp.wheel_zoom(120.0, p, 400, 300);
        assert!(vp.zoom_level() > 1.0);
        vp.wheel_zoom(-120.0, p, 400, 300);
        assert!((vp.zoom_level() - 1.0).abs() < 1e-4);
        assert!(!vp.wheel_zoom(0.0, p, 400, 300));
    }

    #[test]
    fn empty_document_zoom_at_point_is_noop() {
        let mut vp = viewport_800x600();
        assert!(!vp.zoom_at_point(1.25, Point::new(10.0, 10.0), 0, 0));
        assert_eq!(vp.zoom_level(), 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn zoom_at_point_roundtrip(
            px in 0.0f32..800.0,
            py in 0.0f32..600.0,
            start_zoom in 0.2f32..8.0,
        ) {
            let mut vp = Viewport::new();
            vp.set_viewport_size(800.0, 600.0, 640, 480);
            vp.set_zoom_level(start_zoom, 640, 480);
            let zoom_before = vp.zoom_level();
            let anchor = Point::new(px, py);
            let doc_before = vp.screen_to_document(anchor, 640, 480);

            // only exercise steps that stay inside the clamp range,
            // otherwise the inverse step cannot restore the level
            prop_assume!(zoom_before * ZOOM_STEP <= MAX_ZOOM);

            if vp.zoom_at_point(ZOOM_STEP, anchor, 640, 480) {
                let doc_mid = vp.screen_to_document(anchor, 640, 480);
                // anchor held (pan clamp can shift it near the edges, so
                // only assert when the pan budget was not exhausted)
                let budget_x = ((640.0 * vp.zoom_level() - 800.0) / 2.0 + 100.0).max(0.0);
                let budget_y = ((480.0 * vp.zoom_level() - 600.0) / 2.0 + 100.0).max(0.0);
                if vp.pan_offset().x.abs() < budget_x && vp.pan_offset().y.abs() < budget_y {
                    prop_assert!((doc_before.x - doc_mid.x).abs() < 1.0);
                    prop_assert!((doc_before.y - doc_mid.y).abs() < 1.0);
                }
                vp.zoom_at_point(1.0 / ZOOM_STEP, anchor, 640, 480);
                prop_assert!((vp.zoom_level() - zoom_before).abs() < 1e-3);
            }
        }

        #[test]
        fn pan_never_escapes_budget(
            dx in -1e5f32..1e5,
            dy in -1e5f32..1e5,
            zoom in 0.1f32..10.0,
        ) {
            let mut vp = Viewport::new();
            vp.set_viewport_size(800.0, 600.0, 500, 400);
            vp.set_zoom_level(zoom, 500, 400);
            vp.pan_by(Point::new(dx, dy), 500, 400);
            let max_x = ((500.0 * vp.zoom_level() - 800.0) / 2.0 + 100.0).max(0.0);
            let max_y = ((400.0 * vp.zoom_level() - 600.0) / 2.0 + 100.0).max(0.0);
            prop_assert!(vp.pan_offset().x.abs() <= max_x + 1e-3);
            prop_assert!(vp.pan_offset().y.abs() <= max_y + 1e-3);
        }
    }
}
