// ============================================================================
// CROP SELECTION — screen-space crop rectangle with handles
// ============================================================================

use crate::geom::{Point, Rect};

/// Selections never shrink below this many screen pixels per axis.
pub const MIN_SELECTION_SIZE: f32 = 10.0;
/// Hit-test radius around each handle.
const HANDLE_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    /// Drag the whole rectangle.
    Move,
}

/// One pending crop gesture. Lives entirely in screen space; mapping back to
/// document pixels happens when the crop is applied.
pub struct CropSelection {
    rect: Rect,
    image_rect: Rect,
    drag: Option<(CropHandle, Point)>,
}

impl CropSelection {
    /// Seed a selection centered in the document's screen rect, inset on all
    /// sides by 1/8 of the smaller dimension.
    pub fn begin(image_rect: Rect) -> Self {
        let inset = image_rect.width.min(image_rect.height) / 8.0;
        let rect = Rect::new(
            image_rect.x + inset,
            image_rect.y + inset,
            image_rect.width - 2.0 * inset,
            image_rect.height - 2.0 * inset,
        );
        let mut sel = Self { rect, image_rect, drag: None };
        sel.constrain();
        sel
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Re-anchor to a new document screen rect (viewport changed under us).
    pub fn set_image_rect(&mut self, image_rect: Rect) {
        self.image_rect = image_rect;
        self.constrain();
    }

    /// Which handle (if any) is under the pointer. Corners win over edges,
    /// edges over the interior.
    pub fn hit_test(&self, p: Point) -> Option<CropHandle> {
        let r = self.rect;
        let near = |a: f32, b: f32| (a - b).abs() <= HANDLE_MARGIN;
        let within_x = p.x >= r.left() - HANDLE_MARGIN && p.x <= r.right() + HANDLE_MARGIN;
        let within_y = p.y >= r.top() - HANDLE_MARGIN && p.y <= r.bottom() + HANDLE_MARGIN;

        if near(p.x, r.left()) && near(p.y, r.top()) {
            Some(CropHandle::TopLeft)
        } else if near(p.x, r.right()) && near(p.y, r.top()) {
            Some(CropHandle::TopRight)
        } else if near(p.x, r.left()) && near(p.y, r.bottom()) {
            Some(CropHandle::BottomLeft)
        } else if near(p.x, r.right()) && near(p.y, r.bottom()) {
            Some(CropHandle::BottomRight)
        } else if near(p.y, r.top()) && within_x {
            Some(CropHandle::Top)
        } else if near(p.y, r.bottom()) && within_x {
            Some(CropHandle::Bottom)
        } else if near(p.x, r.left()) && within_y {
            Some(CropHandle::Left)
        } else if near(p.x, r.right()) && within_y {
            Some(CropHandle::Right)
        } else if r.contains(p) {
            Some(CropHandle::Move)
        } else {
            None
        }
    }

    /// Pointer press: latch onto whatever handle is under the cursor.
    /// Returns whether a drag started.
    pub fn press(&mut self, p: Point) -> bool {
        match self.hit_test(p) {
            Some(handle) => {
                self.drag = Some((handle, p));
                true
            }
            None => false,
        }
    }

    /// Pointer move while dragging. No-op when no drag is latched.
    pub fn drag_to(&mut self, p: Point) {
        let Some((handle, last)) = self.drag else {
            return;
        };
        let dx = p.x - last.x;
        let dy = p.y - last.y;

        let mut left = self.rect.left();
        let mut top = self.rect.top();
        let mut right = self.rect.right();
        let mut bottom = self.rect.bottom();

        match handle {
            CropHandle::TopLeft => {
                left += dx;
                top += dy;
            }
            CropHandle::Top => top += dy,
            CropHandle::TopRight => {
                right += dx;
                top += dy;
            }
            CropHandle::Right => right += dx,
            CropHandle::BottomRight => {
                right += dx;
                bottom += dy;
            }
            CropHandle::Bottom => bottom += dy,
            CropHandle::BottomLeft => {
                left += dx;
                bottom += dy;
            }
            CropHandle::Left => left += dx,
            CropHandle::Move => {
                left += dx;
                right += dx;
                top += dy;
                bottom += dy;
            }
        }

        self.rect = Rect::new(left, top, right - left, bottom - top);
        self.constrain();
        self.drag = Some((handle, p));
    }

    pub fn release(&mut self) {
        self.drag = None;
    }

    /// Enforce the minimum size, then push the rectangle back inside the
    /// document's screen rect.
    fn constrain(&mut self) {
        let img = self.image_rect;
        let mut r = self.rect;

        r.width = r.width.max(MIN_SELECTION_SIZE).min(img.width);
        r.height = r.height.max(MIN_SELECTION_SIZE).min(img.height);

        if r.x < img.left() {
            r.x = img.left();
        }
        if r.y < img.top() {
            r.y = img.top();
        }
        if r.right() > img.right() {
            r.x = img.right() - r.width;
        }
        if r.bottom() > img.bottom() {
            r.y = img.bottom() - r.height;
        }

        self.rect = r;
    }
}

// ============================================================================
// TESTS
// ============================================================================
