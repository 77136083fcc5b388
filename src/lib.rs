//! pixelforge — raster image editor core.
//!
//! The crate holds the engines a desktop editor shell drives: the layer
//! stack and compositor, the viewport transform, the adjustment/filter
//! pipeline, crop geometry, brush/eraser rasterization, and the
//! non-destructive adjustment session. Presentation (windows, panels,
//! dialogs) lives in the host and talks to [`editor::Editor`].

pub mod canvas;
pub mod crop;
pub mod editor;
pub mod events;
pub mod geom;
pub mod io;
pub mod logger;
pub mod ops;
pub mod session;
pub mod tools;
pub mod viewport;

pub use canvas::{BlendMode, CanvasState, Layer};
pub use editor::Editor;
pub use events::EditorEvent;
pub use geom::{Point, Rect};
pub use session::AdjustmentSession;
pub use tools::{Tool, ToolState};
pub use viewport::Viewport;
