pub mod bounds;
pub mod capture;
pub mod model;
pub mod render;
pub mod surface;

pub use bounds::{locate_ink, scan_ink_bounds, InkBounds};
pub use model::{Color, Point, Tool, ToolState};
pub use render::{DirtyRect, StrokeRenderer};
pub use surface::CanvasSurface;
