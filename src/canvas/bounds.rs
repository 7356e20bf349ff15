use crate::canvas::render::DirtyRect;
use crate::canvas::surface::CanvasSurface;

/// Tight box around every pixel with alpha > 0, inclusive on both ends.
///
/// A scan that finds no ink leaves the sentinel values
/// `(width, height, 0, 0)` in place, so `min_x > max_x` marks the empty case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl InkBounds {
    fn sentinel(width: u32, height: u32) -> Self {
        Self {
            min_x: width,
            min_y: height,
            max_x: 0,
            max_y: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Center of the box, the point a new result overlay is anchored to.
    pub fn anchor(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) as f32 / 2.0,
            (self.min_y + self.max_y) as f32 / 2.0,
        )
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Full scan of the surface. Returns the raw box, sentinel values included.
pub fn scan_ink_bounds(surface: &CanvasSurface) -> InkBounds {
    let region = DirtyRect {
        x: 0,
        y: 0,
        width: surface.width() as i32,
        height: surface.height() as i32,
    };
    scan_region(surface, region)
}

/// Locates the ink on `surface`, restricting the scan to `hint` when given.
///
/// `hint` must cover every inked pixel (see `StrokeRenderer::ink_hint`).
/// Returns `None` for a surface without ink.
pub fn locate_ink(surface: &CanvasSurface, hint: Option<DirtyRect>) -> Option<InkBounds> {
    let bounds = match hint {
        Some(hint) => match hint.clamp(surface.width(), surface.height()) {
            Some(region) => scan_region(surface, region),
            None => return None,
        },
        None => scan_ink_bounds(surface),
    };
    if bounds.is_empty() {
        tracing::debug!("ink scan found an empty canvas");
        return None;
    }
    tracing::debug!(?bounds, "ink scan finished");
    Some(bounds)
}

fn scan_region(surface: &CanvasSurface, region: DirtyRect) -> InkBounds {
    let mut bounds = InkBounds::sentinel(surface.width(), surface.height());
    if surface.is_zero_sized() || region.width <= 0 || region.height <= 0 {
        return bounds;
    }

    let stride = surface.width() as usize * 4;
    let pixels = surface.rgba();
    let x0 = region.x as usize;
    let x1 = (region.x + region.width) as usize;
    for y in region.y..(region.y + region.height) {
        let row = &pixels[y as usize * stride..(y as usize + 1) * stride];
        for x in x0..x1 {
            if row[x * 4 + 3] > 0 {
                bounds.include(x as u32, y as u32);
            }
        }
    }
    bounds
}
