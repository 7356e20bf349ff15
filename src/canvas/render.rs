use crate::canvas::model::{Point, Tool, ToolState};
use crate::canvas::surface::CanvasSurface;
use std::collections::HashMap;

/// Strokes at least this wide are rasterised as capsules instead of stamped.
const WIDE_STROKE_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: Point, b: Point, pad: i32) -> Self {
        let min_x = a.0.min(b.0) - pad;
        let max_x = a.0.max(b.0) + pad;
        let min_y = a.1.min(b.1) - pad;
        let max_y = a.1.max(b.1) + pad;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

pub fn segment_dirty_bounds(start: Point, end: Point, stroke_width: u32) -> DirtyRect {
    let radius = stroke_width.max(1) as i32;
    DirtyRect::from_points(start, end, radius + 2)
}

#[derive(Debug, Clone)]
struct BrushMask {
    rows: Vec<BrushMaskRow>,
}

#[derive(Debug, Clone, Copy)]
struct BrushMaskRow {
    dy: i32,
    min_dx: i32,
    max_dx: i32,
}

impl BrushMask {
    fn for_width(stroke_width: u32) -> Self {
        let radius = brush_radius(stroke_width);
        let mut rows = Vec::with_capacity((radius * 2 + 1) as usize);
        for dy in -radius..=radius {
            let mut max_dx = radius;
            while max_dx >= 0 && max_dx * max_dx + dy * dy > radius * radius {
                max_dx -= 1;
            }
            if max_dx >= 0 {
                rows.push(BrushMaskRow {
                    dy,
                    min_dx: -max_dx,
                    max_dx,
                });
            }
        }
        Self { rows }
    }
}

fn brush_radius(stroke_width: u32) -> i32 {
    (stroke_width.saturating_sub(1) / 2) as i32
}

/// Owns the canvas surface and turns pointer gestures into pixels.
///
/// Nothing but the pixel buffer is retained per stroke: the buffer is the
/// record of what has been drawn. Pencil segments write the tool color at full
/// opacity and eraser segments write transparent pixels, replacing whatever
/// was beneath the path and leaving the rest of the surface alone.
#[derive(Debug)]
pub struct StrokeRenderer {
    surface: CanvasSurface,
    drawing: bool,
    last_point: Option<Point>,
    ink_hint: Option<DirtyRect>,
    masks: HashMap<u32, BrushMask>,
}

impl StrokeRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: CanvasSurface::new(width, height),
            drawing: false,
            last_point: None,
            ink_hint: None,
            masks: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Union of every pencil segment drawn since the last clear. No ink
    /// exists outside of it.
    pub fn ink_hint(&self) -> Option<DirtyRect> {
        self.ink_hint
    }

    pub fn begin_stroke(&mut self, point: Point) {
        self.drawing = true;
        self.last_point = Some(point);
        tracing::trace!(x = point.0, y = point.1, "stroke started");
    }

    /// Draws from the previous point to `point`. Returns the touched region,
    /// or `None` when no gesture is active.
    pub fn extend_stroke(&mut self, point: Point, tools: &ToolState) -> Option<DirtyRect> {
        if !self.drawing {
            return None;
        }
        let start = self.last_point.unwrap_or(point);
        self.last_point = Some(point);

        let stroke_width = tools.brush_width().max(1);
        let ink = tools.ink();
        if stroke_width >= WIDE_STROKE_THRESHOLD {
            self.draw_segment_capsule(start, point, ink, stroke_width);
        } else {
            self.draw_segment_stamped(start, point, ink, stroke_width);
        }

        let dirty = segment_dirty_bounds(start, point, stroke_width);
        if tools.tool() == Tool::Pencil {
            self.ink_hint = Some(match self.ink_hint {
                Some(hint) => hint.union(dirty),
                None => dirty,
            });
        }
        dirty.clamp(self.surface.width(), self.surface.height())
    }

    pub fn end_stroke(&mut self) {
        if self.drawing {
            tracing::trace!("stroke finished");
        }
        self.drawing = false;
        self.last_point = None;
    }

    pub fn clear(&mut self) {
        self.surface.clear();
        self.ink_hint = None;
    }

    /// Resizes the surface to the new viewport. Ink in the overlapping region
    /// survives; an active gesture is ended.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.surface.size() == (width, height) {
            return;
        }
        tracing::debug!(width, height, "resizing canvas surface");
        self.surface = self.surface.resized(width, height);
        self.end_stroke();
    }

    fn draw_segment_stamped(&mut self, start: Point, end: Point, ink: [u8; 4], stroke_width: u32) {
        let mut x0 = start.0;
        let mut y0 = start.1;
        let x1 = end.0;
        let y1 = end.1;

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.draw_brush((x0, y0), ink, stroke_width);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn draw_segment_capsule(&mut self, start: Point, end: Point, ink: [u8; 4], stroke_width: u32) {
        let radius = brush_radius(stroke_width) as f32;
        let pad = radius.ceil() as i32 + 1;
        let Some(clip) = DirtyRect::from_points(start, end, pad)
            .clamp(self.surface.width(), self.surface.height())
        else {
            return;
        };

        let radius_sq = radius * radius;
        for y in clip.y..(clip.y + clip.height) {
            for x in clip.x..(clip.x + clip.width) {
                if point_segment_distance_sq((x, y), start, end) <= radius_sq {
                    self.surface.set_pixel((x, y), ink);
                }
            }
        }
    }

    fn draw_brush(&mut self, center: Point, ink: [u8; 4], stroke_width: u32) {
        let mask = self
            .masks
            .entry(stroke_width)
            .or_insert_with(|| BrushMask::for_width(stroke_width));
        let max_x = self.surface.width() as i32 - 1;
        let max_y = self.surface.height() as i32 - 1;

        for row in &mask.rows {
            let y = center.1 + row.dy;
            if y < 0 || y > max_y {
                continue;
            }
            let x0 = (center.0 + row.min_dx).max(0);
            let x1 = (center.0 + row.max_dx).min(max_x);
            if x0 > x1 {
                continue;
            }
            self.surface.fill_row(y as u32, x0 as u32, x1 as u32, ink);
        }
    }
}

fn point_segment_distance_sq(point: Point, start: Point, end: Point) -> f32 {
    let px = point.0 as f32;
    let py = point.1 as f32;
    let x0 = start.0 as f32;
    let y0 = start.1 as f32;
    let vx = end.0 as f32 - x0;
    let vy = end.1 as f32 - y0;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        let dx = px - x0;
        let dy = py - y0;
        return dx * dx + dy * dy;
    }
    let t = (((px - x0) * vx + (py - y0) * vy) / len_sq).clamp(0.0, 1.0);
    let dx = px - (x0 + vx * t);
    let dy = py - (y0 + vy * t);
    dx * dx + dy * dy
}
