use crate::canvas::model::Point;

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// RGBA8 pixel buffer backing the drawing area. Alpha 0 means "no ink".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl CanvasSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; buffer_len(width, height)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_zero_sized(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn contains(&self, point: Point) -> bool {
        point.0 >= 0 && point.1 >= 0 && point.0 < self.width as i32 && point.1 < self.height as i32
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(px)
    }

    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y).map(|px| px[3]).unwrap_or(0)
    }

    /// Writes `value` at `point`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, point: Point, value: [u8; 4]) {
        if !self.contains(point) {
            return;
        }
        let idx = self.index(point.0 as u32, point.1 as u32);
        self.pixels[idx..idx + 4].copy_from_slice(&value);
    }

    /// Fills the horizontal run `x0..=x1` of row `y`. Callers clip beforehand.
    pub(crate) fn fill_row(&mut self, y: u32, x0: u32, x1: u32, value: [u8; 4]) {
        let start = self.index(x0, y);
        let end = self.index(x1, y) + 4;
        for px in self.pixels[start..end].chunks_exact_mut(4) {
            px.copy_from_slice(&value);
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Returns a surface of the new size keeping the overlapping region's ink.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let mut next = Self::new(width, height);
        let copy_w = self.width.min(width) as usize * 4;
        for y in 0..self.height.min(height) {
            let src = self.index(0, y);
            let dst = next.index(0, y);
            next.pixels[dst..dst + copy_w].copy_from_slice(&self.pixels[src..src + copy_w]);
        }
        next
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn buffer_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}
