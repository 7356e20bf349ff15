use serde::{Deserialize, Serialize};

pub const MIN_BRUSH_WIDTH: u32 = 1;
pub const MAX_BRUSH_WIDTH: u32 = 20;
pub const DEFAULT_BRUSH_WIDTH: u32 = 3;

/// Surface-local pixel coordinate.
pub type Point = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA bytes as written into the surface by the pencil.
    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Swatches offered by the color picker.
pub const DEFAULT_PALETTE: [Color; 12] = [
    Color::rgb(0x00, 0x00, 0x00),
    Color::rgb(0xff, 0xff, 0xff),
    Color::rgb(0xee, 0x33, 0x33),
    Color::rgb(0xe6, 0x49, 0x80),
    Color::rgb(0xbe, 0x4b, 0xdb),
    Color::rgb(0x89, 0x32, 0x00),
    Color::rgb(0x22, 0x8b, 0xe6),
    Color::rgb(0x33, 0x33, 0xee),
    Color::rgb(0x40, 0xc0, 0x57),
    Color::rgb(0x00, 0xaa, 0x00),
    Color::rgb(0xfa, 0xb0, 0x05),
    Color::rgb(0xfd, 0x7e, 0x14),
];

pub fn clamp_brush_width(width: u32) -> u32 {
    width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolState {
    tool: Tool,
    color: Color,
    brush_width: u32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self::new(Color::WHITE, DEFAULT_BRUSH_WIDTH)
    }
}

impl ToolState {
    pub fn new(color: Color, brush_width: u32) -> Self {
        Self {
            tool: Tool::Pencil,
            color,
            brush_width: clamp_brush_width(brush_width),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn brush_width(&self) -> u32 {
        self.brush_width
    }

    /// Picking a swatch always switches back to the pencil.
    pub fn select_color(&mut self, color: Color) {
        self.color = color;
        self.tool = Tool::Pencil;
    }

    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_brush_width(&mut self, width: u32) {
        self.brush_width = clamp_brush_width(width);
    }

    /// Pixel value written under the stroke path for the active tool.
    pub fn ink(&self) -> [u8; 4] {
        match self.tool {
            Tool::Pencil => self.color.to_rgba_array(),
            Tool::Eraser => [0, 0, 0, 0],
        }
    }
}
