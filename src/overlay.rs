//! Result overlays shown on top of the sketch.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayPosition {
    pub x: f32,
    pub y: f32,
}

impl OverlayPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for OverlayPosition {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub text: String,
    pub position: OverlayPosition,
}

impl OverlayEntry {
    /// Overlay for one solver result, reading `"expr = result"`.
    pub fn from_result(expr: &str, result: &str, anchor: OverlayPosition) -> Self {
        Self {
            text: format!("{expr} = {result}"),
            position: anchor,
        }
    }
}

/// Renders overlay text that carries `$...$` or `\(...\)` math.
///
/// The manager notifies it after every append so freshly revealed text gets
/// typeset, and when the overlay list is emptied.
pub trait Typesetter {
    fn refresh(&mut self, index: usize, text: &str);

    fn clear(&mut self);

    fn rendered(&self, _index: usize) -> Option<&str> {
        None
    }
}

/// Typesetter that leaves text untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTypesetter;

impl Typesetter for NullTypesetter {
    fn refresh(&mut self, _index: usize, _text: &str) {}

    fn clear(&mut self) {}
}

pub struct OverlayManager {
    entries: Vec<OverlayEntry>,
    typesetter: Box<dyn Typesetter>,
}

impl Default for OverlayManager {
    fn default() -> Self {
        Self::new(Box::new(NullTypesetter))
    }
}

impl std::fmt::Debug for OverlayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayManager")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl OverlayManager {
    pub fn new(typesetter: Box<dyn Typesetter>) -> Self {
        Self {
            entries: Vec::new(),
            typesetter,
        }
    }

    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `entry` and hands its text to the typesetter. Returns its index.
    pub fn reveal(&mut self, entry: OverlayEntry) -> usize {
        let index = self.entries.len();
        tracing::debug!(index, text = %entry.text, "revealing overlay");
        self.typesetter.refresh(index, &entry.text);
        self.entries.push(entry);
        index
    }

    /// Moves a single entry. Returns `false` for an unknown index.
    pub fn reposition(&mut self, index: usize, position: OverlayPosition) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.typesetter.clear();
    }

    /// Text to draw for entry `index`: the typeset form when available.
    pub fn display_text(&self, index: usize) -> Option<&str> {
        let entry = self.entries.get(index)?;
        Some(
            self.typesetter
                .rendered(index)
                .unwrap_or(entry.text.as_str()),
        )
    }
}
