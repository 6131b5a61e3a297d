//! Cell formatting
//!
//! Only the parts of a cell format that the structural heuristics read are
//! modelled: the font (bold, italic, size), the fill, and the number format.

mod fill;
mod font;
mod number_format;
mod pool;

pub use fill::FillStyle;
pub use font::FontStyle;
pub use number_format::NumberFormat;
pub use pool::StylePool;

/// Formatting attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Style {
    pub font: FontStyle,
    pub fill: FillStyle,
    pub number_format: NumberFormat,
}

impl Style {
    /// Create the default style (Calibri 11, no fill, General)
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the font bold
    pub fn bold(mut self) -> Self {
        self.font.bold = true;
        self
    }

    /// Make the font italic
    pub fn italic(mut self) -> Self {
        self.font.italic = true;
        self
    }

    /// Set the font size in points
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    /// Set a solid background color (`RRGGBB` or `AARRGGBB`)
    pub fn fill_color(mut self, rgb: impl Into<String>) -> Self {
        self.fill = FillStyle::solid(rgb);
        self
    }

    /// Set a custom number format string
    pub fn number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = NumberFormat::Custom(format.into());
        self
    }

    /// Check if this is the default style
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
