//! Background fills

/// Cell background
///
/// Colors are kept as the raw `rgb` attribute text (`FFFFFF00`), theme
/// colors as `theme:<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    /// No fill
    #[default]
    None,
    /// Solid fill with a foreground color
    Solid { color: String },
    /// Any other pattern (`gray125`, `darkGrid`, ...)
    Pattern {
        pattern: String,
        color: Option<String>,
    },
}

impl FillStyle {
    pub fn solid(color: impl Into<String>) -> Self {
        FillStyle::Solid {
            color: color.into(),
        }
    }

    /// Check if this is "no fill"
    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }

    /// Whether the fill visibly distinguishes the cell
    ///
    /// `gray125` is the placeholder Excel writes into every styles part and
    /// does not count.
    pub fn is_visible(&self) -> bool {
        match self {
            FillStyle::None => false,
            FillStyle::Solid { .. } => true,
            FillStyle::Pattern { pattern, .. } => pattern != "gray125" && pattern != "none",
        }
    }
}
