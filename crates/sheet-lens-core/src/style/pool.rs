//! Style deduplication

use super::Style;
use ahash::AHashMap;

/// Deduplicating store of styles, addressed by index
///
/// Index 0 is always the default style.
#[derive(Debug)]
pub struct StylePool {
    styles: Vec<Style>,
    index_map: AHashMap<Style, u32>,
}

impl StylePool {
    pub fn new() -> Self {
        let default = Style::default();
        let mut index_map = AHashMap::with_capacity(16);
        index_map.insert(default.clone(), 0);
        Self {
            styles: vec![default],
            index_map,
        }
    }

    /// Get or create a style, returning its index
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        if let Some(&idx) = self.index_map.get(&style) {
            return idx;
        }
        let idx = self.styles.len() as u32;
        self.styles.push(style.clone());
        self.index_map.insert(style, idx);
        idx
    }

    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when only the default style is present
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}
