//! Sparse cell storage
//!
//! Only populated cells are stored, row-major, in ordered maps so that a
//! row-by-row scan visits cells in sheet order.

use std::collections::BTreeMap;

use super::{CellValue, StringPool};
use crate::style::StylePool;

/// Value plus style reference for one cell
#[derive(Debug, Clone, Default)]
pub struct CellData {
    pub value: CellValue,
    /// Index into the owning storage's [`StylePool`] (0 = default style)
    pub style_index: u32,
}

impl CellData {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }
}

/// Row-major sparse storage: `BTreeMap<row, BTreeMap<col, CellData>>`
#[derive(Debug, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
    pub(crate) string_pool: StringPool,
    pub(crate) style_pool: StylePool,
}

impl CellStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Store a cell, replacing whatever was there
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        self.rows.entry(row).or_default().insert(col, data);
    }

    /// Replace a cell's value, keeping its style
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .value = value;
    }

    /// Replace a cell's style index, keeping its value
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .style_index = style_index;
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(BTreeMap::is_empty)
    }

    /// Bounds of stored cells as `(min_row, min_col, max_row, max_col)`
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;
        for (&row, cols) in &self.rows {
            let (Some(&first), Some(&last)) = (cols.keys().next(), cols.keys().next_back())
            else {
                continue;
            };
            bounds = Some(match bounds {
                None => (row, first, row, last),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(first), r1.max(row), c1.max(last)),
            });
        }
        bounds
    }

    /// Iterate all stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    /// Iterate the stored cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    pub fn string_pool_mut(&mut self) -> &mut StringPool {
        &mut self.string_pool
    }

    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_bounds_spans_sparse_rows() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.used_bounds(), None);

        storage.set_value(2, 4, CellValue::from(1.0));
        storage.set_value(7, 1, CellValue::from("x"));
        assert_eq!(storage.used_bounds(), Some((2, 1, 7, 4)));
        assert_eq!(storage.cell_count(), 2);
    }

    #[test]
    fn test_iter_is_row_major() {
        let mut storage = CellStorage::new();
        storage.set_value(1, 0, CellValue::from(3.0));
        storage.set_value(0, 2, CellValue::from(2.0));
        storage.set_value(0, 1, CellValue::from(1.0));

        let order: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (0, 2), (1, 0)]);
    }

    #[test]
    fn test_set_style_keeps_value() {
        let mut storage = CellStorage::new();
        storage.set_value(0, 0, CellValue::from("Revenue"));
        storage.set_style(0, 0, 3);
        let cell = storage.get(0, 0).unwrap();
        assert_eq!(cell.value.as_string(), Some("Revenue"));
        assert_eq!(cell.style_index, 3);
    }
}
