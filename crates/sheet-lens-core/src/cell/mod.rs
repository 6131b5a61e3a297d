//! Cell-related types
//!
//! - [`CellValue`] - The raw value stored in a cell
//! - [`CellAddress`] / [`CellRange`] - A1-style locations
//! - [`CellData`] / [`CellStorage`] - Sparse per-sheet storage

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange};
pub use storage::{CellData, CellStorage};
pub use value::{CellError, CellValue, SharedString, StringPool};
