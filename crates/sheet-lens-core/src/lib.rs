//! # sheet-lens-core
//!
//! Workbook model for the sheet-lens structural analyzer.
//!
//! This crate holds everything a reader produces and an analyzer consumes:
//! - [`CellValue`] - Raw cell values (numbers, strings, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`Style`] - The formatting subset the heuristics look at (font, fill, number format)
//! - [`DataValidation`] and [`CellComment`] - Per-cell metadata
//! - [`Workbook`], [`Worksheet`] and [`NamedRange`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use sheet_lens_core::{Style, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Revenue").unwrap();
//! sheet.set_cell_style("A1", &Style::new().bold()).unwrap();
//! sheet.set_cell_formula("C1", "SUM(B2:B10)").unwrap();
//!
//! assert_eq!(sheet.formula_cells().count(), 1);
//! ```

pub mod cell;
pub mod comment;
pub mod date;
pub mod error;
pub mod named_range;
pub mod style;
pub mod validation;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellError, CellRange, CellValue, SharedString};
pub use comment::CellComment;
pub use error::{Error, Result};
pub use named_range::{NameScope, NamedRange, NamedRangeCollection};
pub use style::{FillStyle, FontStyle, NumberFormat, Style, StylePool};
pub use validation::{DataValidation, ValidationKind, ValidationOperator};
pub use workbook::Workbook;
pub use worksheet::{SkippedCell, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
