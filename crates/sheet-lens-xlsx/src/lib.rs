//! # sheet-lens-xlsx
//!
//! Reads `.xlsx` workbooks into the [`sheet_lens_core`] model.
//!
//! Only what the structural analysis looks at is loaded: cell values and
//! formulas, fonts, fills and number formats, data validations, comments and
//! defined names. Cells that cannot be decoded are logged, skipped and kept in
//! [`Worksheet::skipped_cells`](sheet_lens_core::Worksheet::skipped_cells).

pub mod error;
pub mod reader;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
