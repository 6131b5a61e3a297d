//! # sheet-lens-analysis
//!
//! Structural analysis of spreadsheet workbooks.
//!
//! Starting from a [`sheet_lens_core::Workbook`], this crate works out what
//! each sheet is for:
//! - [`classify`] - Semantic type of a single cell
//! - [`tables`] - Header-driven table detection
//! - [`dependency`] - Formula references and computational category
//! - [`patterns`] and [`named_ranges`] - Inputs, calculation zones, outputs
//!   and the requirements they imply
//! - [`record`] and [`summary`] - Per-sheet records and the workbook summary
//! - [`render`] - Markdown pages
//! - [`chunk`] and [`generate`] - Token-bounded chunking and the chunked
//!   generation driver
//!
//! The crate has no network code. Text generation goes through the
//! [`TextGenerator`] trait.
//!
//! ## Example
//!
//! ```rust
//! use sheet_lens_analysis::analyze_workbook;
//! use sheet_lens_core::{Style, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "Revenue").unwrap();
//! sheet.set_cell_value("B1", "Cost").unwrap();
//! sheet.set_cell_style("A1", &Style::new().bold()).unwrap();
//! sheet.set_cell_style("B1", &Style::new().bold()).unwrap();
//! sheet.set_cell_value("A2", 1200.0).unwrap();
//! sheet.set_cell_value("B2", 800.0).unwrap();
//!
//! let analysis = analyze_workbook(&workbook);
//! let record = &analysis.sheets[0];
//! assert_eq!(record.tables.len(), 1);
//! assert_eq!(record.tables[0].business_context.as_str(), "financial");
//! ```

pub mod chunk;
pub mod classify;
pub mod dependency;
pub mod error;
pub mod generate;
pub mod named_ranges;
pub mod patterns;
pub mod record;
pub mod render;
pub mod rules;
pub mod summary;
pub mod tables;
pub mod workbook;

pub use chunk::{chunk_text, ApproximateTokenCounter, ChunkerConfig, TextChunk, TokenCounter};
pub use classify::{classify, SemanticType};
pub use dependency::{extract_dependencies, DependencyType, FormulaCategory, FormulaDependency};
pub use error::{AnalysisError, AnalysisResult, ChunkFailure};
pub use generate::{
    ChunkedAnalyzer, GeneratedDocument, GenerationConfig, GenerationError, TextGenerator,
    WorkbookContext,
};
pub use named_ranges::{extract_named_ranges, NamedRangeInfo, RangePurpose};
pub use record::{analyze_sheet, SheetRecord};
pub use summary::{ComplexityRating, WorkbookSummary};
pub use tables::{detect_tables, Table, TableContext};
pub use workbook::{analyze_workbook, WorkbookAnalysis, WorkbookAnalyzer};
