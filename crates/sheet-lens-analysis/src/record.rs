//! Per-sheet analysis record
//!
//! [`analyze_sheet`] composes classification, table detection, dependency
//! extraction and the pattern facets into one [`SheetRecord`] whose JSON
//! shape is the per-sheet artifact.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use sheet_lens_core::{date, CellAddress, CellValue, Worksheet};

use crate::classify::{classify_at, SemanticType};
use crate::dependency::{
    categorize_formula, complexity_score, extract_dependencies, implementation_notes,
    local_references, FormulaCategory, FormulaDependency,
};
use crate::named_ranges::NamedRangeInfo;
use crate::patterns::{
    analyze_patterns, cell_validation, grid_positions, software_requirements,
    BusinessLogicPatterns, SoftwareRequirements,
};
use crate::tables::{detect_tables, Table};

/// JSON rendering of a cell's raw value
///
/// Integral numbers render without a fraction and date-formatted numbers as
/// `YYYY-MM-DD HH:MM:SS`. Formulas render as their text, errors as their
/// literal (`#N/A`).
pub fn cell_json(sheet: &Worksheet, row: u32, col: u16) -> Value {
    match sheet.get_value_at(row, col) {
        CellValue::Empty => Value::Null,
        CellValue::Boolean(b) => Value::Bool(*b),
        CellValue::Number(n) => {
            let is_date = sheet
                .cell_style_at(row, col)
                .is_some_and(|style| style.number_format.is_date_format());
            match date::serial_to_datetime(*n).filter(|_| is_date) {
                Some(dt) => Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => number_json(*n),
            }
        }
        CellValue::String(s) => Value::String(s.to_string()),
        CellValue::Error(e) => Value::String(e.to_string()),
        CellValue::Formula { text, .. } => Value::String(text.clone()),
    }
}

fn number_json(n: f64) -> Value {
    // 2^53: beyond this f64 no longer holds every integer
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < EXACT {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Role a single cell plays in the business model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellContext {
    Documented,
    UserInput,
    Calculated,
    HeaderOrLabel,
    Data,
}

impl CellContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellContext::Documented => "documented",
            CellContext::UserInput => "user_input",
            CellContext::Calculated => "calculated",
            CellContext::HeaderOrLabel => "header_or_label",
            CellContext::Data => "data",
        }
    }
}

impl fmt::Display for CellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CellRecord {
    pub value: Value,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    pub has_formula: bool,
    pub is_styled: bool,
    pub has_validation: bool,
    pub has_comment: bool,
    pub business_context: CellContext,
}

/// Build the record for one grid position
pub fn cell_record(sheet: &Worksheet, row: u32, col: u16) -> CellRecord {
    let font = sheet.cell_style_at(row, col).map(|style| &style.font);
    let is_bold = font.is_some_and(|f| f.bold);
    let has_formula = sheet.get_value_at(row, col).is_formula();
    let has_validation = cell_validation(sheet, row, col).is_some();
    let has_comment = sheet.comment_at(row, col).is_some();

    let business_context = if has_comment {
        CellContext::Documented
    } else if has_validation {
        CellContext::UserInput
    } else if has_formula {
        CellContext::Calculated
    } else if is_bold {
        CellContext::HeaderOrLabel
    } else {
        CellContext::Data
    };

    CellRecord {
        value: cell_json(sheet, row, col),
        semantic_type: classify_at(sheet, row, col),
        has_formula,
        is_styled: font.is_some_and(|f| f.bold || f.italic),
        has_validation,
        has_comment,
        business_context,
    }
}

/// Cell records keyed by A1 address, in row-major order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellMap(Vec<(String, CellRecord)>);

impl CellMap {
    pub fn get(&self, address: &str) -> Option<&CellRecord> {
        self.0
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellRecord)> {
        self.0.iter().map(|(a, record)| (a.as_str(), record))
    }
}

impl Serialize for CellMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (address, record) in &self.0 {
            map.serialize_entry(address, record)?;
        }
        map.end()
    }
}

/// Listing entry for one formula cell
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FormulaMetadata {
    pub address: String,
    pub value: Value,
    pub data_type: SemanticType,
    pub formula: String,
    pub category: FormulaCategory,
    pub dependencies: Vec<String>,
    pub complexity_score: u32,
    pub implementation_notes: String,
}

pub fn formula_metadata(sheet: &Worksheet, row: u32, col: u16, formula: &str) -> FormulaMetadata {
    FormulaMetadata {
        address: CellAddress::new(row, col).to_a1_string(),
        value: cell_json(sheet, row, col),
        data_type: classify_at(sheet, row, col),
        formula: formula.to_string(),
        category: categorize_formula(formula),
        dependencies: local_references(formula),
        complexity_score: complexity_score(formula),
        implementation_notes: implementation_notes(formula),
    }
}

/// Formula listing split by [`FormulaCategory`]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FormulaBuckets {
    pub external_references: Vec<FormulaMetadata>,
    pub aggregations: Vec<FormulaMetadata>,
    pub conditional_logic: Vec<FormulaMetadata>,
    pub financial_functions: Vec<FormulaMetadata>,
    pub data_lookups: Vec<FormulaMetadata>,
    pub other: Vec<FormulaMetadata>,
}

impl FormulaBuckets {
    pub fn bucket(&self, category: FormulaCategory) -> &[FormulaMetadata] {
        match category {
            FormulaCategory::ExternalReference => &self.external_references,
            FormulaCategory::Aggregation => &self.aggregations,
            FormulaCategory::ConditionalLogic => &self.conditional_logic,
            FormulaCategory::FinancialFunction => &self.financial_functions,
            FormulaCategory::DataLookup => &self.data_lookups,
            FormulaCategory::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, category: FormulaCategory) -> &mut Vec<FormulaMetadata> {
        match category {
            FormulaCategory::ExternalReference => &mut self.external_references,
            FormulaCategory::Aggregation => &mut self.aggregations,
            FormulaCategory::ConditionalLogic => &mut self.conditional_logic,
            FormulaCategory::FinancialFunction => &mut self.financial_functions,
            FormulaCategory::DataLookup => &mut self.data_lookups,
            FormulaCategory::Other => &mut self.other,
        }
    }

    pub fn push(&mut self, metadata: FormulaMetadata) {
        self.bucket_mut(metadata.category).push(metadata);
    }

    /// Buckets in serialization order, with their JSON keys
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[FormulaMetadata])> {
        [
            ("external_references", self.external_references.as_slice()),
            ("aggregations", self.aggregations.as_slice()),
            ("conditional_logic", self.conditional_logic.as_slice()),
            ("financial_functions", self.financial_functions.as_slice()),
            ("data_lookups", self.data_lookups.as_slice()),
            ("other", self.other.as_slice()),
        ]
        .into_iter()
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, bucket)| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedCellRecord {
    pub reference: String,
    pub reason: String,
}

/// Everything learned about one worksheet
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SheetRecord {
    pub name: String,
    pub dimensions: String,
    pub tables: Vec<Table>,
    pub named_ranges: Vec<NamedRangeInfo>,
    pub business_logic_patterns: BusinessLogicPatterns,
    pub data_dependencies: Vec<FormulaDependency>,
    pub cells: CellMap,
    pub formulas: FormulaBuckets,
    pub software_requirements: SoftwareRequirements,
    pub skipped_cells: Vec<SkippedCellRecord>,
}

impl SheetRecord {
    pub fn formula_count(&self) -> usize {
        self.data_dependencies.len()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Analyze one worksheet
///
/// `named_ranges` is the workbook-level list; it is carried into the record
/// as is.
pub fn analyze_sheet(sheet: &Worksheet, named_ranges: &[NamedRangeInfo]) -> SheetRecord {
    let tables = detect_tables(sheet);
    let data_dependencies = extract_dependencies(sheet);

    let mut cells = Vec::new();
    let mut formulas = FormulaBuckets::default();
    for (row, col) in grid_positions(sheet) {
        if let Some(formula) = sheet.get_value_at(row, col).formula_text() {
            formulas.push(formula_metadata(sheet, row, col, formula));
        }
        cells.push((
            CellAddress::new(row, col).to_a1_string(),
            cell_record(sheet, row, col),
        ));
    }

    let skipped_cells = sheet
        .skipped_cells()
        .iter()
        .map(|s| SkippedCellRecord {
            reference: s.reference.clone(),
            reason: s.reason.clone(),
        })
        .collect();

    let record = SheetRecord {
        name: sheet.name().to_string(),
        dimensions: sheet.dimensions(),
        business_logic_patterns: analyze_patterns(sheet),
        software_requirements: software_requirements(sheet, &tables, &data_dependencies),
        named_ranges: named_ranges.to_vec(),
        cells: CellMap(cells),
        tables,
        data_dependencies,
        formulas,
        skipped_cells,
    };
    log::debug!(
        "{}: {} cell(s), {} formula(s), {} skipped",
        record.name,
        record.cells.len(),
        record.formula_count(),
        record.skipped_cells.len()
    );
    record
}
