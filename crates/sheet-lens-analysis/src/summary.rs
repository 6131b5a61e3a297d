//! Workbook summary
//!
//! Each [`SheetRecord`] is reduced to an immutable [`SheetRollup`]; the
//! summary is a fold over those rollups in workbook order.

use std::fmt;

use ahash::AHashSet;
use serde::ser::Serializer;
use serde::Serialize;

use crate::record::SheetRecord;
use crate::rules::FORMULA_PATTERN_TOKENS;

/// Overall rating from the total formula count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComplexityRating {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityRating {
    pub fn from_formula_count(total: usize) -> Self {
        match total {
            n if n > 500 => ComplexityRating::VeryHigh,
            n if n > 200 => ComplexityRating::High,
            n if n > 50 => ComplexityRating::Medium,
            _ => ComplexityRating::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityRating::Low => "Low",
            ComplexityRating::Medium => "Medium",
            ComplexityRating::High => "High",
            ComplexityRating::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for ComplexityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ComplexityRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Pattern token → number of formulas containing it
///
/// Entries are sorted by count, highest first; equal counts keep the token
/// order of [`FORMULA_PATTERN_TOKENS`]. Tokens never seen are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaPatterns(Vec<(&'static str, usize)>);

impl FormulaPatterns {
    fn from_counts(counts: &[usize]) -> Self {
        let mut entries: Vec<(&'static str, usize)> = FORMULA_PATTERN_TOKENS
            .iter()
            .copied()
            .zip(counts.iter().copied())
            .filter(|(_, count)| *count > 0)
            .collect();
        // stable sort keeps token order on ties
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        FormulaPatterns(entries)
    }

    pub fn get(&self, token: &str) -> Option<usize> {
        self.0.iter().find(|(t, _)| *t == token).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.0.iter().copied()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(t, _)| *t)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FormulaPatterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(t, c)| (*t, *c)))
    }
}

/// Counters for one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRollup {
    pub name: String,
    pub formula_count: usize,
    pub table_count: usize,
    pub ui_components: usize,
    pub business_rules: usize,
    pub calculation_sequences: usize,
    #[serde(skip)]
    pub input_fields: usize,
    #[serde(skip)]
    pub outputs: usize,
    #[serde(skip)]
    pub cross_sheet_formulas: usize,
    /// Distinct sheets referenced from this sheet's formulas
    #[serde(skip)]
    pub external_sheets: Vec<String>,
    /// Per-token formula counts, in [`FORMULA_PATTERN_TOKENS`] order
    #[serde(skip)]
    pub pattern_counts: Vec<usize>,
}

impl SheetRollup {
    pub fn from_record(record: &SheetRecord) -> Self {
        let requirements = &record.software_requirements;
        let mut pattern_counts = vec![0; FORMULA_PATTERN_TOKENS.len()];
        let mut cross_sheet_formulas = 0;
        let mut external_sheets: Vec<String> = Vec::new();

        for dep in &record.data_dependencies {
            let upper = dep.formula.to_uppercase();
            if upper.contains('!') {
                cross_sheet_formulas += 1;
            }
            for (count, token) in pattern_counts.iter_mut().zip(FORMULA_PATTERN_TOKENS) {
                if upper.contains(*token) {
                    *count += 1;
                }
            }
            for reference in &dep.sheet_dependencies {
                if reference.sheet != record.name && !external_sheets.contains(&reference.sheet) {
                    external_sheets.push(reference.sheet.clone());
                }
            }
        }

        SheetRollup {
            name: record.name.clone(),
            formula_count: record.formula_count(),
            table_count: record.tables.len(),
            ui_components: requirements.ui_components.len(),
            business_rules: requirements.business_rules.len(),
            calculation_sequences: requirements.calculation_sequences.len(),
            input_fields: record.business_logic_patterns.input_sections.len(),
            outputs: record.business_logic_patterns.output_dashboards.len(),
            cross_sheet_formulas,
            external_sheets,
            pattern_counts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostFormulas {
    pub sheet: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusinessComplexity {
    pub total_input_fields: usize,
    pub total_calculations: usize,
    pub total_outputs: usize,
    pub cross_sheet_references: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImplementationEstimates {
    pub ui_components: usize,
    pub business_rules: usize,
    pub integrations_needed: usize,
    pub complexity_score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookSummary {
    pub sheet_count: usize,
    pub sheets: Vec<SheetRollup>,
    pub formula_patterns: FormulaPatterns,
    /// `None` when no sheet has a formula
    pub most_formulas: Option<MostFormulas>,
    pub business_complexity: BusinessComplexity,
    pub implementation_estimates: ImplementationEstimates,
    pub complexity_rating: ComplexityRating,
}

impl WorkbookSummary {
    pub fn total_formulas(&self) -> usize {
        self.business_complexity.total_calculations
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Running totals of the fold
#[derive(Default)]
struct Totals {
    complexity: BusinessComplexity,
    estimates: ImplementationEstimates,
    pattern_counts: Vec<usize>,
    external_sheets: AHashSet<String>,
    most_formulas: Option<MostFormulas>,
}

impl Totals {
    fn add(mut self, rollup: &SheetRollup) -> Self {
        self.complexity.total_input_fields += rollup.input_fields;
        self.complexity.total_calculations += rollup.formula_count;
        self.complexity.total_outputs += rollup.outputs;
        self.complexity.cross_sheet_references += rollup.cross_sheet_formulas;

        self.estimates.ui_components += rollup.ui_components;
        self.estimates.business_rules += rollup.business_rules;
        self.estimates.complexity_score += rollup.formula_count;

        self.pattern_counts
            .resize(rollup.pattern_counts.len().max(self.pattern_counts.len()), 0);
        for (total, count) in self.pattern_counts.iter_mut().zip(&rollup.pattern_counts) {
            *total += count;
        }
        self.external_sheets
            .extend(rollup.external_sheets.iter().cloned());

        // strictly greater, so the first sheet wins ties and zero never wins
        let best = self.most_formulas.as_ref().map_or(0, |m| m.count);
        if rollup.formula_count > best {
            self.most_formulas = Some(MostFormulas {
                sheet: rollup.name.clone(),
                count: rollup.formula_count,
            });
        }
        self
    }
}

/// Fold per-sheet rollups into the workbook summary
pub fn summarize(rollups: Vec<SheetRollup>) -> WorkbookSummary {
    let totals = rollups.iter().fold(Totals::default(), Totals::add);
    let mut estimates = totals.estimates;
    estimates.integrations_needed = totals.external_sheets.len();

    WorkbookSummary {
        sheet_count: rollups.len(),
        formula_patterns: FormulaPatterns::from_counts(&totals.pattern_counts),
        most_formulas: totals.most_formulas,
        complexity_rating: ComplexityRating::from_formula_count(
            totals.complexity.total_calculations,
        ),
        business_complexity: totals.complexity,
        implementation_estimates: estimates,
        sheets: rollups,
    }
}

pub fn summarize_records(records: &[SheetRecord]) -> WorkbookSummary {
    summarize(records.iter().map(SheetRollup::from_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rollup(name: &str, formulas: usize, patterns: [usize; 7]) -> SheetRollup {
        SheetRollup {
            name: name.into(),
            formula_count: formulas,
            table_count: 0,
            ui_components: 1,
            business_rules: 0,
            calculation_sequences: 0,
            input_fields: 0,
            outputs: 0,
            cross_sheet_formulas: 0,
            external_sheets: Vec::new(),
            pattern_counts: patterns.to_vec(),
        }
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(ComplexityRating::from_formula_count(0), ComplexityRating::Low);
        assert_eq!(ComplexityRating::from_formula_count(50), ComplexityRating::Low);
        assert_eq!(ComplexityRating::from_formula_count(51), ComplexityRating::Medium);
        assert_eq!(ComplexityRating::from_formula_count(201), ComplexityRating::High);
        assert_eq!(ComplexityRating::from_formula_count(501).as_str(), "Very High");
    }

    #[test]
    fn test_most_formulas_first_seen_wins() {
        let summary = summarize(vec![
            rollup("A", 3, [0; 7]),
            rollup("B", 5, [0; 7]),
            rollup("C", 5, [0; 7]),
        ]);
        assert_eq!(
            summary.most_formulas,
            Some(MostFormulas {
                sheet: "B".into(),
                count: 5
            })
        );
        assert_eq!(summary.total_formulas(), 13);
        assert_eq!(summary.implementation_estimates.ui_components, 3);
    }

    #[test]
    fn test_zero_formulas_never_wins() {
        let summary = summarize(vec![rollup("Empty", 0, [0; 7])]);
        assert_eq!(summary.most_formulas, None);
        assert!(summary.formula_patterns.is_empty());
    }

    #[test]
    fn test_patterns_sorted_with_stable_ties() {
        // SUM( IF( VLOOKUP( INDEX( MATCH( NPV( IRR(
        let summary = summarize(vec![
            rollup("A", 4, [1, 2, 0, 2, 0, 0, 0]),
            rollup("B", 2, [1, 0, 0, 0, 0, 0, 3]),
        ]);
        let order: Vec<_> = summary.formula_patterns.iter().collect();
        assert_eq!(
            order,
            vec![("IRR(", 3), ("SUM(", 2), ("IF(", 2), ("INDEX(", 2)]
        );
        let json = serde_json::to_string(&summary.formula_patterns).unwrap();
        assert_eq!(json, r#"{"IRR(":3,"SUM(":2,"IF(":2,"INDEX(":2}"#);
    }

    #[test]
    fn test_serialized_rollup_hides_internal_counters() {
        let json = serde_json::to_value(rollup("A", 1, [0; 7])).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "business_rules",
                "calculation_sequences",
                "formula_count",
                "name",
                "table_count",
                "ui_components"
            ]
        );
    }
}
