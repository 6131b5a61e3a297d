//! Business-pattern analysis
//!
//! Each facet is derived from its own scan of the sheet, so facets never see
//! each other's results. The only shared input is the table list used for
//! the `data_table` UI components.

use serde::Serialize;
use serde_json::Value;
use sheet_lens_core::{CellAddress, CellValue, DataValidation, Worksheet};

use crate::dependency::{categorize_formula, DependencyType, FormulaCategory, FormulaDependency};
use crate::record::cell_json;
use crate::rules::{contains_any, DASHBOARD_KEYWORDS};
use crate::tables::{Table, TableContext};

/// Formula cells a row must exceed to count as a calculation engine
const CALCULATION_DENSITY: usize = 3;

/// Font size (points) above which a title counts as oversized
const TITLE_FONT_SIZE: f64 = 12.0;

// === Grid helpers ===

/// Every position from A1 to the last stored row and column, row-major
pub(crate) fn grid_positions(sheet: &Worksheet) -> impl Iterator<Item = (u32, u16)> {
    let grid = sheet.grid_range();
    (grid.start.row..=grid.end.row)
        .flat_map(move |row| (grid.start.col..=grid.end.col).map(move |col| (row, col)))
}

/// Validation rule covering a cell, ignoring prompt-only rules
pub(crate) fn cell_validation(sheet: &Worksheet, row: u32, col: u16) -> Option<&DataValidation> {
    sheet
        .data_validation_at(row, col)
        .filter(|rule| rule.is_restrictive())
}

fn validated_cells(sheet: &Worksheet) -> impl Iterator<Item = (u32, u16, &DataValidation)> + '_ {
    grid_positions(sheet)
        .filter_map(|(row, col)| cell_validation(sheet, row, col).map(|rule| (row, col, rule)))
}

fn a1(row: u32, col: u16) -> String {
    CellAddress::new(row, col).to_a1_string()
}

// === Business logic patterns ===

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSection {
    pub cell: String,
    pub validation_type: String,
    pub validation_formula: Option<String>,
    pub value: Value,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineFormula {
    pub cell: String,
    pub formula: String,
    pub category: FormulaCategory,
}

/// A row dense enough in formulas to be a calculation block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationEngine {
    /// 1-based row number
    pub row: u32,
    pub formula_count: usize,
    pub formulas: Vec<EngineFormula>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDashboard {
    pub cell: String,
    pub title: String,
    pub area_start: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessLogicPatterns {
    pub input_sections: Vec<InputSection>,
    pub calculation_engines: Vec<CalculationEngine>,
    pub output_dashboards: Vec<OutputDashboard>,
}

pub fn input_sections(sheet: &Worksheet) -> Vec<InputSection> {
    validated_cells(sheet)
        .map(|(row, col, rule)| InputSection {
            cell: a1(row, col),
            validation_type: rule.kind.as_str().to_string(),
            validation_formula: rule.formula1.clone(),
            value: cell_json(sheet, row, col),
            comment: sheet.comment_at(row, col).map(|c| c.text.clone()),
        })
        .collect()
}

pub fn calculation_engines(sheet: &Worksheet) -> Vec<CalculationEngine> {
    let grid = sheet.grid_range();
    (grid.start.row..=grid.end.row)
        .filter_map(|row| {
            let formulas: Vec<EngineFormula> = sheet
                .iter_row(row)
                .filter_map(|(col, data)| {
                    let formula = data.value.formula_text()?;
                    Some(EngineFormula {
                        cell: a1(row, col),
                        formula: formula.to_string(),
                        category: categorize_formula(formula),
                    })
                })
                .collect();
            (formulas.len() > CALCULATION_DENSITY).then(|| CalculationEngine {
                row: row + 1,
                formula_count: formulas.len(),
                formulas,
            })
        })
        .collect()
}

pub fn output_dashboards(sheet: &Worksheet) -> Vec<OutputDashboard> {
    sheet
        .iter_cells()
        .filter_map(|(row, col, data)| {
            let CellValue::String(text) = &data.value else {
                return None;
            };
            if !contains_any(&text.as_str().to_lowercase(), DASHBOARD_KEYWORDS) {
                return None;
            }
            let style = sheet.cell_style_at(row, col)?;
            if !(style.font.bold || style.font.size > TITLE_FONT_SIZE) {
                return None;
            }
            let cell = a1(row, col);
            Some(OutputDashboard {
                area_start: cell.clone(),
                cell,
                title: text.to_string(),
            })
        })
        .collect()
}

pub fn analyze_patterns(sheet: &Worksheet) -> BusinessLogicPatterns {
    BusinessLogicPatterns {
        input_sections: input_sections(sheet),
        calculation_engines: calculation_engines(sheet),
        output_dashboards: output_dashboards(sheet),
    }
}

// === Software requirements ===

/// Something a replacement application has to show on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiComponent {
    InputField {
        location: String,
        input_type: String,
        validation: Option<String>,
        current_value: Value,
        label: String,
    },
    DataTable {
        location: String,
        headers: Vec<String>,
        business_context: TableContext,
    },
}

impl UiComponent {
    pub fn kind(&self) -> &'static str {
        match self {
            UiComponent::InputField { .. } => "input_field",
            UiComponent::DataTable { .. } => "data_table",
        }
    }

    pub fn location(&self) -> &str {
        match self {
            UiComponent::InputField { location, .. } | UiComponent::DataTable { location, .. } => {
                location
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    ConditionalRule,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::ConditionalRule => "conditional_rule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub location: String,
    pub formula: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRule {
    pub cell: String,
    pub validation_type: String,
    pub formula: Option<String>,
    pub error_message: Option<String>,
    pub input_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn for_dependency(kind: DependencyType) -> Self {
        match kind {
            DependencyType::SimpleCalculation => Priority::Low,
            DependencyType::Aggregation | DependencyType::ConditionalLogic => Priority::Medium,
            DependencyType::DataLookup
            | DependencyType::FinancialCalculation
            | DependencyType::CrossSheetReference => Priority::High,
        }
    }
}

/// Formulas of one dependency type, to be implemented together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationSequence {
    #[serde(rename = "type")]
    pub kind: DependencyType,
    pub calculations: Vec<FormulaDependency>,
    pub complexity: u32,
    pub implementation_priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoftwareRequirements {
    pub ui_components: Vec<UiComponent>,
    pub business_rules: Vec<BusinessRule>,
    pub data_validation_rules: Vec<ValidationRule>,
    pub calculation_sequences: Vec<CalculationSequence>,
}

/// Text label for an input cell: the left neighbor, then the one above
pub fn find_label(sheet: &Worksheet, row: u32, col: u16) -> String {
    let text_at = |row: u32, col: u16| match sheet.get_value_at(row, col) {
        CellValue::String(s) if !s.as_str().is_empty() => Some(s.to_string()),
        _ => None,
    };
    col.checked_sub(1)
        .and_then(|left| text_at(row, left))
        .or_else(|| row.checked_sub(1).and_then(|above| text_at(above, col)))
        .unwrap_or_else(|| format!("Cell_{}", a1(row, col)))
}

pub fn ui_components(sheet: &Worksheet, tables: &[Table]) -> Vec<UiComponent> {
    let inputs = validated_cells(sheet).map(|(row, col, rule)| UiComponent::InputField {
        location: a1(row, col),
        input_type: rule.kind.as_str().to_string(),
        validation: rule.formula1.clone(),
        current_value: cell_json(sheet, row, col),
        label: find_label(sheet, row, col),
    });
    let outputs = tables
        .iter()
        .filter(|t| t.is_output_table)
        .map(|t| UiComponent::DataTable {
            location: t.range.clone(),
            headers: t.headers.clone(),
            business_context: t.business_context,
        });
    inputs.chain(outputs).collect()
}

pub fn business_rules(sheet: &Worksheet) -> Vec<BusinessRule> {
    sheet
        .formula_cells()
        .filter(|(_, _, formula)| formula.to_uppercase().contains("IF("))
        .map(|(row, col, formula)| BusinessRule {
            kind: RuleKind::ConditionalRule,
            location: a1(row, col),
            formula: formula.to_string(),
            description: format!("Conditional calculation based on: {}", formula),
        })
        .collect()
}

pub fn validation_rules(sheet: &Worksheet) -> Vec<ValidationRule> {
    validated_cells(sheet)
        .map(|(row, col, rule)| ValidationRule {
            cell: a1(row, col),
            validation_type: rule.kind.as_str().to_string(),
            formula: rule.formula1.clone(),
            error_message: rule.error_message.clone(),
            input_message: rule.input_message.clone(),
        })
        .collect()
}

/// Group dependencies by type, groups in first-seen order
pub fn calculation_sequences(dependencies: &[FormulaDependency]) -> Vec<CalculationSequence> {
    let mut sequences: Vec<CalculationSequence> = Vec::new();
    for dep in dependencies {
        match sequences.iter_mut().find(|s| s.kind == dep.dependency_type) {
            Some(sequence) => {
                sequence.complexity += dep.complexity_score;
                sequence.calculations.push(dep.clone());
            }
            None => sequences.push(CalculationSequence {
                kind: dep.dependency_type,
                calculations: vec![dep.clone()],
                complexity: dep.complexity_score,
                implementation_priority: Priority::for_dependency(dep.dependency_type),
            }),
        }
    }
    sequences
}

pub fn software_requirements(
    sheet: &Worksheet,
    tables: &[Table],
    dependencies: &[FormulaDependency],
) -> SoftwareRequirements {
    SoftwareRequirements {
        ui_components: ui_components(sheet, tables),
        business_rules: business_rules(sheet),
        data_validation_rules: validation_rules(sheet),
        calculation_sequences: calculation_sequences(dependencies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::extract;
    use crate::tables::detect_tables;
    use pretty_assertions::assert_eq;
    use sheet_lens_core::{CellComment, CellRange, Style, ValidationOperator};

    fn input_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Inputs");
        sheet.set_cell_value("A2", "Growth rate").unwrap();
        sheet.set_cell_value("B2", 0.05).unwrap();
        sheet.set_cell_value("C1", "Region").unwrap();
        sheet.set_cell_value("C2", "EMEA").unwrap();
        sheet
            .set_comment("B2", CellComment::new("Ops", "Annual growth"))
            .unwrap();
        sheet.add_data_validation(
            DataValidation::decimal(ValidationOperator::Between, "0")
                .with_formula2("1")
                .with_range(CellRange::parse("B2").unwrap())
                .with_error_message("Out of range", "Enter a fraction"),
        );
        sheet.add_data_validation(
            DataValidation::list("\"EMEA,APAC\"").with_range(CellRange::parse("C2:C3").unwrap()),
        );
        sheet
    }

    #[test]
    fn test_input_sections_cover_validated_grid_cells() {
        let sheet = input_sheet();
        let sections = input_sections(&sheet);
        let cells: Vec<_> = sections.iter().map(|s| s.cell.as_str()).collect();
        // C3 lies outside the stored grid
        assert_eq!(cells, vec!["B2", "C2"]);
        assert_eq!(sections[0].validation_type, "decimal");
        assert_eq!(sections[0].validation_formula.as_deref(), Some("0"));
        assert_eq!(sections[0].value, serde_json::json!(0.05));
        assert_eq!(sections[0].comment.as_deref(), Some("Annual growth"));
        assert_eq!(sections[1].value, serde_json::json!("EMEA"));
    }

    #[test]
    fn test_labels_prefer_left_then_above() {
        let sheet = input_sheet();
        assert_eq!(find_label(&sheet, 1, 1), "Growth rate");
        // B2 holds a number, so C2 falls through to C1
        assert_eq!(find_label(&sheet, 1, 2), "Region");
        assert_eq!(find_label(&sheet, 0, 0), "Cell_A1");
    }

    #[test]
    fn test_prompt_only_rules_are_not_inputs() {
        let mut sheet = Worksheet::new("S");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.add_data_validation(
            DataValidation::new(sheet_lens_core::ValidationKind::None)
                .with_range(CellRange::parse("A1").unwrap())
                .with_input_message("Hint", "Type a number"),
        );
        assert!(input_sections(&sheet).is_empty());
        assert!(validation_rules(&sheet).is_empty());
    }

    #[test]
    fn test_calculation_engine_needs_more_than_three_formulas() {
        let mut sheet = Worksheet::new("Calc");
        for col in 0..4u16 {
            sheet.set_cell_formula_at(0, col, "A5*2").unwrap();
        }
        for col in 0..3u16 {
            sheet.set_cell_formula_at(1, col, "A5*2").unwrap();
        }
        sheet.set_cell_formula_at(0, 4, "SUM(A1:D1)").unwrap();

        let engines = calculation_engines(&sheet);
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].row, 1);
        assert_eq!(engines[0].formula_count, 5);
        assert_eq!(engines[0].formulas[4].category, FormulaCategory::Aggregation);
    }

    #[test]
    fn test_dashboards_need_emphasis() {
        let mut sheet = Worksheet::new("Report");
        sheet.set_cell_value("A1", "Sales Summary").unwrap();
        sheet.set_cell_style("A1", &Style::new().bold()).unwrap();
        sheet.set_cell_value("A2", "Total units").unwrap();
        sheet.set_cell_value("A3", "Grand Total").unwrap();
        sheet.set_cell_style("A3", &Style::new().font_size(14.0)).unwrap();
        sheet.set_cell_value("A4", "Notes").unwrap();
        sheet.set_cell_style("A4", &Style::new().bold()).unwrap();

        let titles: Vec<_> = output_dashboards(&sheet)
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["Sales Summary", "Grand Total"]);
    }

    #[test]
    fn test_ui_components_and_rules() {
        let mut sheet = input_sheet();
        sheet.set_cell_formula("D2", "IF(B2>0.1,\"high\",\"low\")").unwrap();
        sheet.set_cell_value("A5", "Output").unwrap();
        sheet.set_cell_value("B5", "Total").unwrap();
        sheet.set_cell_style("A5", &Style::new().bold()).unwrap();
        sheet.set_cell_style("B5", &Style::new().bold()).unwrap();

        let tables = detect_tables(&sheet);
        let components = ui_components(&sheet, &tables);
        let kinds: Vec<_> = components.iter().map(|c| (c.kind(), c.location())).collect();
        // the grid now reaches row 5, so C3 is a validated cell too
        assert_eq!(
            kinds,
            vec![
                ("input_field", "B2"),
                ("input_field", "C2"),
                ("input_field", "C3"),
                ("data_table", "A5:B5"),
            ]
        );

        let json = serde_json::to_value(&components[0]).unwrap();
        assert_eq!(json["type"], "input_field");
        assert_eq!(json["label"], "Growth rate");

        let rules = business_rules(&sheet);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].location, "D2");
        assert_eq!(
            rules[0].description,
            "Conditional calculation based on: =IF(B2>0.1,\"high\",\"low\")"
        );

        let validations = validation_rules(&sheet);
        assert_eq!(validations[0].error_message.as_deref(), Some("Enter a fraction"));
    }

    #[test]
    fn test_sequences_group_in_first_seen_order() {
        let deps = vec![
            extract("A1", "=B1*2"),
            extract("A2", "=SUM(B1:B9)"),
            extract("A3", "=B3+1"),
            extract("A4", "=Rates!B2*A3"),
        ];
        let sequences = calculation_sequences(&deps);
        let summary: Vec<_> = sequences
            .iter()
            .map(|s| (s.kind, s.calculations.len(), s.complexity, s.implementation_priority))
            .collect();
        assert_eq!(
            summary,
            vec![
                (DependencyType::SimpleCalculation, 2, 1 + 1, Priority::Low),
                (DependencyType::Aggregation, 1, 2, Priority::Medium),
                (DependencyType::CrossSheetReference, 1, 3, Priority::High),
            ]
        );
    }
}
