//! Whole-pipeline tests over workbooks built through the core API

use pretty_assertions::assert_eq;
use serde_json::json;
use sheet_lens_analysis::{
    analyze_workbook, ChunkedAnalyzer, ChunkerConfig, DependencyType, GenerationConfig,
    GenerationError, TableContext, TextGenerator, WorkbookContext,
};
use sheet_lens_core::{
    CellComment, CellRange, DataValidation, NamedRange, Style, ValidationOperator, Workbook,
};

fn revenue_model() -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    let bold = Style::new().bold();

    sheet.set_cell_value("A1", "Revenue").unwrap();
    sheet.set_cell_value("B1", "Cost").unwrap();
    sheet.set_cell_style("A1", &bold).unwrap();
    sheet.set_cell_style("B1", &bold).unwrap();
    for row in 2..=10 {
        sheet
            .set_cell_value(&format!("A{row}"), 1000.0 + row as f64)
            .unwrap();
        sheet
            .set_cell_value(&format!("B{row}"), 400.0 + row as f64)
            .unwrap();
    }
    sheet.set_cell_formula("C1", "SUM(B2:B10)").unwrap();
    workbook
}

#[test]
fn test_revenue_sheet() {
    let analysis = analyze_workbook(&revenue_model());
    let record = &analysis.sheets[0];

    assert_eq!(record.tables.len(), 1);
    let table = &record.tables[0];
    assert_eq!(table.headers, vec!["Revenue", "Cost"]);
    assert_eq!(table.business_context, TableContext::Financial);
    assert!(!table.is_input_table);
    assert_eq!(table.row_count, 10);

    assert_eq!(record.data_dependencies.len(), 1);
    let dep = &record.data_dependencies[0];
    assert_eq!(dep.target_cell, "C1");
    assert_eq!(dep.dependency_type, DependencyType::Aggregation);
    assert_eq!(dep.complexity_score, 2);
    assert_eq!(dep.local_dependencies, vec!["B2:B10"]);

    let json = serde_json::to_value(record).unwrap();
    assert_eq!(json["tables"][0]["business_context"], json!("financial"));
    assert_eq!(json["tables"][0]["is_input_table"], json!(false));
    assert_eq!(json["data_dependencies"][0]["dependency_type"], json!("aggregation"));
    assert_eq!(json["data_dependencies"][0]["complexity_score"], json!(2));
    assert_eq!(json["formulas"]["aggregations"][0]["address"], json!("C1"));
    assert_eq!(json["cells"]["A1"]["business_context"], json!("header_or_label"));
    assert_eq!(json["cells"]["C1"]["has_formula"], json!(true));
}

#[test]
fn test_record_facets() {
    let analysis = analyze_workbook(&revenue_model());
    let json = serde_json::to_value(&analysis.sheets[0]).unwrap();
    let facets = json.as_object().unwrap();
    for key in [
        "dimensions",
        "tables",
        "named_ranges",
        "business_logic_patterns",
        "data_dependencies",
        "cells",
        "formulas",
        "software_requirements",
    ] {
        assert!(facets.contains_key(key), "missing {key}");
    }
    let buckets: Vec<_> = json["formulas"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(buckets.len(), 6);
    let requirements = json["software_requirements"].as_object().unwrap();
    for key in [
        "ui_components",
        "business_rules",
        "data_validation_rules",
        "calculation_sequences",
    ] {
        assert!(requirements.contains_key(key), "missing {key}");
    }
}

#[test]
fn test_pricing_workbook() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet_with_name("Rates").unwrap();

    let rates = workbook.worksheet_mut(1).unwrap();
    rates.set_cell_value("A1", "Discount").unwrap();
    rates.set_cell_value("B1", 0.1).unwrap();
    rates.add_data_validation(
        DataValidation::decimal(ValidationOperator::Between, "0")
            .with_formula2("1")
            .with_range(CellRange::parse("B1").unwrap()),
    );
    rates
        .set_comment("B1", CellComment::new("Finance", "Agreed with sales"))
        .unwrap();

    let quote = workbook.worksheet_mut(0).unwrap();
    quote.set_cell_value("A1", "Price").unwrap();
    quote.set_cell_value("B1", 250.0).unwrap();
    quote.set_cell_formula("B2", "B1*(1-Rates!B1)").unwrap();
    quote.set_cell_formula("B3", "IF(B2>200,B2,200)").unwrap();

    workbook
        .define_name(NamedRange::workbook_scope("DiscountRate", "Rates!$B$1"))
        .unwrap();

    let analysis = analyze_workbook(&workbook);
    let quote = analysis.sheet("Sheet1").unwrap();
    let types: Vec<_> = quote
        .data_dependencies
        .iter()
        .map(|d| d.dependency_type)
        .collect();
    assert_eq!(
        types,
        vec![
            DependencyType::CrossSheetReference,
            DependencyType::ConditionalLogic
        ]
    );
    assert_eq!(quote.software_requirements.business_rules.len(), 1);
    assert_eq!(quote.named_ranges[0].range, "Rates!$B$1");

    let rates = analysis.sheet("Rates").unwrap();
    assert_eq!(rates.business_logic_patterns.input_sections.len(), 1);
    assert_eq!(rates.software_requirements.data_validation_rules.len(), 1);
    assert_eq!(
        rates.cells.get("B1").unwrap().business_context.as_str(),
        "documented"
    );

    let summary = &analysis.summary;
    assert_eq!(summary.total_formulas(), 2);
    assert_eq!(summary.business_complexity.cross_sheet_references, 1);
    assert_eq!(summary.business_complexity.total_input_fields, 1);
    assert_eq!(summary.implementation_estimates.integrations_needed, 1);
    assert_eq!(summary.complexity_rating.as_str(), "Low");
    assert_eq!(summary.most_formulas.as_ref().unwrap().sheet, "Sheet1");
}

/// Echoes the chunk label back
struct Echo;

impl TextGenerator for Echo {
    fn generate(&self, prompt: &str, _: &GenerationConfig) -> Result<String, GenerationError> {
        let label = prompt
            .split("Analyze this portion (")
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .ok_or_else(|| GenerationError::Malformed("no chunk label".into()))?;
        Ok(format!("section {label}"))
    }
}

#[test]
fn test_combined_document_through_generator() {
    let analysis = analyze_workbook(&revenue_model());
    let document = analysis.combined_markdown("revenue.xlsx");

    let report = ChunkedAnalyzer::new(&Echo).analyze(&document).unwrap();
    assert_eq!(report.chunk_count, 1);
    assert_eq!(report.text, "section 1/1");

    let small = ChunkerConfig {
        max_tokens: 40,
        fallback_max_tokens: 20,
    };
    let report = ChunkedAnalyzer::new(&Echo)
        .with_chunker(small)
        .analyze(&document)
        .unwrap();
    assert!(report.chunk_count > 1);
    assert!(report.failures.is_empty());
    assert!(report
        .text
        .ends_with(&format!("section {0}/{0}", report.chunk_count)));

    let context = WorkbookContext::from_summary(&analysis.summary);
    assert_eq!(context.formula_patterns, vec!["SUM("]);
    let prd = ChunkedAnalyzer::new(&Echo)
        .requirements(&document, &context)
        .unwrap();
    assert_eq!(prd.text, "section 1/1");
}
