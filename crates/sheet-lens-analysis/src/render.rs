//! Markdown rendering
//!
//! Each document is a `Display` wrapper, so rendering streams into whatever
//! `fmt::Write` the caller holds and `to_string()` gives the whole text.

use std::fmt::{self, Display, Formatter};

use crate::patterns::UiComponent;
use crate::record::SheetRecord;
use crate::summary::WorkbookSummary;

/// Dependencies listed per type before eliding
const DEPENDENCIES_SHOWN: usize = 5;
/// Formulas listed per category before eliding
const FORMULAS_SHOWN: usize = 10;
/// Formula text shown in the dependency listing
const FORMULA_PREVIEW_CHARS: usize = 50;

/// `simple_calculation` → `Simple Calculation`
pub fn title_case(token: &str) -> String {
    token
        .split(|c: char| c == '_' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn preview(formula: &str) -> String {
    let mut shown: String = formula.chars().take(FORMULA_PREVIEW_CHARS).collect();
    if formula.chars().count() > FORMULA_PREVIEW_CHARS {
        shown.push_str("...");
    }
    shown
}

/// One sheet as a requirements-oriented markdown page
pub struct SheetMarkdown<'a>(pub &'a SheetRecord);

impl Display for SheetMarkdown<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sheet = self.0;
        write!(f, "# Sheet: {}\n\n", sheet.name)?;
        write!(f, "Dimensions: {}\n\n", sheet.dimensions)?;

        f.write_str("## Software Implementation Requirements\n\n")?;
        let requirements = &sheet.software_requirements;

        if !requirements.ui_components.is_empty() {
            f.write_str("### UI Components Required\n\n")?;
            for component in &requirements.ui_components {
                writeln!(f, "- **{}** at {}", component.kind(), component.location())?;
                if let UiComponent::InputField {
                    label, validation, ..
                } = component
                {
                    if !label.is_empty() {
                        writeln!(f, "  - Label: {}", label)?;
                    }
                    if let Some(validation) = validation.as_deref().filter(|v| !v.is_empty()) {
                        writeln!(f, "  - Validation: {}", validation)?;
                    }
                }
                f.write_str("\n")?;
            }
        }

        if !requirements.business_rules.is_empty() {
            f.write_str("### Business Rules\n\n")?;
            for rule in &requirements.business_rules {
                writeln!(f, "- **{}** at {}", rule.kind.as_str(), rule.location)?;
                write!(f, "  - Description: {}\n\n", rule.description)?;
            }
        }

        if !requirements.calculation_sequences.is_empty() {
            f.write_str("### Calculation Implementation Sequences\n\n")?;
            for sequence in &requirements.calculation_sequences {
                writeln!(f, "#### {}", title_case(sequence.kind.as_str()))?;
                writeln!(f, "- Complexity Score: {}", sequence.complexity)?;
                writeln!(
                    f,
                    "- Implementation Priority: {}",
                    sequence.implementation_priority.as_str()
                )?;
                write!(
                    f,
                    "- Number of Calculations: {}\n\n",
                    sequence.calculations.len()
                )?;
            }
        }

        if !sheet.tables.is_empty() {
            f.write_str("## Data Tables\n\n")?;
            for table in &sheet.tables {
                writeln!(f, "### {}", table.name)?;
                writeln!(f, "- Range: {}", table.range)?;
                writeln!(f, "- Headers: {}", table.headers.join(", "))?;
                writeln!(f, "- Business Context: {}", table.business_context)?;
                writeln!(f, "- Input Table: {}", table.is_input_table)?;
                writeln!(f, "- Calculation Table: {}", table.is_calculation_table)?;
                writeln!(f, "- Output Table: {}", table.is_output_table)?;
                f.write_str("\n")?;
            }
        }

        if !sheet.data_dependencies.is_empty() {
            f.write_str("## Data Flow and Dependencies\n\n")?;
            for sequence in &requirements.calculation_sequences {
                writeln!(f, "### {}", title_case(sequence.kind.as_str()))?;
                for dep in sequence.calculations.iter().take(DEPENDENCIES_SHOWN) {
                    writeln!(f, "- {}: {}", dep.target_cell, preview(&dep.formula))?;
                    writeln!(f, "  - Complexity: {}", dep.complexity_score)?;
                }
                if sequence.calculations.len() > DEPENDENCIES_SHOWN {
                    writeln!(
                        f,
                        "  - ... and {} more",
                        sequence.calculations.len() - DEPENDENCIES_SHOWN
                    )?;
                }
                f.write_str("\n")?;
            }
        }

        if !sheet.named_ranges.is_empty() {
            f.write_str("## Named Ranges\n\n")?;
            for named in &sheet.named_ranges {
                writeln!(
                    f,
                    "- {}: {} (Purpose: {})",
                    named.name, named.range, named.business_purpose
                )?;
            }
        }

        if !sheet.formulas.is_empty() {
            f.write_str("\n## Formulas by Category\n\n")?;
            for (category, formulas) in sheet.formulas.iter() {
                if formulas.is_empty() {
                    continue;
                }
                writeln!(f, "### {}", title_case(category))?;
                for formula in formulas.iter().take(FORMULAS_SHOWN) {
                    writeln!(f, "- {}: `{}`", formula.address, formula.formula)?;
                    writeln!(f, "  - Implementation: {}", formula.implementation_notes)?;
                    if !formula.dependencies.is_empty() {
                        writeln!(f, "  - Dependencies: {}", formula.dependencies.join(", "))?;
                    }
                }
                if formulas.len() > FORMULAS_SHOWN {
                    writeln!(
                        f,
                        "  - ... and {} more formulas",
                        formulas.len() - FORMULAS_SHOWN
                    )?;
                }
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

/// Workbook summary page
pub struct SummaryMarkdown<'a>(pub &'a WorkbookSummary);

impl Display for SummaryMarkdown<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        f.write_str("# Enhanced Workbook Summary\n\n")?;
        writeln!(f, "Total Sheets: {}", summary.sheet_count)?;
        write!(f, "Overall Complexity: {}\n\n", summary.complexity_rating)?;

        let estimates = &summary.implementation_estimates;
        f.write_str("## Implementation Estimates\n")?;
        writeln!(f, "- UI Components Required: {}", estimates.ui_components)?;
        writeln!(f, "- Business Rules to Implement: {}", estimates.business_rules)?;
        writeln!(f, "- Total Complexity Score: {}", estimates.complexity_score)?;
        writeln!(f, "- Integrations Needed: {}", estimates.integrations_needed)?;
        write!(
            f,
            "- Cross-Sheet References: {}\n\n",
            summary.business_complexity.cross_sheet_references
        )?;

        f.write_str("## Sheet Details\n")?;
        for sheet in &summary.sheets {
            write!(f, "\n### {}\n", sheet.name)?;
            writeln!(f, "- Formula Count: {}", sheet.formula_count)?;
            writeln!(f, "- Table Count: {}", sheet.table_count)?;
            writeln!(f, "- UI Components: {}", sheet.ui_components)?;
            writeln!(f, "- Business Rules: {}", sheet.business_rules)?;
            writeln!(f, "- Calculation Sequences: {}", sheet.calculation_sequences)?;
        }

        f.write_str("\n## Formula Analysis\n")?;
        match &summary.most_formulas {
            Some(most) => write!(
                f,
                "Sheet with Most Formulas: {} ({} formulas)\n\n",
                most.sheet, most.count
            )?,
            None => f.write_str("Sheet with Most Formulas: None (0 formulas)\n\n")?,
        }

        if !summary.formula_patterns.is_empty() {
            f.write_str("Common Formula Patterns:\n")?;
            for (token, count) in summary.formula_patterns.iter() {
                writeln!(f, "- {}: {} occurrences", token, count)?;
            }
        }
        Ok(())
    }
}

/// All sheet pages stitched into one document with a table of contents
pub struct CombinedMarkdown<'a> {
    pub source: &'a str,
    pub sheets: &'a [SheetRecord],
}

impl Display for CombinedMarkdown<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("# Combined Workbook Analysis\n\n")?;
        write!(f, "Source: {}\n\n", self.source)?;
        f.write_str("## Table of Contents\n")?;
        for (i, sheet) in self.sheets.iter().enumerate() {
            writeln!(f, "{}. [{}](#worksheet-{})", i + 1, sheet.name, i + 1)?;
        }
        f.write_str("\n---\n\n")?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            let n = i + 1;
            write!(f, "\n\n{}\n\n", "=".repeat(80))?;
            writeln!(f, "<a name='worksheet-{}'></a>", n)?;
            write!(f, "# Worksheet {}: {}\n\n", n, sheet.name)?;

            let page = SheetMarkdown(sheet).to_string();
            let body = match page.split_once('\n') {
                Some((first, rest)) if first.starts_with("# Sheet:") => rest,
                _ => page.as_str(),
            };
            writeln!(f, "{}", body.trim())?;
        }
        Ok(())
    }
}

pub fn sheet_markdown(record: &SheetRecord) -> String {
    SheetMarkdown(record).to_string()
}

pub fn summary_markdown(summary: &WorkbookSummary) -> String {
    SummaryMarkdown(summary).to_string()
}

pub fn combined_markdown(source: &str, sheets: &[SheetRecord]) -> String {
    CombinedMarkdown { source, sheets }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::named_ranges::NamedRangeInfo;
    use crate::record::analyze_sheet;
    use crate::summary::summarize_records;
    use pretty_assertions::assert_eq;
    use sheet_lens_core::{Style, Worksheet};

    fn sample_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Model");
        sheet.set_cell_value("A1", "Revenue").unwrap();
        sheet.set_cell_value("B1", "Cost").unwrap();
        sheet.set_cell_style("A1", &Style::new().bold()).unwrap();
        sheet.set_cell_style("B1", &Style::new().bold()).unwrap();
        sheet.set_cell_value("A2", 100.0).unwrap();
        sheet.set_cell_value("B2", 60.0).unwrap();
        sheet.set_cell_formula("C1", "SUM(B2:B10)").unwrap();
        sheet
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("simple_calculation"), "Simple Calculation");
        assert_eq!(title_case("cross_sheet_reference"), "Cross Sheet Reference");
        assert_eq!(title_case("other"), "Other");
    }

    #[test]
    fn test_preview_truncates_long_formulas() {
        let long = format!("={}", "A1+".repeat(30));
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), FORMULA_PREVIEW_CHARS + 3);
        assert_eq!(preview("=A1"), "=A1");
    }

    #[test]
    fn test_sheet_page() {
        let names = vec![NamedRangeInfo {
            name: "TaxRate".into(),
            range: "Rates!$B$2".into(),
            business_purpose: crate::named_ranges::RangePurpose::CalculationFactor,
        }];
        let page = sheet_markdown(&analyze_sheet(&sample_sheet(), &names));

        assert!(page.starts_with("# Sheet: Model\n\nDimensions: A1:C2\n\n"));
        assert!(page.contains("#### Aggregation\n- Complexity Score: 2\n- Implementation Priority: medium\n- Number of Calculations: 1\n\n"));
        assert!(page.contains("### Revenue\n- Range: A1:B2\n- Headers: Revenue, Cost\n"));
        assert!(page.contains("- Business Context: financial\n"));
        assert!(page.contains("## Data Flow and Dependencies\n\n### Aggregation\n- C1: =SUM(B2:B10)\n  - Complexity: 2\n"));
        assert!(page.contains("- TaxRate: Rates!$B$2 (Purpose: calculation_factor)\n"));
        assert!(page.contains("### Aggregations\n- C1: `=SUM(B2:B10)`\n  - Implementation: Use efficient aggregation queries\n  - Dependencies: B2:B10\n"));
    }

    #[test]
    fn test_summary_page() {
        let records = vec![analyze_sheet(&sample_sheet(), &[]), analyze_sheet(&Worksheet::new("Blank"), &[])];
        let page = summary_markdown(&summarize_records(&records));

        assert!(page.starts_with("# Enhanced Workbook Summary\n\nTotal Sheets: 2\nOverall Complexity: Low\n\n"));
        assert!(page.contains("\n### Blank\n- Formula Count: 0\n"));
        assert!(page.contains("Sheet with Most Formulas: Model (1 formulas)\n\n"));
        assert!(page.ends_with("Common Formula Patterns:\n- SUM(: 1 occurrences\n"));
    }

    #[test]
    fn test_summary_page_without_formulas() {
        let records = vec![analyze_sheet(&Worksheet::new("Blank"), &[])];
        let page = summary_markdown(&summarize_records(&records));
        assert!(page.ends_with("Sheet with Most Formulas: None (0 formulas)\n\n"));
    }

    #[test]
    fn test_combined_document() {
        let records = vec![analyze_sheet(&sample_sheet(), &[]), analyze_sheet(&Worksheet::new("Blank"), &[])];
        let doc = combined_markdown("plan.xlsx", &records);

        assert!(doc.starts_with(
            "# Combined Workbook Analysis\n\nSource: plan.xlsx\n\n## Table of Contents\n1. [Model](#worksheet-1)\n2. [Blank](#worksheet-2)\n\n---\n\n"
        ));
        let separator = format!("\n\n{}\n\n<a name='worksheet-2'></a>\n# Worksheet 2: Blank\n\n", "=".repeat(80));
        assert!(doc.contains(&separator));
        assert!(!doc.contains("# Sheet:"));
        assert!(doc.contains("# Worksheet 1: Model\n\nDimensions: A1:C2\n"));
        assert!(doc.ends_with("## Software Implementation Requirements\n"));
    }
}
