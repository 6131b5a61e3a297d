//! Files written for one workbook

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sheet_lens::render::{sheet_markdown, summary_markdown};
use sheet_lens::WorkbookAnalysis;

pub const SUMMARY_FILE: &str = "workbook_summary.md";
pub const COMBINED_FILE: &str = "combined_workbook.md";
pub const REPORT_FILE: &str = "analysis_report.md";
pub const REQUIREMENTS_FILE: &str = "product_requirements.md";

/// Replace characters that are not allowed in file names
pub fn sanitize_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    if safe.trim().is_empty() {
        "Sheet".to_string()
    } else {
        safe
    }
}

/// Output directory of one workbook: `<root>/<file stem>`
pub fn workbook_dir(root: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    root.join(sanitize_filename(&stem))
}

fn write(path: PathBuf, contents: &str) -> Result<PathBuf> {
    fs::write(&path, contents).with_context(|| format!("Failed to write '{}'", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Per-sheet pages and records, the summary page and the combined document
///
/// Returns the combined document, which is what the generator reads.
pub fn write_analysis(dir: &Path, source: &str, analysis: &WorkbookAnalysis) -> Result<String> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;

    write(dir.join(SUMMARY_FILE), &summary_markdown(&analysis.summary))?;

    for sheet in &analysis.sheets {
        let stem = sanitize_filename(&sheet.name);
        write(dir.join(format!("{}.md", stem)), &sheet_markdown(sheet))?;
        let json = sheet
            .to_json_pretty()
            .with_context(|| format!("Failed to serialize sheet '{}'", sheet.name))?;
        write(dir.join(format!("{}.json", stem)), &json)?;
    }

    let combined = analysis.combined_markdown(source);
    write(dir.join(COMBINED_FILE), &combined)?;
    Ok(combined)
}

pub fn write_report(dir: &Path, text: &str) -> Result<PathBuf> {
    write(
        dir.join(REPORT_FILE),
        &format!("# Excel Workbook Analysis Report\n\n{}", text),
    )
}

pub fn write_requirements(dir: &Path, text: &str, generated: NaiveDateTime) -> Result<PathBuf> {
    let header = format!(
        "# Product Requirements Document\n\
         ## Software Implementation of Excel Spreadsheet\n\n\
         **Generated:** {}\n\
         **Source:** Excel Workbook Analysis\n\n\
         ---\n\n",
        generated.format("%Y-%m-%d %H:%M:%S")
    );
    write(dir.join(REQUIREMENTS_FILE), &format!("{}{}", header, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheet_lens::{analyze_workbook, Workbook};

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Q1/Q2: Plan?"), "Q1_Q2_ Plan_");
        assert_eq!(sanitize_filename("Inputs"), "Inputs");
        assert_eq!(sanitize_filename(""), "Sheet");
    }

    #[test]
    fn test_workbook_dir_uses_stem() {
        let dir = workbook_dir(Path::new("out"), Path::new("data/Budget 2024.xlsx"));
        assert_eq!(dir, Path::new("out").join("Budget 2024"));
    }

    #[test]
    fn test_writes_artifacts() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet_with_name("P&L").unwrap();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .set_cell_formula("A1", "SUM(B1:B3)")
            .unwrap();
        let analysis = analyze_workbook(&workbook);

        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("model");
        let combined = write_analysis(&dir, "model.xlsx", &analysis).unwrap();

        let mut files: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(
            files,
            vec![
                "P&L.json",
                "P&L.md",
                "Sheet1.json",
                "Sheet1.md",
                COMBINED_FILE,
                SUMMARY_FILE,
            ]
        );
        assert_eq!(fs::read_to_string(dir.join(COMBINED_FILE)).unwrap(), combined);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("Sheet1.json")).unwrap()).unwrap();
        assert_eq!(json["data_dependencies"][0]["target_cell"], "A1");
    }

    #[test]
    fn test_requirements_header() {
        let dir = tempfile::tempdir().unwrap();
        let generated = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        let path = write_requirements(dir.path(), "Body", generated).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("# Product Requirements Document\n"));
        assert!(text.contains("**Generated:** 2024-03-01 09:30:00\n"));
        assert!(text.ends_with("---\n\nBody"));
    }
}
