use std::io::{Cursor, Write};
use std::path::Path;

use pretty_assertions::assert_eq;
use sheet_lens::prelude::*;
use sheet_lens::dependency::DependencyType;
use sheet_lens::is_supported;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Budget" sheetId="1" r:id="rId1"/></sheets>
  <definedNames><definedName name="GrowthRate">Budget!$B$2</definedName></definedNames>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2">
    <font><sz val="11"/></font>
    <font><b/><sz val="11"/></font>
  </fonts>
  <fills count="1"><fill><patternFill patternType="none"/></fill></fills>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0"/>
    <xf numFmtId="0" fontId="1" fillId="0"/>
  </cellXfs>
</styleSheet>"#;

const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" s="1" t="inlineStr"><is><t>Income</t></is></c>
      <c r="B1" s="1" t="inlineStr"><is><t>Expense</t></is></c>
    </row>
    <row r="2"><c r="A2"><v>500</v></c><c r="B2"><v>0.05</v></c></row>
    <row r="3"><c r="A3"><f>VLOOKUP(A2,A1:B2,2,FALSE)</f><v>0.05</v></c></row>
  </sheetData>
</worksheet>"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#;

fn write_package(path: &Path) {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", SHEET1),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    let bytes = zip.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn opens_and_analyzes_an_xlsx_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budget.xlsx");
    write_package(&path);

    let workbook = Workbook::open(&path).unwrap();
    let analysis = analyze_workbook(&workbook);
    let budget = analysis.sheet("Budget").unwrap();

    assert_eq!(budget.tables.len(), 1);
    assert_eq!(budget.tables[0].business_context.as_str(), "financial");
    assert_eq!(budget.data_dependencies.len(), 1);
    assert_eq!(
        budget.data_dependencies[0].dependency_type,
        DependencyType::DataLookup
    );
    assert_eq!(budget.named_ranges[0].name, "GrowthRate");
    assert_eq!(budget.named_ranges[0].business_purpose.as_str(), "calculation_factor");
    assert_eq!(analysis.summary.most_formulas.as_ref().unwrap().sheet, "Budget");
}

#[test]
fn rejects_unsupported_extensions() {
    let err = Workbook::open("report.csv").unwrap_err();
    assert!(err.to_string().contains("Unsupported file format"));
}

#[test]
fn recognizes_workbook_files() {
    assert!(is_supported(Path::new("model.XLSX")));
    assert!(is_supported(Path::new("macros.xlsm")));
    assert!(!is_supported(Path::new("~$model.xlsx")));
    assert!(!is_supported(Path::new("notes.txt")));
}
