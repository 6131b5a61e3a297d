//! Worksheet part parsing: cells, formulas and data validations

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::decode_excel_escapes;
use super::shared_formula::SharedFormula;
use crate::error::{XlsxError, XlsxResult};
use sheet_lens_core::style::Style;
use sheet_lens_core::{
    CellAddress, CellData, CellError, CellRange, CellValue, DataValidation, ValidationKind,
    ValidationOperator, Worksheet,
};

/// Lookup tables shared by every sheet of a workbook
pub(crate) struct SheetSources<'a> {
    pub shared_strings: &'a [String],
    pub styles: &'a [Style],
}

/// Which text node the parser is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    InlineText,
    ValidationFormula1,
    ValidationFormula2,
}

/// A `<c>` element being assembled
#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<String>,
    value: Option<String>,
    inline: Option<String>,
    formula: Option<String>,
    /// `si` of a `t="shared"` formula
    shared_index: Option<u32>,
    /// Set on the anchor of a shared group
    shared_ref: bool,
}

struct SheetParser<'a, 's> {
    sources: &'s SheetSources<'s>,
    sheet: &'a mut Worksheet,
    /// workbook xf index -> sheet style pool index
    style_map: HashMap<u32, u32>,
    shared_formulas: HashMap<u32, SharedFormula>,
    current_row: u32,
    next_col: u16,
    cell: Option<PendingCell>,
    validation: Option<DataValidation>,
    target: TextTarget,
}

impl<'a, 's> SheetParser<'a, 's> {
    fn new(sheet: &'a mut Worksheet, sources: &'s SheetSources<'s>) -> Self {
        Self {
            sources,
            sheet,
            style_map: HashMap::new(),
            shared_formulas: HashMap::new(),
            current_row: 0,
            next_col: 0,
            cell: None,
            validation: None,
            target: TextTarget::None,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>, is_empty: bool) {
        match e.name().as_ref() {
            b"row" => {
                if let Some(r) = attr(e, b"r").and_then(|s| s.parse::<u32>().ok()) {
                    self.current_row = r.saturating_sub(1);
                } else {
                    self.current_row += 1;
                }
                self.next_col = 0;
            }
            b"c" => {
                let pending = PendingCell {
                    reference: attr(e, b"r"),
                    cell_type: attr(e, b"t"),
                    style: attr(e, b"s"),
                    ..PendingCell::default()
                };
                if is_empty {
                    self.finish_cell(pending);
                } else {
                    self.cell = Some(pending);
                }
            }
            b"v" if self.cell.is_some() => self.target = TextTarget::Value,
            b"f" => {
                if let Some(cell) = self.cell.as_mut() {
                    if attr(e, b"t").as_deref() == Some("shared") {
                        cell.shared_index = attr(e, b"si").and_then(|s| s.parse().ok());
                        cell.shared_ref = attr(e, b"ref").is_some();
                    }
                    if !is_empty {
                        cell.formula = Some(String::new());
                        self.target = TextTarget::Formula;
                    }
                }
            }
            b"t" if self.cell.is_some() => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.inline.get_or_insert_with(String::new);
                }
                self.target = TextTarget::InlineText;
            }
            b"dataValidation" => {
                let kind = attr(e, b"type")
                    .and_then(|t| ValidationKind::from_xlsx(&t))
                    .unwrap_or_default();
                let mut validation = DataValidation::new(kind);
                validation.operator = attr(e, b"operator").and_then(|o| ValidationOperator::from_xlsx(&o));
                validation.allow_blank = matches!(attr(e, b"allowBlank").as_deref(), Some("1") | Some("true"));
                validation.input_title = attr(e, b"promptTitle");
                validation.input_message = attr(e, b"prompt");
                validation.error_title = attr(e, b"errorTitle");
                validation.error_message = attr(e, b"error");
                if let Some(sqref) = attr(e, b"sqref") {
                    for piece in sqref.split_whitespace() {
                        match CellRange::parse(piece) {
                            Ok(range) => validation.ranges.push(range),
                            Err(err) => log::warn!(
                                "{}: ignoring validation range '{}': {}",
                                self.sheet.name(),
                                piece,
                                err
                            ),
                        }
                    }
                }
                if is_empty {
                    self.sheet.add_data_validation(validation);
                } else {
                    self.validation = Some(validation);
                }
            }
            b"formula1" if self.validation.is_some() => self.target = TextTarget::ValidationFormula1,
            b"formula2" if self.validation.is_some() => self.target = TextTarget::ValidationFormula2,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match self.target {
            TextTarget::None => {}
            TextTarget::Value => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.value.get_or_insert_with(String::new).push_str(text);
                }
            }
            TextTarget::Formula => {
                if let Some(formula) = self.cell.as_mut().and_then(|c| c.formula.as_mut()) {
                    formula.push_str(text);
                }
            }
            TextTarget::InlineText => {
                if let Some(inline) = self.cell.as_mut().and_then(|c| c.inline.as_mut()) {
                    inline.push_str(text);
                }
            }
            TextTarget::ValidationFormula1 => {
                if let Some(v) = self.validation.as_mut() {
                    v.formula1.get_or_insert_with(String::new).push_str(text);
                }
            }
            TextTarget::ValidationFormula2 => {
                if let Some(v) = self.validation.as_mut() {
                    v.formula2.get_or_insert_with(String::new).push_str(text);
                }
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"v" | b"f" | b"t" | b"formula1" | b"formula2" => self.target = TextTarget::None,
            b"c" => {
                if let Some(cell) = self.cell.take() {
                    self.finish_cell(cell);
                }
            }
            b"dataValidation" => {
                if let Some(validation) = self.validation.take() {
                    self.sheet.add_data_validation(validation);
                }
            }
            _ => {}
        }
    }

    /// Store a completed cell, or record why it could not be stored
    fn finish_cell(&mut self, cell: PendingCell) {
        let reference = cell.reference.clone().unwrap_or_else(|| {
            CellAddress::new(self.current_row, self.next_col).to_a1_string()
        });
        match self.decode_cell(&reference, cell) {
            Ok(()) => {}
            Err(reason) => {
                log::warn!("{}!{}: skipping cell: {}", self.sheet.name(), reference, reason);
                self.sheet.record_skipped_cell(reference, reason);
            }
        }
    }

    fn decode_cell(&mut self, reference: &str, cell: PendingCell) -> Result<(), String> {
        let addr = CellAddress::parse(reference).map_err(|e| e.to_string())?;
        self.current_row = addr.row;
        self.next_col = addr.col.saturating_add(1);

        let style_index = match cell.style.as_deref() {
            None => 0,
            Some(s) => {
                let xf: u32 = s
                    .parse()
                    .map_err(|_| format!("invalid style index '{}'", s))?;
                self.local_style(xf)?
            }
        };

        let value = self.decode_value(&cell)?;
        let value = match self.decode_formula(&addr, &cell) {
            Some(text) => CellValue::Formula {
                text: format!("={}", text),
                cached_value: (!value.is_empty()).then(|| Box::new(value)),
            },
            None => value,
        };

        if value.is_empty() && style_index == 0 {
            return Ok(());
        }
        self.sheet
            .set_cell_data_at(addr.row, addr.col, CellData::with_style(value, style_index))
            .map_err(|e| e.to_string())
    }

    fn local_style(&mut self, xf: u32) -> Result<u32, String> {
        if let Some(&index) = self.style_map.get(&xf) {
            return Ok(index);
        }
        let style = self
            .sources
            .styles
            .get(xf as usize)
            .ok_or_else(|| format!("unknown style index {}", xf))?;
        let index = if style.is_default() {
            0
        } else {
            self.sheet.intern_style(style.clone())
        };
        self.style_map.insert(xf, index);
        Ok(index)
    }

    fn decode_value(&self, cell: &PendingCell) -> Result<CellValue, String> {
        let raw = cell.value.as_deref();
        let value = match (cell.cell_type.as_deref(), raw) {
            (Some("inlineStr"), _) => match &cell.inline {
                Some(text) => CellValue::string(decode_excel_escapes(text)),
                None => CellValue::Empty,
            },
            (_, None) => CellValue::Empty,
            (Some("s"), Some(raw)) => {
                let index: usize = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid shared string index '{}'", raw))?;
                let text = self.sources.shared_strings.get(index).ok_or_else(|| {
                    format!(
                        "shared string index {} out of range ({} strings)",
                        index,
                        self.sources.shared_strings.len()
                    )
                })?;
                CellValue::string(text.as_str())
            }
            (Some("b"), Some(raw)) => match raw.trim() {
                "1" | "true" | "TRUE" => CellValue::Boolean(true),
                "0" | "false" | "FALSE" => CellValue::Boolean(false),
                other => return Err(format!("invalid boolean '{}'", other)),
            },
            (Some("e"), Some(raw)) => CellValue::Error(
                CellError::parse(raw.trim()).ok_or_else(|| format!("unknown error value '{}'", raw))?,
            ),
            (Some("str"), Some(raw)) | (Some("d"), Some(raw)) => {
                CellValue::string(decode_excel_escapes(raw))
            }
            (_, Some(raw)) => CellValue::Number(
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{}'", raw))?,
            ),
        };
        Ok(value)
    }

    /// Formula text without the leading `=`, expanding shared formulas
    fn decode_formula(&mut self, addr: &CellAddress, cell: &PendingCell) -> Option<String> {
        let written = cell.formula.as_deref().filter(|f| !f.is_empty());
        match (cell.shared_index, written) {
            (Some(si), Some(text)) => {
                if cell.shared_ref || !self.shared_formulas.contains_key(&si) {
                    self.shared_formulas.insert(
                        si,
                        SharedFormula {
                            row: addr.row,
                            col: addr.col,
                            text: text.to_string(),
                        },
                    );
                }
                Some(text.to_string())
            }
            (Some(si), None) => match self.shared_formulas.get(&si) {
                Some(anchor) => Some(anchor.translate_to(addr.row, addr.col)),
                None => {
                    log::warn!(
                        "{}!{}: shared formula {} has no anchor",
                        self.sheet.name(),
                        addr,
                        si
                    );
                    None
                }
            },
            (None, text) => text.map(str::to_string),
        }
    }
}

/// Parse a worksheet part into `sheet`
pub(crate) fn read_worksheet_xml<R: BufRead>(
    reader: R,
    part: &str,
    sheet: &mut Worksheet,
    sources: &SheetSources<'_>,
) -> XlsxResult<()> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = SheetParser::new(sheet, sources);

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e, false),
            Ok(Event::Empty(e)) => parser.open(&e, true),
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => parser.text(&text),
                Err(err) => log::warn!("{}: undecodable text node: {}", part, err),
            },
            Ok(Event::End(e)) => parser.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
