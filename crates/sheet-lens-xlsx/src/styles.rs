//! `xl/styles.xml` parsing
//!
//! Resolves every `cellXfs` entry into a core [`Style`]. Borders, alignment,
//! protection and differential formats are not read.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sheet_lens_core::style::{FillStyle, FontStyle, NumberFormat, Style};

const PART: &str = "xl/styles.xml";

/// Which top-level collection the parser is inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fonts,
    Fills,
    CellXfs,
    /// `dxfs`, `cellStyleXfs`, ... carry fonts and fills we must not pick up
    Ignored,
}

/// One `<xf>` entry before the font/fill/numFmt ids are resolved
#[derive(Debug, Default, Clone, Copy)]
struct XfIds {
    num_fmt: u32,
    font: usize,
    fill: usize,
}

#[derive(Debug, Default)]
struct FillBuilder {
    pattern: Option<String>,
    color: Option<String>,
}

impl FillBuilder {
    fn finish(self) -> FillStyle {
        match self.pattern.as_deref() {
            None | Some("none") => FillStyle::None,
            Some("solid") => FillStyle::Solid {
                color: self.color.unwrap_or_else(|| "auto".to_string()),
            },
            Some(pattern) => FillStyle::Pattern {
                pattern: pattern.to_string(),
                color: self.color,
            },
        }
    }
}

struct StylesParser {
    section: Section,
    numfmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    xfs: Vec<XfIds>,
    font: Option<FontStyle>,
    fill: Option<FillBuilder>,
}

impl StylesParser {
    fn new() -> Self {
        Self {
            section: Section::Other,
            numfmts: HashMap::new(),
            fonts: Vec::new(),
            fills: Vec::new(),
            xfs: Vec::new(),
            font: None,
            fill: None,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>, is_empty: bool) {
        let name = e.name();
        match (self.section, name.as_ref()) {
            (_, b"fonts") => self.section = Section::Fonts,
            (_, b"fills") => self.section = Section::Fills,
            (_, b"cellXfs") => self.section = Section::CellXfs,
            (_, b"dxfs") | (_, b"cellStyleXfs") | (_, b"extLst") => {
                if !is_empty {
                    self.section = Section::Ignored
                }
            }
            (_, b"numFmt") => {
                let id = attr_value(e, b"numFmtId").and_then(|s| s.parse().ok());
                if let (Some(id), Some(code)) = (id, attr_value(e, b"formatCode")) {
                    self.numfmts.insert(id, code);
                }
            }

            (Section::Fonts, b"font") => {
                if is_empty {
                    self.fonts.push(FontStyle::default());
                } else {
                    self.font = Some(FontStyle::default());
                }
            }
            (Section::Fonts, b"b") => {
                if let Some(font) = self.font.as_mut() {
                    font.bold = flag_on(e);
                }
            }
            (Section::Fonts, b"i") => {
                if let Some(font) = self.font.as_mut() {
                    font.italic = flag_on(e);
                }
            }
            (Section::Fonts, b"sz") => {
                let size = attr_value(e, b"val").and_then(|s| s.parse::<f64>().ok());
                if let (Some(font), Some(size)) = (self.font.as_mut(), size) {
                    if size.is_finite() {
                        font.size = size;
                    }
                }
            }
            (Section::Fonts, b"name") => {
                if let (Some(font), Some(val)) = (self.font.as_mut(), attr_value(e, b"val")) {
                    font.name = val;
                }
            }

            (Section::Fills, b"fill") => {
                if is_empty {
                    self.fills.push(FillStyle::None);
                } else {
                    self.fill = Some(FillBuilder::default());
                }
            }
            (Section::Fills, b"patternFill") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern = attr_value(e, b"patternType");
                }
            }
            (Section::Fills, b"gradientFill") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern = Some("gradient".to_string());
                }
            }
            (Section::Fills, b"fgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.color = color_attr(e);
                }
            }

            (Section::CellXfs, b"xf") => {
                let id = |key: &[u8]| attr_value(e, key).and_then(|s| s.parse::<u32>().ok());
                self.xfs.push(XfIds {
                    num_fmt: id(b"numFmtId").unwrap_or(0),
                    font: id(b"fontId").unwrap_or(0) as usize,
                    fill: id(b"fillId").unwrap_or(0) as usize,
                });
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"fonts" | b"fills" | b"cellXfs" | b"dxfs" | b"cellStyleXfs" | b"extLst" => {
                self.section = Section::Other
            }
            b"font" if self.section == Section::Fonts => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            b"fill" if self.section == Section::Fills => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(fill.finish());
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Vec<Style> {
        let mut styles: Vec<Style> = self
            .xfs
            .iter()
            .map(|xf| Style {
                font: self.fonts.get(xf.font).cloned().unwrap_or_default(),
                fill: self.fills.get(xf.fill).cloned().unwrap_or_default(),
                number_format: match self.numfmts.get(&xf.num_fmt) {
                    Some(code) => NumberFormat::Custom(code.clone()),
                    None => NumberFormat::from_id(xf.num_fmt),
                },
            })
            .collect();
        if styles.is_empty() {
            styles.push(Style::default());
        }
        styles
    }
}

/// Parse a styles part into the cell formats, indexed by `s` attribute
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    parse(BufReader::new(reader))
}

fn parse<R: BufRead>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = StylesParser::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e, false),
            Ok(Event::Empty(e)) => parser.open(&e, true),
            Ok(Event::End(e)) => parser.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.finish())
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// `<b/>` is on; `<b val="0"/>` is off
fn flag_on(e: &BytesStart<'_>) -> bool {
    !matches!(attr_value(e, b"val").as_deref(), Some("0") | Some("false"))
}

fn color_attr(e: &BytesStart<'_>) -> Option<String> {
    if let Some(rgb) = attr_value(e, b"rgb") {
        return Some(rgb);
    }
    if let Some(theme) = attr_value(e, b"theme") {
        return Some(format!("theme:{}", theme));
    }
    attr_value(e, b"indexed").map(|i| format!("indexed:{}", i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;£&quot;#,##0.00"/></numFmts>
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="14"/><name val="Arial"/></font>
    <font><b val="0"/><i/><sz val="11"/><name val="Calibri"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="1" fillId="2"/></cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" xfId="0"/>
    <xf numFmtId="10" fontId="1" fillId="0" xfId="0" applyFont="1"/>
    <xf numFmtId="164" fontId="2" fillId="2" xfId="0"><alignment horizontal="center"/></xf>
    <xf numFmtId="14" fontId="0" fillId="1" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFF0000"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_cell_xfs_resolve_fonts_fills_and_formats() {
        let styles = read_styles_xml(STYLES.as_bytes()).unwrap();
        assert_eq!(styles.len(), 4);

        assert!(styles[0].is_default());

        assert!(styles[1].font.bold);
        assert_eq!(styles[1].font.size, 14.0);
        assert_eq!(styles[1].font.name, "Arial");
        assert!(styles[1].number_format.is_percent());

        assert!(!styles[2].font.bold);
        assert!(styles[2].font.italic);
        assert_eq!(styles[2].fill, FillStyle::solid("FFFFFF00"));
        assert!(styles[2].number_format.has_currency_symbol());

        assert!(styles[3].number_format.is_date_format());
        assert!(!styles[3].fill.is_visible());
    }

    #[test]
    fn test_empty_styles_part_yields_default() {
        let styles = read_styles_xml(&b"<styleSheet/>"[..]).unwrap();
        assert_eq!(styles, vec![Style::default()]);
    }
}
