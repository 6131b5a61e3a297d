//! XLSX reader

mod shared_formula;
mod worksheet;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use lazy_regex::regex;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use sheet_lens_core::style::Style;
use sheet_lens_core::{CellAddress, CellComment, NameScope, NamedRange, Workbook, Worksheet};
use worksheet::{read_worksheet_xml, SheetSources};

/// Decode Excel's `_xHHHH_` escapes (`_x000a_` is a line feed)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    regex!(r"_x([0-9A-Fa-f]{4})_")
        .replace_all(s, |caps: &lazy_regex::regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// A `<sheet>` entry of `xl/workbook.xml`
#[derive(Debug)]
struct SheetEntry {
    name: String,
    rel_id: String,
}

/// A `<definedName>` entry before it is attached to the workbook
#[derive(Debug)]
struct DefinedName {
    name: String,
    local_sheet: Option<usize>,
    hidden: bool,
    refers_to: String,
}

/// `Id -> (Type, Target)` of a relationships part
type Relationships = HashMap<String, (String, String)>;

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from any seekable byte source
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let styles = Self::read_styles(&mut archive)?;
        let (sheets, defined_names) = Self::read_workbook_xml(&mut archive)?;
        let rels = Self::read_relationships(&mut archive, "xl/_rels/workbook.xml.rels")?
            .ok_or_else(|| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let sources = SheetSources {
            shared_strings: &shared_strings,
            styles: &styles,
        };

        let mut workbook = Workbook::empty();
        for (position, entry) in sheets.iter().enumerate() {
            let Some(path) = rels
                .get(&entry.rel_id)
                .filter(|(kind, _)| kind.ends_with("/worksheet"))
                .map(|(_, target)| resolve_target("xl", target))
            else {
                log::warn!("sheet '{}' has no worksheet part, skipping", entry.name);
                continue;
            };

            let mut sheet = Worksheet::new(entry.name.as_str());
            {
                let file = archive
                    .by_name(&path)
                    .map_err(|_| XlsxError::MissingPart(path.clone()))?;
                read_worksheet_xml(BufReader::new(file), &path, &mut sheet, &sources)?;
            }
            Self::read_worksheet_comments(&mut archive, &path, position, &mut sheet)?;

            log::debug!(
                "read sheet '{}': {} cells, {} skipped",
                sheet.name(),
                sheet.cell_count(),
                sheet.skipped_cells().len()
            );
            workbook.add_existing_worksheet(sheet)?;
        }

        for defined in defined_names {
            Self::define_name(&mut workbook, defined);
        }

        if workbook.is_empty() {
            workbook.add_worksheet_with_name("Sheet1")?;
        }

        Ok(workbook)
    }

    fn define_name(workbook: &mut Workbook, defined: DefinedName) {
        // Print areas, filters and other reserved names
        if defined.name.starts_with("_xlnm.") {
            return;
        }
        let scope = match defined.local_sheet {
            Some(index) => NameScope::Sheet(index),
            None => NameScope::Workbook,
        };
        let range = NamedRange::new(defined.name.as_str(), defined.refers_to, scope)
            .with_hidden(defined.hidden);
        if let Err(err) = workbook.define_name(range) {
            log::warn!("ignoring defined name '{}': {}", defined.name, err);
        }
    }

    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        const PART: &str = "xl/sharedStrings.xml";
        let mut strings = Vec::new();

        let file = match archive.by_name(PART) {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut current: Option<String> = None;
        let mut in_t = false;
        // phonetic runs repeat the text in another script
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"rPh" => in_phonetic = true,
                    b"t" => in_t = !in_phonetic,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        if let Some(text) = current.take() {
                            strings.push(decode_excel_escapes(&text));
                        }
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let (Some(current), Ok(text)) = (current.as_mut(), e.unescape()) {
                        current.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::xml(PART, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<Style>> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(vec![Style::default()]),
        }
    }

    /// Sheets in tab order plus the defined names
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetEntry>, Vec<DefinedName>)> {
        const PART: &str = "xl/workbook.xml";
        let file = archive
            .by_name(PART)
            .map_err(|_| XlsxError::MissingPart(PART.into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut names = Vec::new();
        let mut pending_name: Option<DefinedName> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(rel_id)) = (attr(&e, b"name"), attr(&e, b"r:id")) {
                        sheets.push(SheetEntry { name, rel_id });
                    }
                }
                Ok(Event::Start(e)) if e.name().as_ref() == b"definedName" => {
                    pending_name = attr(&e, b"name").map(|name| DefinedName {
                        name,
                        local_sheet: attr(&e, b"localSheetId").and_then(|s| s.parse().ok()),
                        hidden: matches!(attr(&e, b"hidden").as_deref(), Some("1") | Some("true")),
                        refers_to: String::new(),
                    });
                }
                Ok(Event::Text(e)) => {
                    if let (Some(pending), Ok(text)) = (pending_name.as_mut(), e.unescape()) {
                        pending.refers_to.push_str(&text);
                    }
                }
                Ok(Event::End(e)) if e.name().as_ref() == b"definedName" => {
                    if let Some(defined) = pending_name.take() {
                        names.push(defined);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::xml(PART, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, names))
    }

    /// Read a relationships part; `None` when the part does not exist
    fn read_relationships<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part: &str,
    ) -> XlsxResult<Option<Relationships>> {
        let file = match archive.by_name(part) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(kind), Some(target)) =
                        (attr(&e, b"Id"), attr(&e, b"Type"), attr(&e, b"Target"))
                    {
                        rels.insert(id, (kind, target));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::xml(part, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Some(rels))
    }

    /// Attach the legacy comments of one worksheet
    ///
    /// The comments part is found through the sheet's relationships. Packages
    /// without a sheet relationships part fall back to `xl/comments<n>.xml`.
    fn read_worksheet_comments<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
        position: usize,
        sheet: &mut Worksheet,
    ) -> XlsxResult<()> {
        let (dir, file_name) = sheet_path.rsplit_once('/').unwrap_or(("", sheet_path));
        let rels_part = format!("{}/_rels/{}.rels", dir, file_name);

        let comments_path = match Self::read_relationships(archive, &rels_part)? {
            Some(rels) => rels
                .values()
                .find(|(kind, _)| kind.ends_with("/comments"))
                .map(|(_, target)| resolve_target(dir, target)),
            None => Some(format!("xl/comments{}.xml", position + 1)),
        };
        let Some(comments_path) = comments_path else {
            return Ok(());
        };

        let file = match archive.by_name(&comments_path) {
            Ok(f) => f,
            Err(_) => return Ok(()),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut authors: Vec<String> = Vec::new();
        let mut in_author = false;
        let mut current: Option<(String, Option<usize>)> = None;
        let mut runs: Vec<String> = Vec::new();
        let mut in_text_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"author" => in_author = true,
                    b"comment" => {
                        current = attr(&e, b"ref").map(|r| {
                            (r, attr(&e, b"authorId").and_then(|s| s.parse().ok()))
                        });
                        runs.clear();
                    }
                    b"t" if current.is_some() => in_text_t = true,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_author || in_text_t => {
                    if let Ok(text) = e.unescape() {
                        if in_author {
                            authors.push(text.into_owned());
                        } else {
                            runs.push(text.into_owned());
                        }
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"author" => in_author = false,
                    b"t" => in_text_t = false,
                    b"comment" => {
                        if let Some((reference, author_id)) = current.take() {
                            let author = author_id
                                .and_then(|id| authors.get(id))
                                .cloned()
                                .unwrap_or_default();
                            let comment = CellComment::new(author, runs.join(" "));
                            let placed = CellAddress::parse(&reference)
                                .and_then(|addr| sheet.set_comment_at(addr.row, addr.col, comment));
                            if let Err(err) = placed {
                                log::warn!(
                                    "{}!{}: ignoring comment: {}",
                                    sheet.name(),
                                    reference,
                                    err
                                );
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::xml(&comments_path, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}

/// Resolve a relationship target against the directory of its source part
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for piece in target.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            piece => parts.push(piece),
        }
    }
    parts.join("/")
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("Line1_x000a_Line2"), "Line1\nLine2");
        assert_eq!(decode_excel_escapes("a_x005f_b"), "a_b");
        assert_eq!(decode_excel_escapes("_xZZZZ_"), "_xZZZZ_");
        assert_eq!(decode_excel_escapes("plain"), "plain");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl", "/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_target("xl/worksheets", "../comments1.xml"), "xl/comments1.xml");
    }
}
