//! Named range extraction
//!
//! Workbook-scoped defined names are listed once per destination. A name
//! pointing at `Inputs!$B$2,Inputs!$B$5` yields two entries; a name whose
//! definition is a constant, a formula or a broken reference is kept as one
//! entry carrying the raw definition.

use std::fmt;

use lazy_regex::regex_captures;
use serde::Serialize;
use sheet_lens_core::{NamedRange, Workbook};

use crate::rules::{first_match, RANGE_PURPOSE_RULES};

/// What a defined name is for, judged from its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePurpose {
    InputParameter,
    CalculationFactor,
    OutputValue,
    ScenarioControl,
    General,
}

impl RangePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePurpose::InputParameter => "input_parameter",
            RangePurpose::CalculationFactor => "calculation_factor",
            RangePurpose::OutputValue => "output_value",
            RangePurpose::ScenarioControl => "scenario_control",
            RangePurpose::General => "general",
        }
    }
}

impl fmt::Display for RangePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRangeInfo {
    pub name: String,
    /// `Sheet!$B$2` for a resolved destination, the raw definition otherwise
    pub range: String,
    pub business_purpose: RangePurpose,
}

pub fn infer_purpose(name: &str) -> RangePurpose {
    first_match(RANGE_PURPOSE_RULES, &name.to_lowercase()).unwrap_or(RangePurpose::General)
}

/// Split a definition on commas outside quotes and parentheses
fn split_top_level(definition: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, ch) in definition.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                parts.push(&definition[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&definition[start..]);
    parts
}

/// Parse one `Sheet!coord` destination into `(sheet, coord)`
///
/// A coord is a cell, a cell range, whole columns (`$A:$C`) or whole rows
/// (`$1:$3`).
fn parse_destination(part: &str) -> Option<(String, &str)> {
    let part = part.trim();
    if let Some((_, quoted, coord)) = regex_captures!(
        r"^'((?:[^']|'')+)'!(\$?[A-Za-z]{1,3}\$?[0-9]+(?::\$?[A-Za-z]{1,3}\$?[0-9]+)?|\$?[A-Za-z]{1,3}:\$?[A-Za-z]{1,3}|\$?[0-9]+:\$?[0-9]+)$",
        part
    ) {
        return Some((quoted.replace("''", "'"), coord));
    }
    let (_, sheet, coord) = regex_captures!(
        r"^([^'!,()#\s]+)!(\$?[A-Za-z]{1,3}\$?[0-9]+(?::\$?[A-Za-z]{1,3}\$?[0-9]+)?|\$?[A-Za-z]{1,3}:\$?[A-Za-z]{1,3}|\$?[0-9]+:\$?[0-9]+)$",
        part
    )?;
    Some((sheet.to_string(), coord))
}

/// Entries for one defined name
pub fn resolve_named_range(name: &NamedRange) -> Vec<NamedRangeInfo> {
    let purpose = infer_purpose(&name.name);
    if name.refers_to.contains("#REF!") {
        log::warn!("defined name {} has a broken reference: {}", name.name, name.refers_to);
    }

    let destinations: Option<Vec<(String, &str)>> = split_top_level(&name.refers_to)
        .into_iter()
        .map(parse_destination)
        .collect();

    match destinations {
        Some(destinations) => destinations
            .into_iter()
            .map(|(sheet, coord)| NamedRangeInfo {
                name: name.name.clone(),
                range: format!("{}!{}", sheet, coord),
                business_purpose: purpose,
            })
            .collect(),
        None => {
            log::debug!(
                "defined name {} is not a plain reference, keeping raw definition",
                name.name
            );
            vec![NamedRangeInfo {
                name: name.name.clone(),
                range: name.refers_to.clone(),
                business_purpose: purpose,
            }]
        }
    }
}

/// Workbook-scoped names in definition order
///
/// Sheet-scoped names are not listed.
pub fn extract_named_ranges(workbook: &Workbook) -> Vec<NamedRangeInfo> {
    workbook
        .named_ranges()
        .workbook_names()
        .flat_map(resolve_named_range)
        .collect()
}
