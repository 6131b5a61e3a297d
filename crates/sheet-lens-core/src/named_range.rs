//! Defined names
//!
//! A defined name maps an identifier to a reference, a list of references,
//! a constant or a formula. The model keeps the raw `refers_to` text; the
//! analyzer decides how to resolve it.

use ahash::AHashMap;

use crate::error::{Error, Result};

/// Scope of a defined name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Visible throughout the workbook
    Workbook,
    /// Local to the sheet at this index
    Sheet(usize),
}

/// A defined name as stored in `workbook.xml`
///
/// `refers_to` examples:
/// - `Sheet1!$A$1` - single cell
/// - `'Cash Flow'!$B$2:$B$40` - range on a quoted sheet
/// - `Sheet1!$A$1,Sheet2!$C$3` - several destinations
/// - `0.0725` - constant
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    pub name: String,
    pub scope: NameScope,
    /// Definition text without a leading `=`
    pub refers_to: String,
    pub hidden: bool,
}

impl NamedRange {
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        let refers_to = refers_to.into();
        let refers_to = match refers_to.strip_prefix('=') {
            Some(rest) => rest.to_string(),
            None => refers_to,
        };
        Self {
            name: name.into(),
            scope,
            refers_to,
            hidden: false,
        }
    }

    /// Create a workbook-scoped name
    pub fn workbook_scope(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self::new(name, refers_to, NameScope::Workbook)
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Defined names in definition order
///
/// Lookup is exact (case-sensitive) on `(name, scope)`.
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    names: Vec<NamedRange>,
    index: AHashMap<(String, NameScope), usize>,
}

impl NamedRangeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; fails if the same name already exists in that scope
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        let key = (range.name.clone(), range.scope);
        if self.index.contains_key(&key) {
            return Err(Error::InvalidName(format!(
                "'{}' is already defined in this scope",
                range.name
            )));
        }
        self.index.insert(key, self.names.len());
        self.names.push(range);
        Ok(())
    }

    pub fn get(&self, name: &str, scope: NameScope) -> Option<&NamedRange> {
        self.index
            .get(&(name.to_string(), scope))
            .map(|&i| &self.names[i])
    }

    /// All names in definition order
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.names.iter()
    }

    /// Workbook-scoped names in definition order
    pub fn workbook_names(&self) -> impl Iterator<Item = &NamedRange> {
        self.names
            .iter()
            .filter(|n| n.scope == NameScope::Workbook)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
