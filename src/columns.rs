//! Column-spec mini-language: parsing, schema validation, typed conversion.
//!
//! One configuration entry per column, grammar `INDEX|NAME;TYPE[;FORMAT]`:
//!
//! ```text
//! 1|USER_AGE;integer
//! 2|USER_HEIGHT;decimal
//! 3|ADDRESS;string;120
//! 4|USER_DOB;date-time;d/MM/yyyy H:mm
//! ```
//!
//! INDEX is the 1-based position of the value within an incoming flat row.
//! TYPE defaults to an unbounded string. FORMAT is a date pattern for
//! `date-time` (the `yyyy-MM-dd`-style token alphabet the configuration
//! files use, translated to chrono specifiers internally), a maximum length
//! for `string`, and absent for the numeric types.
//!
//! Conversion is lossy-aware in one direction only: raw text that does not
//! parse as the declared type becomes [`CellValue::Null`] so the row is
//! still emitted with a gap, never an error.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::SpecError;

/// Pattern applied when a `date-time` column has no FORMAT.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "yyyy-MM-dd HH:mm:ss";

/// Closed set of target column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Decimal,
    DateTime,
    Text,
}

impl ColumnType {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "integer" => Some(ColumnType::Integer),
            "decimal" => Some(ColumnType::Decimal),
            "date-time" => Some(ColumnType::DateTime),
            "string" | "" => Some(ColumnType::Text),
            _ => None,
        }
    }
}

/// A typed value for one cell of a target-table row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Decimal(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Mapping from a 1-based flat-row position to a named, typed target column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    index: usize,
    name: String,
    column_type: ColumnType,
    format: Option<String>,
    max_length: Option<usize>,
}

impl ColumnDefinition {
    /// Parse one `INDEX|NAME;TYPE[;FORMAT]` entry.
    ///
    /// Unknown TYPE tokens and non-numeric string lengths are rejected
    /// outright; a handler with a malformed column spec must not run.
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        let raw = spec.trim();
        let syntax = |reason: String| SpecError::Syntax {
            spec: raw.to_string(),
            reason,
        };

        let (index_text, rest) = raw
            .split_once('|')
            .ok_or_else(|| syntax("missing '|' between index and column name".to_string()))?;
        let index = index_text
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|i| *i >= 1)
            .ok_or_else(|| syntax("invalid 1-based column index".to_string()))?;

        let mut parts = rest.splitn(3, ';');
        let name = parts.next().unwrap_or("").trim().to_string();
        if name.is_empty() {
            return Err(syntax("missing column name".to_string()));
        }
        let type_token = parts.next().map(str::trim).unwrap_or("");
        let column_type = ColumnType::parse(type_token)
            .ok_or_else(|| syntax(format!("unknown data type '{}'", type_token)))?;
        let format = parts
            .next()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        let max_length = match (column_type, &format) {
            (ColumnType::Text, Some(length_text)) => Some(
                length_text
                    .parse::<usize>()
                    .map_err(|_| syntax(format!("invalid maximum length '{}'", length_text)))?,
            ),
            _ => None,
        };

        Ok(Self {
            index,
            name,
            column_type,
            format,
            max_length,
        })
    }

    /// 1-based position within an incoming flat row.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    fn date_pattern(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_DATE_TIME_FORMAT)
    }

    /// Convert raw text into this column's typed value.
    ///
    /// Text that does not parse as the declared type yields
    /// [`CellValue::Null`]; over-length strings are truncated to the
    /// configured maximum.
    pub fn parse_value(&self, raw: &str) -> CellValue {
        match self.column_type {
            ColumnType::Integer => match raw.trim().parse::<i64>() {
                Ok(value) => CellValue::Int(value),
                Err(_) => {
                    debug!(column = %self.name, raw, "value does not parse as integer");
                    CellValue::Null
                }
            },
            ColumnType::Decimal => match raw.trim().parse::<f64>() {
                Ok(value) => CellValue::Decimal(value),
                Err(_) => {
                    debug!(column = %self.name, raw, "value does not parse as decimal");
                    CellValue::Null
                }
            },
            ColumnType::DateTime => {
                let strftime = to_strftime(self.date_pattern());
                match parse_date_time(raw, &strftime) {
                    Some(value) => CellValue::DateTime(value),
                    None => {
                        debug!(
                            column = %self.name,
                            raw,
                            pattern = %self.date_pattern(),
                            "value does not parse as date-time"
                        );
                        CellValue::Null
                    }
                }
            }
            ColumnType::Text => {
                let value = match self.max_length {
                    Some(max) if raw.chars().count() > max => raw.chars().take(max).collect(),
                    _ => raw.to_string(),
                };
                CellValue::Text(value)
            }
        }
    }

    /// Render a typed value back to flat text.
    ///
    /// Null is the empty string; date-times use the column's pattern; other
    /// types use their natural display form.
    pub fn format_value(&self, value: &CellValue) -> String {
        match value {
            CellValue::Null => String::new(),
            CellValue::DateTime(dt) => dt.format(&to_strftime(self.date_pattern())).to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Decimal(d) => d.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Translate a `yyyy-MM-dd HH:mm:ss`-style pattern to chrono specifiers.
///
/// Longest token wins at each position; characters outside the token
/// alphabet pass through verbatim (with `%` escaped).
fn to_strftime(pattern: &str) -> String {
    const TOKENS: &[(&str, &str)] = &[
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("MM", "%m"),
        ("M", "%-m"),
        ("dd", "%d"),
        ("d", "%-d"),
        ("HH", "%H"),
        ("H", "%-H"),
        ("mm", "%M"),
        ("m", "%-M"),
        ("ss", "%S"),
        ("s", "%-S"),
    ];

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'scan: while !rest.is_empty() {
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'scan;
            }
        }
        let ch = rest.chars().next().unwrap();
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Date-only patterns parse as midnight of that date.
fn parse_date_time(raw: &str, strftime: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = NaiveDateTime::parse_from_str(raw, strftime) {
        return Some(value);
    }
    NaiveDate::parse_from_str(raw, strftime)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// All column definitions of one handler, keyed by name in entry order.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: IndexMap<String, ColumnDefinition>,
}

impl ColumnSet {
    /// Parse every `column-spec` entry, rejecting duplicate names and
    /// duplicate flat-row indices.
    pub fn parse<I, S>(entries: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns: IndexMap<String, ColumnDefinition> = IndexMap::new();
        for entry in entries {
            let definition = ColumnDefinition::parse(entry.as_ref())?;
            if columns
                .values()
                .any(|existing| existing.index == definition.index)
            {
                return Err(SpecError::DuplicateColumn {
                    column: format!("{}|{}", definition.index, definition.name),
                });
            }
            let name = definition.name.clone();
            if columns.insert(name.clone(), definition).is_some() {
                return Err(SpecError::DuplicateColumn { column: name });
            }
        }
        Ok(Self { columns })
    }

    /// Validate every definition against the target table's schema.
    ///
    /// An empty schema (table unreadable, or schema discovery disabled)
    /// skips validation entirely. A name miss aborts with the full list of
    /// valid columns; one bad column fails the whole handler.
    pub fn validate(&self, schema: &[String], table: &str) -> Result<(), SpecError> {
        if schema.is_empty() {
            debug!(table, "empty target schema, skipping column validation");
            return Ok(());
        }
        for definition in self.columns.values() {
            if !schema.contains(&definition.name) {
                return Err(SpecError::UnknownColumn {
                    column: definition.name.clone(),
                    table: table.to_string(),
                    valid: schema.to_vec(),
                });
            }
            info!(column = %definition.name, table, "column verified against target table");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    /// Definitions in entry order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert one flat row into typed cells, in definition order.
    ///
    /// A column index beyond the row's width converts to Null, mirroring
    /// the conversion-failure path, so short rows still load with gaps.
    pub fn typed_row(&self, row: &[String]) -> Vec<CellValue> {
        self.columns
            .values()
            .map(|definition| match row.get(definition.index - 1) {
                Some(raw) => definition.parse_value(raw),
                None => CellValue::Null,
            })
            .collect()
    }
}
