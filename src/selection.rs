//! Selection-path mini-language: parsing and evaluation.
//!
//! A selection rule is a `~`-separated list of selectors, each addressing one
//! value in a hierarchical record:
//!
//! ```text
//! MSH-10~PID-11.7==MAILING~PID-11.5~PID-9
//! ```
//!
//! Selector grammar is `SEGMENT-FIELD[.COMPONENT][==LITERAL]` with 1-based
//! field/component indices. Because segments repeat, one selector can match
//! many occurrences; evaluating a rule against a record yields the Cartesian
//! product of all selectors' occurrence lists, one output row per
//! combination. A selector carrying an `==` filter gates and deduplicates
//! rows instead of emitting a column.
//!
//! Rules are parsed once at configuration time and immutable afterwards;
//! evaluation holds no state across records.

use crate::error::SpecError;
use crate::record::{Address, HierarchicalRecord};

/// Separator between selectors in a rule string.
pub const SELECTOR_SEPARATOR: char = '~';

const FILTER_TOKEN: &str = "==";

/// One output row: ordered values of the emitting selectors for one
/// cross-product combination.
pub type ResolvedRow = Vec<String>;

/// One parsed selector: an address pattern plus optional equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpec {
    tag: String,
    field: usize,
    component: Option<usize>,
    filter: Option<String>,
    raw: String,
}

impl SelectorSpec {
    /// Parse a single selector.
    ///
    /// # Example
    /// ```
    /// use rowpath::SelectorSpec;
    ///
    /// let spec = SelectorSpec::parse("PID-11.7==MAILING").unwrap();
    /// assert_eq!(spec.tag(), "PID");
    /// assert_eq!(spec.field(), 11);
    /// assert_eq!(spec.component(), Some(7));
    /// assert_eq!(spec.filter(), Some("MAILING"));
    /// ```
    pub fn parse(selector: &str) -> Result<Self, SpecError> {
        let raw = selector.to_string();
        let syntax = |reason: &str| SpecError::Syntax {
            spec: raw.clone(),
            reason: reason.to_string(),
        };

        let (address, filter) = match selector.find(FILTER_TOKEN) {
            Some(at) => {
                let literal = &selector[at + FILTER_TOKEN.len()..];
                if literal.is_empty() {
                    return Err(syntax("empty filter literal"));
                }
                (&selector[..at], Some(literal.to_string()))
            }
            None => (selector, None),
        };

        let (tag, indices) = address
            .split_once('-')
            .ok_or_else(|| syntax("missing field index"))?;
        if tag.is_empty() {
            return Err(syntax("missing segment tag"));
        }

        let (field_text, component_text) = match indices.split_once('.') {
            Some((field, component)) => (field, Some(component)),
            None => (indices, None),
        };

        let field = parse_index(field_text).ok_or_else(|| syntax("invalid field index"))?;
        let component = match component_text {
            Some(text) => {
                Some(parse_index(text).ok_or_else(|| syntax("invalid component index"))?)
            }
            None => None,
        };

        Ok(Self {
            tag: tag.to_string(),
            field,
            component,
            filter,
            raw,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn component(&self) -> Option<usize> {
        self.component
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Whether this selector contributes a value to output rows.
    /// Filtered selectors only gate rows.
    pub fn emits_column(&self) -> bool {
        self.filter.is_none()
    }

    /// The selector text as written in the rule.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All matches for this selector in one record, in record order.
    ///
    /// An absent segment, field, or component is a resolution miss and
    /// yields no occurrence. When a filter is present, occurrences whose
    /// value differs from the literal are discarded (case-sensitive).
    pub fn occurrences(&self, record: &HierarchicalRecord) -> Vec<MatchOccurrence> {
        let mut matches = Vec::new();
        for (occurrence, &position) in record.occurrences(&self.tag).iter().enumerate() {
            let segment = match record.segment(position) {
                Some(segment) => segment,
                None => continue,
            };
            let field = match segment.field(self.field) {
                Some(field) => field,
                None => continue,
            };
            let value = match self.component {
                Some(index) => match field.component(index) {
                    Some(value) => value.to_string(),
                    None => continue,
                },
                None => field.whole(record.component_separator()),
            };
            if let Some(filter) = &self.filter {
                if value != *filter {
                    continue;
                }
            }
            matches.push(MatchOccurrence {
                address: Address {
                    tag: self.tag.clone(),
                    occurrence,
                    field: self.field,
                    component: self.component,
                },
                value,
            });
        }
        matches
    }
}

/// 1-based indices only; `0` and non-numeric text are grammar violations.
fn parse_index(text: &str) -> Option<usize> {
    match text.parse::<usize>() {
        Ok(value) if value >= 1 => Some(value),
        _ => None,
    }
}

/// One concrete match of a selector in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOccurrence {
    pub address: Address,
    pub value: String,
}

/// An ordered list of selectors, parsed once from the full rule string.
///
/// Selector order defines output column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRule {
    selectors: Vec<SelectorSpec>,
    raw: String,
}

impl SelectionRule {
    /// Parse a `~`-separated rule string.
    ///
    /// Fails on the first malformed selector; a handler with an invalid rule
    /// must not process any messages.
    pub fn parse(rule: &str) -> Result<Self, SpecError> {
        if rule.trim().is_empty() {
            return Err(SpecError::Syntax {
                spec: rule.to_string(),
                reason: "empty selection rule".to_string(),
            });
        }

        let selectors = rule
            .split(SELECTOR_SEPARATOR)
            .map(|selector| SelectorSpec::parse(selector.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            selectors,
            raw: rule.to_string(),
        })
    }

    pub fn selectors(&self) -> &[SelectorSpec] {
        &self.selectors
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of values in each emitted row.
    pub fn output_width(&self) -> usize {
        self.selectors.iter().filter(|s| s.emits_column()).count()
    }

    /// Evaluate the rule against one record.
    ///
    /// Returns a lazy iterator over the cross-product of all selectors'
    /// occurrence lists, in a fixed nested order: the first selector varies
    /// slowest. Repeated evaluation of the same record yields an identical
    /// row sequence.
    ///
    /// Occurrence-list policy per selector:
    /// - unfiltered, one or more matches: one branch per match;
    /// - unfiltered, no match: a single empty-value placeholder, so a
    ///   missing field leaves a gap instead of suppressing the record;
    /// - filtered, one or more matches: collapsed to a single non-emitting
    ///   branch (filters deduplicate, they do not multiply);
    /// - filtered, no match: an empty list, so the whole product is empty and
    ///   the record yields zero rows.
    pub fn rows(&self, record: &HierarchicalRecord) -> RowIter {
        let branches = self
            .selectors
            .iter()
            .map(|selector| {
                let mut values: Vec<String> = selector
                    .occurrences(record)
                    .into_iter()
                    .map(|m| m.value)
                    .collect();
                if selector.filter().is_some() {
                    values.truncate(1);
                } else if values.is_empty() {
                    values.push(String::new());
                }
                SelectorBranch {
                    emits: selector.emits_column(),
                    values,
                }
            })
            .collect();

        RowIter::new(branches)
    }
}

#[derive(Debug, Clone)]
struct SelectorBranch {
    emits: bool,
    values: Vec<String>,
}

/// Lazy cross-product enumeration over per-selector occurrence values.
///
/// Memory stays bounded by the occurrence lists themselves; rows are
/// materialized one at a time.
#[derive(Debug)]
pub struct RowIter {
    branches: Vec<SelectorBranch>,
    cursor: Vec<usize>,
    exhausted: bool,
}

impl RowIter {
    fn new(branches: Vec<SelectorBranch>) -> Self {
        let exhausted =
            branches.is_empty() || branches.iter().any(|branch| branch.values.is_empty());
        let cursor = vec![0; branches.len()];
        Self {
            branches,
            cursor,
            exhausted,
        }
    }
}

impl Iterator for RowIter {
    type Item = ResolvedRow;

    fn next(&mut self) -> Option<ResolvedRow> {
        if self.exhausted {
            return None;
        }

        let row: ResolvedRow = self
            .branches
            .iter()
            .zip(&self.cursor)
            .filter(|(branch, _)| branch.emits)
            .map(|(branch, &index)| branch.values[index].clone())
            .collect();

        // Odometer advance from the innermost (last) selector; the first
        // selector varies slowest.
        let mut advanced = false;
        for index in (0..self.cursor.len()).rev() {
            self.cursor[index] += 1;
            if self.cursor[index] < self.branches[index].values.len() {
                advanced = true;
                break;
            }
            self.cursor[index] = 0;
        }
        if !advanced {
            self.exhausted = true;
        }

        Some(row)
    }
}
