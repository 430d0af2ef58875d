//! Read-only model of one hierarchically structured message.
//!
//! A record is an ordered sequence of tagged segments; a segment is an
//! ordered sequence of fields; a field is an ordered sequence of scalar
//! components. Segments may repeat under one tag, and occurrence order is
//! significant: the selection engine enumerates cross-products over it.
//!
//! Records are produced by an external message parser and only read here;
//! the occurrence index is precomputed at construction so selector
//! evaluation is plain nested iteration.

use indexmap::IndexMap;
use std::fmt;

/// One field of a segment: an ordered list of scalar components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    components: Vec<String>,
}

impl Field {
    pub fn new(components: Vec<String>) -> Self {
        Self { components }
    }

    /// A field holding a single component.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self {
            components: vec![value.into()],
        }
    }

    /// Component by 1-based index, as written in selection rules.
    pub fn component(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.components.get(index - 1).map(|s| s.as_str())
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The whole-field value: a lone component verbatim, otherwise all
    /// components joined with the record's component separator.
    pub fn whole(&self, separator: char) -> String {
        match self.components.as_slice() {
            [single] => single.clone(),
            many => many.join(&separator.to_string()),
        }
    }
}

/// A named group of fields within one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    tag: String,
    fields: Vec<Field>,
}

impl Segment {
    pub fn new(tag: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            tag: tag.into(),
            fields,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Field by 1-based index; the tag itself is not addressable.
    pub fn field(&self, index: usize) -> Option<&Field> {
        if index == 0 {
            return None;
        }
        self.fields.get(index - 1)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// One parsed message: ordered segments plus a tag → positions index.
#[derive(Debug, Clone)]
pub struct HierarchicalRecord {
    segments: Vec<Segment>,
    occurrences: IndexMap<String, Vec<usize>>,
    component_separator: char,
}

pub const DEFAULT_COMPONENT_SEPARATOR: char = '^';

impl HierarchicalRecord {
    pub fn new(segments: Vec<Segment>) -> Self {
        let mut occurrences: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (position, segment) in segments.iter().enumerate() {
            occurrences
                .entry(segment.tag.clone())
                .or_default()
                .push(position);
        }

        Self {
            segments,
            occurrences,
            component_separator: DEFAULT_COMPONENT_SEPARATOR,
        }
    }

    pub fn with_component_separator(mut self, separator: char) -> Self {
        self.component_separator = separator;
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Positions of all segments carrying `tag`, in record order.
    /// Empty for a tag the record does not contain.
    pub fn occurrences(&self, tag: &str) -> &[usize] {
        self.occurrences.get(tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn segment(&self, position: usize) -> Option<&Segment> {
        self.segments.get(position)
    }

    pub fn component_separator(&self) -> char {
        self.component_separator
    }
}

/// Resolved pointer to one value inside a record.
///
/// `occurrence` is the 0-based position within the tag's occurrence list,
/// not the absolute segment position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub tag: String,
    pub occurrence: usize,
    pub field: usize,
    pub component: Option<usize>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]-{}", self.tag, self.occurrence, self.field)?;
        if let Some(component) = self.component {
            write!(f, ".{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> HierarchicalRecord {
        HierarchicalRecord::new(vec![
            Segment::new("MSH", vec![Field::scalar("a"), Field::scalar("b")]),
            Segment::new("PID", vec![Field::new(vec![
                "Smith".to_string(),
                "John".to_string(),
            ])]),
            Segment::new("OBX", vec![Field::scalar("1")]),
            Segment::new("OBX", vec![Field::scalar("2")]),
        ])
    }

    #[test]
    fn occurrence_index_preserves_record_order() {
        let record = sample_record();
        assert_eq!(record.occurrences("OBX"), &[2, 3]);
        assert_eq!(record.occurrences("PID"), &[1]);
        assert_eq!(record.occurrences("ZZZ"), &[] as &[usize]);
    }

    #[test]
    fn field_and_component_addressing_is_one_based() {
        let record = sample_record();
        let pid = record.segment(1).unwrap();
        let field = pid.field(1).unwrap();
        assert_eq!(field.component(1), Some("Smith"));
        assert_eq!(field.component(2), Some("John"));
        assert_eq!(field.component(3), None);
        assert_eq!(field.component(0), None);
        assert!(pid.field(0).is_none());
        assert!(pid.field(2).is_none());
    }

    #[test]
    fn whole_field_joins_components() {
        let field = Field::new(vec!["Smith".to_string(), "John".to_string()]);
        assert_eq!(field.whole('^'), "Smith^John");

        let single = Field::scalar("Smith");
        assert_eq!(single.whole('^'), "Smith");
    }

    #[test]
    fn address_display_includes_component() {
        let address = Address {
            tag: "PID".to_string(),
            occurrence: 0,
            field: 11,
            component: Some(7),
        };
        assert_eq!(address.to_string(), "PID[0]-11.7");
    }
}
