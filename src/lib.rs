//! # Rowpath: Selection-Path Extraction into Typed Tabular Rows
//!
//! Rowpath turns two small declarative specifications into validated,
//! typed tabular data, and back:
//!
//! - a **selection rule** addresses values inside hierarchically structured
//!   messages (segment/field/component, as in clinical messaging formats)
//!   and emits the cross-product of matching values as output rows;
//! - a **column spec** maps 1-based flat-row positions to named, typed
//!   target-table columns, validated against the live schema, with
//!   lossy-aware string/typed-value conversion in both directions.
//!
//! ## Example: selection rule
//!
//! ```text
//! MSH-10~PID-11.7==MAILING~PID-11.5~PID-9
//! ```
//!
//! Selectors are separated by `~`; each addresses `SEGMENT-FIELD[.COMPONENT]`
//! with optional `==LITERAL` equality filtering. Repeating segments multiply
//! output rows (full cross-product); filtered selectors gate and deduplicate
//! rows instead of emitting columns.
//!
//! ## Example: column spec
//!
//! ```text
//! 1|USER_AGE;integer
//! 3|ADDRESS;string;120
//! 4|USER_DOB;date-time;d/MM/yyyy H:mm
//! ```
//!
//! ## Wiring
//!
//! ```
//! use rowpath::{Field, HierarchicalRecord, RecordConverter, Segment};
//!
//! let converter = RecordConverter::new("MSH-1~PID-1.2").unwrap();
//! let record = HierarchicalRecord::new(vec![
//!     Segment::new("MSH", vec![Field::scalar("MSG001")]),
//!     Segment::new("PID", vec![Field::new(vec![
//!         "Smith".to_string(),
//!         "John".to_string(),
//!     ])]),
//! ]);
//!
//! let rows: Vec<Vec<String>> = converter.rows(&record).collect();
//! assert_eq!(rows, vec![vec!["MSG001".to_string(), "John".to_string()]]);
//! ```
//!
//! Specs are parsed once at configuration time and immutable afterwards;
//! records and rows are per-message and the engines keep no cross-message
//! state, so steady-state evaluation is safe to run concurrently.

// Core modules
pub mod columns;
pub mod error;
pub mod record;
pub mod selection;

// Row output sinks
pub mod emit;

// Handler configuration and processing glue
pub mod handler;

// External relational store (Diesel/r2d2)
pub mod db;

// Re-export key types
pub use columns::{CellValue, ColumnDefinition, ColumnSet, ColumnType};
pub use error::{SpecError, StoreError};
pub use record::{Address, Field, HierarchicalRecord, Segment};
pub use selection::{
    MatchOccurrence, ResolvedRow, RowIter, SelectionRule, SelectorSpec, SELECTOR_SEPARATOR,
};

pub use emit::{CsvSink, EmitError, MemorySink, NdjsonSink, RowSink};
pub use handler::{HandlerConfig, RecordConverter, TableLoader};

pub use db::{Database, DatabaseConfig, TableStore};
