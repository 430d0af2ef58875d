//! External relational store: capability trait and Diesel-backed client.
//!
//! The engines never talk SQL themselves; they call through [`TableStore`],
//! which covers exactly the two operations a handler needs: one
//! schema-introspection query at setup and optional stored-procedure
//! invocations around bulk processing. [`database::Database`] is the
//! Diesel/r2d2 implementation.

pub mod database;

pub use database::{Database, DatabaseConfig, Pool, PooledConnection};

use crate::error::StoreError;

/// A stored procedure takes at most four positional text parameters.
pub const MAX_PROCEDURE_PARAMS: usize = 4;

/// Capability contract for the external relational store.
///
/// Calls are synchronous, carry their own timeouts, and are never retried
/// here; callers decide whether a failure aborts setup or is logged and
/// skipped.
pub trait TableStore {
    /// Ordered column names of `table`, for validating a column spec.
    fn query_schema(&self, table: &str) -> Result<Vec<String>, StoreError>;

    /// Invoke a stored procedure with positional text parameters.
    ///
    /// An empty `name` is a no-op. Parameters are appended left-to-right
    /// with trailing empty parameters omitted.
    fn run_procedure(&self, name: &str, params: &[String]) -> Result<(), StoreError>;
}

/// Drop trailing empty parameters, per the procedure-call contract.
pub fn trim_trailing_empty(params: &[String]) -> &[String] {
    let keep = params
        .iter()
        .rposition(|p| !p.is_empty())
        .map(|last| last + 1)
        .unwrap_or(0);
    &params[..keep]
}
