//! Row sinks for engine output.
//!
//! The engines emit ordered string rows; sinks own serialization. Shipped
//! sinks cover CSV lines, NDJSON (one JSON array per line), and an in-memory
//! capture for tests.

use std::io::Write;

/// Error type for sink operations
#[derive(Debug)]
pub enum EmitError {
    CsvError(csv::Error),
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<csv::Error> for EmitError {
    fn from(err: csv::Error) -> Self {
        EmitError::CsvError(err)
    }
}

impl From<serde_json::Error> for EmitError {
    fn from(err: serde_json::Error) -> Self {
        EmitError::JsonError(err)
    }
}

impl From<std::io::Error> for EmitError {
    fn from(err: std::io::Error) -> Self {
        EmitError::IoError(err)
    }
}

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitError::CsvError(e) => write!(f, "CSV error: {}", e),
            EmitError::JsonError(e) => write!(f, "JSON error: {}", e),
            EmitError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for EmitError {}

/// Downstream consumer of resolved rows.
pub trait RowSink {
    /// Write one row of ordered string fields.
    fn write_row(&mut self, row: &[String]) -> Result<(), EmitError>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), EmitError> {
        Ok(())
    }
}

/// CSV line writer.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_row(&mut self, row: &[String]) -> Result<(), EmitError> {
        self.writer.write_record(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EmitError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// NDJSON writer: each row becomes one JSON array line.
pub struct NdjsonSink<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> RowSink for NdjsonSink<W> {
    fn write_row(&mut self, row: &[String]) -> Result<(), EmitError> {
        let json = serde_json::to_string(row)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EmitError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory capture, mainly for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Vec<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

impl RowSink for MemorySink {
    fn write_row(&mut self, row: &[String]) -> Result<(), EmitError> {
        self.rows.push(row.to_vec());
        Ok(())
    }
}
