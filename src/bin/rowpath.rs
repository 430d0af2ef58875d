//! rowpath CLI - convert delimited messages into tabular rows
//!
//! Loads a handler configuration, reads blank-line-separated delimited
//! messages from a file, and prints the resolved rows to stdout. Message
//! parsing lives here, not in the library: the engines only ever see
//! already-parsed records.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;

use rowpath::{
    ColumnSet, CsvSink, Field, HandlerConfig, HierarchicalRecord, NdjsonSink, RecordConverter,
    Segment, SelectionRule,
};

#[derive(Parser)]
#[command(name = "rowpath")]
#[command(version, about = "Selection-path extraction from delimited messages into tabular rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert messages from a file into rows on stdout
    Convert {
        /// Path to handler configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to input file (blank-line-separated delimited messages)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Separator between fields of a message line
        #[arg(long, default_value_t = '|')]
        field_separator: char,

        /// Separator between components of a field
        #[arg(long, default_value_t = '^')]
        component_separator: char,
    },

    /// Validate the selection rule and column spec without processing
    Validate {
        /// Path to handler configuration YAML
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Ndjson,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            config,
            input,
            format,
            field_separator,
            component_separator,
        } => convert(config, input, format, field_separator, component_separator),
        Commands::Validate { config } => validate(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn convert(
    config: PathBuf,
    input: PathBuf,
    format: OutputFormat,
    field_separator: char,
    component_separator: char,
) -> Result<(), String> {
    let config = HandlerConfig::load_from_file(&config)?;
    let converter = RecordConverter::from_config(&config)
        .map_err(|e| format!("Invalid selection rule: {}", e))?;

    let text = fs::read_to_string(&input)
        .map_err(|e| format!("Failed to read input file {}: {}", input.display(), e))?;
    let records = parse_messages(&text, field_separator, component_separator);
    let message_count = records.len();

    let cancel = AtomicBool::new(false);
    let stdout = io::stdout();
    let emitted = match format {
        OutputFormat::Csv => {
            let mut sink = CsvSink::new(stdout.lock());
            converter.run(records, &mut sink, &cancel)
        }
        OutputFormat::Ndjson => {
            let mut sink = NdjsonSink::new(stdout.lock());
            converter.run(records, &mut sink, &cancel)
        }
    }
    .map_err(|e| format!("Failed to write rows: {}", e))?;

    eprintln!("  ✓ {} messages, {} rows", message_count, emitted);
    Ok(())
}

fn validate(config: PathBuf) -> Result<(), String> {
    let config = HandlerConfig::load_from_file(&config)?;
    let mut checked = 0;

    if !config.selection_rule.is_empty() {
        let rule = SelectionRule::parse(&config.selection_rule)
            .map_err(|e| format!("Invalid selection rule: {}", e))?;
        println!(
            "  ✓ selection rule: {} selectors, {} output columns",
            rule.selectors().len(),
            rule.output_width()
        );
        checked += 1;
    }

    if !config.column_spec.is_empty() {
        let columns = ColumnSet::parse(&config.column_spec)
            .map_err(|e| format!("Invalid column spec: {}", e))?;
        println!("  ✓ column spec: {} columns", columns.len());
        checked += 1;
    }

    if checked == 0 {
        return Err("config defines neither selection-rule nor column-spec".to_string());
    }
    println!("  ✓ Configuration is valid");
    Ok(())
}

/// Parse blank-line-separated message blocks. Each non-empty line is one
/// segment: the tag, then fields, split on the field separator; fields
/// split into components on the component separator.
fn parse_messages(
    text: &str,
    field_separator: char,
    component_separator: char,
) -> Vec<HierarchicalRecord> {
    let mut records = Vec::new();
    let mut segments = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !segments.is_empty() {
                records.push(
                    HierarchicalRecord::new(std::mem::take(&mut segments))
                        .with_component_separator(component_separator),
                );
            }
            continue;
        }

        let mut parts = line.split(field_separator);
        let tag = parts.next().unwrap_or("").trim().to_string();
        if tag.is_empty() {
            continue;
        }
        let fields = parts
            .map(|field| {
                Field::new(
                    field
                        .split(component_separator)
                        .map(|c| c.to_string())
                        .collect(),
                )
            })
            .collect();
        segments.push(Segment::new(tag, fields));
    }

    if !segments.is_empty() {
        records.push(
            HierarchicalRecord::new(segments).with_component_separator(component_separator),
        );
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_messages_on_blank_lines() {
        let text = "MSH|MSG001\nPID|1|Smith^John\n\nMSH|MSG002\n";
        let records = parse_messages(text, '|', '^');
        assert_eq!(records.len(), 2);

        let pid = records[0].segment(1).unwrap();
        assert_eq!(pid.tag(), "PID");
        assert_eq!(pid.field(2).unwrap().component(1), Some("Smith"));
        assert_eq!(records[1].segments().len(), 1);
    }

    #[test]
    fn skips_lines_without_a_tag() {
        let records = parse_messages("|no tag here\nOBX|1\n", '|', '^');
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].segments().len(), 1);
    }
}
