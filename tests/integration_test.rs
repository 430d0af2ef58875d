//! Integration tests for the selection and column engines.

use std::io::Write as _;
use std::sync::atomic::AtomicBool;

use rowpath::{
    CellValue, ColumnSet, CsvSink, Field, HandlerConfig, HierarchicalRecord, MemorySink,
    RecordConverter, SelectionRule, Segment, SpecError, StoreError, TableLoader, TableStore,
};

fn lab_message() -> HierarchicalRecord {
    HierarchicalRecord::new(vec![
        Segment::new("MSH", vec![Field::scalar("MSG-7781")]),
        Segment::new(
            "PID",
            vec![
                Field::scalar("1"),
                Field::new(vec!["Smith".to_string(), "John".to_string()]),
                Field::scalar("1980-01-15"),
            ],
        ),
        Segment::new("OBX", vec![Field::scalar("1"), Field::scalar("120")]),
        Segment::new("OBX", vec![Field::scalar("2"), Field::scalar("80")]),
    ])
}

#[test]
fn single_match_selectors_emit_one_row_of_addressed_values() {
    let rule = SelectionRule::parse("MSH-1~PID-2.1~PID-3").unwrap();
    let rows: Vec<Vec<String>> = rule.rows(&lab_message()).collect();
    assert_eq!(
        rows,
        vec![vec![
            "MSG-7781".to_string(),
            "Smith".to_string(),
            "1980-01-15".to_string(),
        ]]
    );
}

#[test]
fn repeating_segments_produce_the_full_cross_product() {
    let record = HierarchicalRecord::new(vec![
        Segment::new("ORC", vec![Field::scalar("a")]),
        Segment::new("ORC", vec![Field::scalar("b")]),
        Segment::new("OBX", vec![Field::scalar("1")]),
        Segment::new("OBX", vec![Field::scalar("2")]),
        Segment::new("OBX", vec![Field::scalar("3")]),
    ]);
    let rule = SelectionRule::parse("ORC-1~OBX-1").unwrap();
    let rows: Vec<Vec<String>> = rule.rows(&record).collect();

    assert_eq!(rows.len(), 6);
    // Outer selector varies slowest.
    assert_eq!(rows[0], vec!["a".to_string(), "1".to_string()]);
    assert_eq!(rows[2], vec!["a".to_string(), "3".to_string()]);
    assert_eq!(rows[3], vec!["b".to_string(), "1".to_string()]);
    let distinct: std::collections::HashSet<_> = rows.iter().collect();
    assert_eq!(distinct.len(), 6);
}

#[test]
fn unmatched_filter_suppresses_every_row() {
    let rule = SelectionRule::parse("MSH-1~PID-2.1==MAILING").unwrap();
    assert_eq!(rule.rows(&lab_message()).count(), 0);
}

#[test]
fn malformed_rule_fails_before_any_record_is_processed() {
    match SelectionRule::parse("PID") {
        Err(SpecError::Syntax { spec, .. }) => assert_eq!(spec, "PID"),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn identical_input_yields_byte_identical_output() {
    let converter = RecordConverter::new("MSH-1~OBX-1~OBX-2").unwrap();
    let cancel = AtomicBool::new(false);

    let render = || {
        let mut buffer = Vec::new();
        let mut sink = CsvSink::new(&mut buffer);
        converter
            .run([lab_message()], &mut sink, &cancel)
            .unwrap();
        drop(sink);
        buffer
    };

    assert_eq!(render(), render());
}

#[test]
fn date_time_column_round_trips_exactly() {
    let columns = ColumnSet::parse(["1|VISIT_DATE;date-time;yyyy-MM-dd"]).unwrap();
    let definition = columns.get("VISIT_DATE").unwrap();
    let typed = definition.parse_value("2024-03-01");
    assert_eq!(definition.format_value(&typed), "2024-03-01");
}

#[test]
fn string_column_truncates_to_configured_length() {
    let columns = ColumnSet::parse(["3|ADDRESS;string;5"]).unwrap();
    let definition = columns.get("ADDRESS").unwrap();
    assert_eq!(
        definition.parse_value("Melbourne"),
        CellValue::Text("Melbo".to_string())
    );
}

struct FixedSchemaStore {
    columns: Vec<String>,
}

impl TableStore for FixedSchemaStore {
    fn query_schema(&self, _table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.columns.clone())
    }

    fn run_procedure(&self, _name: &str, _params: &[String]) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn setup_fails_when_a_column_is_missing_from_the_target_schema() {
    let store = FixedSchemaStore {
        columns: vec!["ID".to_string(), "NAME".to_string()],
    };
    let config = HandlerConfig {
        column_spec: vec!["1|AGE;integer".to_string()],
        db_table_name: "PATIENTS".to_string(),
        ..Default::default()
    };

    match TableLoader::new(&config, &store) {
        Err(SpecError::UnknownColumn { column, table, .. }) => {
            assert_eq!(column, "AGE");
            assert_eq!(table, "PATIENTS");
        }
        other => panic!("expected unknown-column failure, got {:?}", other.err()),
    }
}

#[test]
fn config_file_drives_the_full_selection_pipeline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "selection-rule: \"MSH-1~PID-2.1==Smith~PID-2.2~PID-3\"\n\
         column-spec:\n\
         \x20 - \"1|MESSAGE_ID;string;64\"\n\
         \x20 - \"2|FIRST_NAME;string;5\"\n\
         \x20 - \"3|BIRTH_DATE;date-time;yyyy-MM-dd\"\n\
         db-table-name: PATIENTS\n"
    )
    .unwrap();

    let config = HandlerConfig::load_from_file(file.path()).unwrap();
    let converter = RecordConverter::from_config(&config).unwrap();

    let mut sink = MemorySink::new();
    let cancel = AtomicBool::new(false);
    let emitted = converter
        .run([lab_message()], &mut sink, &cancel)
        .unwrap();
    assert_eq!(emitted, 1);
    assert_eq!(
        sink.rows(),
        &[vec![
            "MSG-7781".to_string(),
            "John".to_string(),
            "1980-01-15".to_string(),
        ]]
    );

    let store = FixedSchemaStore {
        columns: vec![
            "MESSAGE_ID".to_string(),
            "FIRST_NAME".to_string(),
            "BIRTH_DATE".to_string(),
        ],
    };
    let loader = TableLoader::new(&config, &store).unwrap();
    let cells = loader.typed_row(&sink.rows()[0]);

    assert_eq!(cells[0], CellValue::Text("MSG-7781".to_string()));
    assert_eq!(cells[1], CellValue::Text("John".to_string()));
    match &cells[2] {
        CellValue::DateTime(dt) => {
            assert_eq!(dt.format("%Y-%m-%d").to_string(), "1980-01-15")
        }
        other => panic!("expected date-time cell, got {:?}", other),
    }
}
