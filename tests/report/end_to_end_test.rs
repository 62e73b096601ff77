// tests/report/end_to_end_test.rs
#[path = "../support/mod.rs"]
mod support;

use rdlbind::binding::ReportParameters;
use rdlbind::engine::{BoundParameter, Value};
use rdlbind::{load_report_data, LoadCycle};
use support::*;

const SCHEMA: &str = "
    CREATE TABLE T (id INTEGER, label TEXT);
    INSERT INTO T VALUES (41, 'before'), (42, 'answer'), (43, 'after');
";

fn single_dataset(source: String) -> String {
    report(&format!(
        "{}\n{}",
        data_sources(&[source]),
        datasets(&[dataset(
            "D",
            "DS",
            "SELECT * FROM T WHERE id=@p",
            &[("@p", "=Parameters!ID.Value")],
        )]),
    ))
}

#[test]
fn test_inline_source_end_to_end() {
    let fixture = Fixture::new();
    let db = fixture.database("t.db", SCHEMA);
    let path = fixture.write(
        "report.rdlc",
        &single_dataset(inline_source("DS", &format!("data source={}", db.display()))),
    );
    let params = ReportParameters::new().with_value("ID", "42");
    let mut recorder = Recorder::new();

    let outcome = load_report_data(&path, &["D"], &params, &mut recorder).unwrap();

    let table = outcome.table("D").unwrap();
    assert_eq!(table.columns(), ["id", "label"]);
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.get(0, "label"), Some(&Value::Text("answer".to_string())));

    let log = recorder.log.borrow();
    assert_eq!(log.requests.len(), 1);
    assert_eq!(log.requests[0].data_source_name, "DS");
    assert_eq!(
        log.executes,
        vec![(
            "SELECT * FROM T WHERE id=@p".to_string(),
            vec![BoundParameter {
                name: "@p".to_string(),
                value: "42".to_string(),
            }],
        )]
    );
    assert_eq!(log.closes, vec!["DS"]);
}

#[test]
fn test_referenced_source_end_to_end() {
    let fixture = Fixture::new();
    let db = fixture.database("t.db", SCHEMA);
    fixture.write("foo.rds", &rds(&format!("data source={}", db.display())));
    let path = fixture.write("report.rdlc", &single_dataset(referenced_source("DS", "foo")));
    let params = ReportParameters::new().with_value("ID", "42");
    let mut recorder = Recorder::new();

    let outcome = load_report_data(&path, &["D"], &params, &mut recorder).unwrap();

    assert_eq!(
        outcome.table("D").unwrap().get(0, "id"),
        Some(&Value::Integer(42))
    );
    assert_eq!(
        recorder.log.borrow().requests[0].base,
        format!("data source={}", db.display())
    );
}

#[test]
fn test_default_parameter_values_drive_the_query() {
    let fixture = Fixture::new();
    let db = fixture.database("t.db", SCHEMA);
    let source = single_dataset(inline_source("DS", &format!("data source={}", db.display())))
        .replace(
            "<Body>",
            r#"<ReportParameters>
  <ReportParameter Name="ID">
    <DataType>Integer</DataType>
    <DefaultValue><Values><Value>43</Value></Values></DefaultValue>
  </ReportParameter>
</ReportParameters>
<Body>"#,
        );
    let path = fixture.write("report.rdlc", &source);
    let mut recorder = Recorder::new();
    let mut cycle = LoadCycle::open(&path).unwrap();
    let params = ReportParameters::from_defaults(&cycle.definition().parameters);

    let table = cycle.get_data("D", &params, &mut recorder).unwrap().unwrap();
    cycle.cleanup().unwrap();

    assert_eq!(table.get(0, "label"), Some(&Value::Text("after".to_string())));
}

#[test]
fn test_no_matching_rows_yields_empty_table() {
    let fixture = Fixture::new();
    let db = fixture.database("t.db", SCHEMA);
    let path = fixture.write(
        "report.rdlc",
        &single_dataset(inline_source("DS", &format!("data source={}", db.display()))),
    );
    let params = ReportParameters::new().with_value("ID", "7");
    let mut recorder = Recorder::new();

    let outcome = load_report_data(&path, &["D"], &params, &mut recorder).unwrap();

    let table = outcome.table("D").unwrap();
    assert!(table.is_empty());
    assert_eq!(table.column_count(), 2);
}
