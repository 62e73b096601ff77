// tests/binding/binding_test.rs
use rdlbind::binding::{bind, bind_all, parse_expression, ReportParameters};
use rdlbind::definition::{parse_definition_str, QueryParameterBinding};
use rdlbind::engine::BoundParameter;
use rdlbind::ReportError;
use std::path::Path;

fn binding(name: &str, expression: &str) -> QueryParameterBinding {
    QueryParameterBinding::new(name, expression)
}

#[test]
fn test_bound_name_is_query_parameter_name() {
    let params = ReportParameters::new().with_value("ID", "42");

    let bound = bind(&binding("@p", "=Parameters!ID.Value"), &params).unwrap();

    assert_eq!(
        bound,
        BoundParameter {
            name: "@p".to_string(),
            value: "42".to_string(),
        }
    );
}

#[test]
fn test_expression_roundtrips_any_parameter_name() {
    for name in ["ID", "Start Date", "région", "a.b", "x!y"] {
        let expression = format!("=Parameters!{name}.Value");
        assert_eq!(parse_expression(&expression).unwrap(), name);
    }
}

#[test]
fn test_unsupported_expressions_are_rejected() {
    let params = ReportParameters::new().with_value("ID", "42");

    for expression in [
        "42",
        "=Fields!ID.Value",
        "=Parameters!ID.Label",
        "=Parameters!.Value",
        "=Parameters!ID.Value + 1",
        "=CStr(Parameters!ID.Value)",
        "",
    ] {
        match bind(&binding("@p", expression), &params) {
            Err(ReportError::UnparsableExpression(text)) => assert_eq!(text, expression),
            other => panic!("{expression:?}: expected UnparsableExpression, got {other:?}"),
        }
    }
}

#[test]
fn test_unset_parameter_is_missing() {
    let params = ReportParameters::new().with_value("Other", "1");

    let err = bind(&binding("@p", "=Parameters!ID.Value"), &params).unwrap_err();

    assert!(matches!(err, ReportError::MissingParameterValue(ref name) if name == "ID"));
    assert_eq!(err.to_string(), "report parameter ID has no value set");
}

#[test]
fn test_parameter_with_no_values_is_missing() {
    let mut params = ReportParameters::new();
    params.set("ID", Vec::new());

    let err = bind(&binding("@p", "=Parameters!ID.Value"), &params).unwrap_err();

    assert!(matches!(err, ReportError::MissingParameterValue(_)));
}

#[test]
fn test_multi_value_binds_first_value() {
    let mut params = ReportParameters::new();
    params.set("Regions", vec!["North".to_string(), "South".to_string()]);

    let bound = bind(&binding("@r", "=Parameters!Regions.Value"), &params).unwrap();

    assert_eq!(bound.value, "North");
}

#[test]
fn test_bind_all_preserves_declaration_order() {
    let params = ReportParameters::new()
        .with_value("From", "2024-01-01")
        .with_value("To", "2024-12-31");
    let bindings = vec![
        binding("@to", "=Parameters!To.Value"),
        binding("@from", "=Parameters!From.Value"),
    ];

    let bound = bind_all(&bindings, &params).unwrap();

    let names: Vec<&str> = bound.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["@to", "@from"]);
    assert_eq!(bound[0].value, "2024-12-31");
}

#[test]
fn test_bind_all_stops_at_first_failure() {
    let params = ReportParameters::new().with_value("From", "2024-01-01");
    let bindings = vec![
        binding("@from", "=Parameters!From.Value"),
        binding("@to", "=Parameters!To.Value"),
        binding("@bad", "oops"),
    ];

    let err = bind_all(&bindings, &params).unwrap_err();

    assert!(matches!(err, ReportError::MissingParameterValue(ref name) if name == "To"));
}

#[test]
fn test_defaults_from_definition_then_overrides() {
    let source = r#"<Report xmlns="http://schemas.microsoft.com/sqlserver/reporting/2008/01/reportdefinition">
  <ReportParameters>
    <ReportParameter Name="ID">
      <DataType>Integer</DataType>
      <DefaultValue><Values><Value>7</Value></Values></DefaultValue>
    </ReportParameter>
    <ReportParameter Name="Region">
      <DataType>String</DataType>
    </ReportParameter>
  </ReportParameters>
</Report>"#;
    let definition = parse_definition_str(source, Path::new("defaults.rdlc")).unwrap();

    let mut params = ReportParameters::from_defaults(&definition.parameters);
    assert_eq!(params.first_value("ID"), Some("7"));
    assert_eq!(params.first_value("Region"), None);

    params.merge(ReportParameters::from_assignments(["ID=42", "Region=West"]).unwrap());
    assert_eq!(params.first_value("ID"), Some("42"));
    assert_eq!(params.first_value("Region"), Some("West"));
}

#[test]
fn test_assignments_collect_repeated_names() {
    let params =
        ReportParameters::from_assignments(["Regions=North", "Regions=South", "ID="]).unwrap();

    assert_eq!(
        params.values("Regions"),
        Some(&["North".to_string(), "South".to_string()][..])
    );
    assert_eq!(params.first_value("ID"), Some(""));
}

#[test]
fn test_assignment_without_equals_is_rejected() {
    assert!(ReportParameters::from_assignments(["ID"]).is_err());
    assert!(ReportParameters::from_assignments(["=42"]).is_err());
}

#[test]
fn test_expression_and_nil_defaults_stay_unset() {
    let source = r#"<Report xmlns="http://schemas.microsoft.com/sqlserver/reporting/2008/01/reportdefinition"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <ReportParameters>
    <ReportParameter Name="Since">
      <DataType>DateTime</DataType>
      <DefaultValue><Values><Value>=Today()</Value></Values></DefaultValue>
    </ReportParameter>
    <ReportParameter Name="Region">
      <DataType>String</DataType>
      <DefaultValue><Values><Value xsi:nil="true"/></Values></DefaultValue>
    </ReportParameter>
  </ReportParameters>
</Report>"#;
    let definition = parse_definition_str(source, Path::new("defaults.rdlc")).unwrap();

    let params = ReportParameters::from_defaults(&definition.parameters);

    assert!(params.is_empty());
    for (query_name, parameter) in [("@since", "Since"), ("@region", "Region")] {
        let expression = format!("=Parameters!{parameter}.Value");
        match bind(&binding(query_name, &expression), &params) {
            Err(ReportError::MissingParameterValue(name)) => assert_eq!(name, parameter),
            other => panic!("{parameter}: expected MissingParameterValue, got {other:?}"),
        }
    }
}

#[test]
fn test_mixed_literal_and_expression_defaults_stay_unset() {
    let source = r#"<Report xmlns="http://schemas.microsoft.com/sqlserver/reporting/2008/01/reportdefinition">
  <ReportParameters>
    <ReportParameter Name="Regions">
      <MultiValue>true</MultiValue>
      <DefaultValue><Values><Value>North</Value><Value>=First(Fields!Name.Value)</Value></Values></DefaultValue>
    </ReportParameter>
  </ReportParameters>
</Report>"#;
    let definition = parse_definition_str(source, Path::new("defaults.rdlc")).unwrap();

    let params = ReportParameters::from_defaults(&definition.parameters);

    assert_eq!(params.first_value("Regions"), None);
}
