//! Integration tests for gleaner: rules, resolution, parsing and output

use gleaner::loader::{load_concepts, load_conversion_config};
use gleaner::serialization::write_ndjson;
use gleaner::{
    read_document, ConceptDefinition, ConversionConfig, ConverterRegistry, EmptyRule,
    EvaluationError, ResolvedConcepts, StopMarker, StrategyKind, TargetType, TextParser,
    TypedValue, ValueConverter, ValueFactory,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use tempfile::{Builder, NamedTempFile};

const STATEMENT: &str = "ACME BANK
Account: 0012-3456
Statement date: 2024-03-31
Date   Description              Amount
03/01  Coffee shop              -4.50
03/02  Salary ACME            2,500.00
03/05  Rent                   1,200.00-
Closing balance 1,295.50
03/06  Not included              9.99
";

fn statement_concepts() -> Vec<ConceptDefinition> {
    vec![
        ConceptDefinition::new("account", TargetType::Text, StrategyKind::Offset)
            .with_leading_text("Account:")
            .with_anchor(1, 2),
        ConceptDefinition::new("statement_date", TargetType::Date, StrategyKind::Offset)
            .with_leading_text("Statement date:")
            .with_anchor(1, 3),
        ConceptDefinition::new("payee", TargetType::Text, StrategyKind::ConceptAndPattern)
            .with_after_concept("date")
            .with_before_regex(r"-?[\d,]+\.\d{2}-?")
            .with_anchor(1, 5)
            .as_detail(),
        ConceptDefinition::new("date", TargetType::Text, StrategyKind::Pattern)
            .with_regex(r"^\d{2}/\d{2}")
            .with_stop_at_keyword("Closing balance")
            .with_anchor(1, 5)
            .as_detail(),
        ConceptDefinition::new("amount", TargetType::Decimal, StrategyKind::Pattern)
            .with_regex(r"-?[\d,]+\.\d{2}-?")
            .with_anchor(1, 5)
            .as_detail(),
    ]
}

fn statement_config() -> ConversionConfig {
    ConversionConfig::builder()
        .round_to_2()
        .iso_dates()
        .trailing_minus(true)
        .build()
        .unwrap()
}

fn decimal(value: &str) -> TypedValue {
    TypedValue::Decimal(Decimal::from_str(value).unwrap())
}

fn text(value: &str) -> TypedValue {
    TypedValue::Text(value.to_string())
}

#[test]
fn test_statement_end_to_end() {
    let concepts = ResolvedConcepts::resolve(statement_concepts()).unwrap();
    assert_eq!(
        concepts.descriptions(),
        vec!["account", "statement_date", "date", "payee", "amount"]
    );

    let converter = ValueConverter::new();
    let config = statement_config();
    let result = TextParser::new(&concepts, &converter, &config).parse_text(STATEMENT);

    assert!(result.is_clean(), "unexpected errors: {:?}", result.errors());
    assert_eq!(result.stop_marker(), Some(StopMarker { page: 1, line: 8 }));
    assert_eq!(result.outputs().len(), 11);

    assert_eq!(result.values_for("account"), vec![&text("0012-3456")]);
    assert_eq!(
        result.values_for("statement_date"),
        vec![&TypedValue::Date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())]
    );
    assert_eq!(
        result.values_for("date"),
        vec![&text("03/01"), &text("03/02"), &text("03/05")]
    );
    assert_eq!(
        result.values_for("payee"),
        vec![&text("Coffee shop"), &text("Salary ACME"), &text("Rent")]
    );
    assert_eq!(
        result.values_for("amount"),
        vec![&decimal("-4.50"), &decimal("2500.00"), &decimal("-1200.00")]
    );

    // Outputs keep line-encounter order.
    let lines: Vec<u32> = result.iter().map(|o| o.line).collect();
    assert_eq!(lines, vec![2, 3, 5, 5, 5, 6, 6, 6, 7, 7, 7]);
}

#[test]
fn test_resolved_concepts_shared_across_runs() {
    let concepts = ResolvedConcepts::resolve(statement_concepts()).unwrap();
    let converter = ValueConverter::new();
    let config = statement_config();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| TextParser::new(&concepts, &converter, &config).parse_text(STATEMENT))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[test]
fn test_failures_do_not_abort_the_run() {
    let concepts = ResolvedConcepts::resolve(vec![
        ConceptDefinition::new("amount", TargetType::I32, StrategyKind::WholeLine)
            .with_anchor(1, 1)
            .as_detail()
            .with_trim(true),
    ])
    .unwrap();
    let converter = ValueConverter::new();
    let config = ConversionConfig::builder()
        .when_empty(TargetType::I32, EmptyRule::Fail)
        .build()
        .unwrap();

    let result = TextParser::new(&concepts, &converter, &config).parse_text("1\nx\n\n4");

    assert_eq!(
        result.values_for("amount"),
        vec![&TypedValue::Int(1), &TypedValue::Int(4)]
    );
    assert_eq!(result.errors().len(), 2);
    assert_eq!(result.errors()[0].line, 2);
    assert_eq!(result.errors()[0].content, "x");
    assert_eq!(result.errors()[1].line, 3);
    assert!(matches!(result.errors()[1].error, EvaluationError::Conversion(_)));
}

#[test]
fn test_custom_type_through_registry() {
    let mut registry = ConverterRegistry::new();
    registry.register(
        "Iban",
        Box::new(|raw: &str| -> Result<serde_json::Value, String> {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            if compact.len() < 15 {
                return Err(format!("too short: {}", compact.len()));
            }
            Ok(serde_json::Value::String(compact))
        }) as Box<dyn ValueFactory>,
    );
    let converter = ValueConverter::with_registry(registry);

    let concepts = ResolvedConcepts::resolve(vec![
        ConceptDefinition::new("iban", TargetType::Custom("Iban".to_string()), StrategyKind::Offset)
            .with_leading_text("IBAN:")
            .with_anchor(1, 1)
            .as_detail(),
    ])
    .unwrap();
    let config = ConversionConfig::default();

    let result = TextParser::new(&concepts, &converter, &config)
        .parse_text("IBAN: GB82 WEST 1234 5698 7654 32\nIBAN: GB82");

    assert_eq!(
        result.values_for("iban"),
        vec![&TypedValue::Custom {
            type_name: "Iban".to_string(),
            value: serde_json::Value::String("GB82WEST12345698765432".to_string()),
        }]
    );
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].message().contains("too short"));
}

fn write_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_files_end_to_end() {
    let rules = write_file(
        ".yaml",
        r#"
concepts:
  - description: customer
    type: string
    strategy: between
    leading_text: "Customer ["
    trailing_text: "]"
    page: 1
    line: 1
  - description: total
    type: decimal
    strategy: offset
    leading_text: "Total:"
    page: 1
    line: 2
    detail: true
    stop_at_keyword: "End of invoice"
"#,
    );
    let conversion = write_file(
        ".json",
        r#"{"group_separator": ".", "round": 1, "empty": [{"type": "decimal", "rule": "default", "value": "0"}]}"#,
    );
    let document = write_file(
        ".txt",
        "Customer [Jane Roe] since 2019\nTotal: 1.234,5\n\x0cTotal:\nTotal: 10\nEnd of invoice\nTotal: 99\n",
    );

    let concepts = load_concepts(rules.path()).unwrap();
    let converter = ValueConverter::new();
    let config = load_conversion_config(conversion.path(), &converter).unwrap();
    let lines = read_document(document.path()).unwrap();

    let result = TextParser::new(&concepts, &converter, &config).parse(lines);

    assert_eq!(result.values_for("customer"), vec![&text("Jane Roe")]);
    // "1.234,5" keeps its comma: only the group separator is removed.
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].page, 1);
    assert_eq!(
        result.values_for("total"),
        vec![&decimal("0"), &decimal("10")]
    );
    assert_eq!(result.stop_marker(), Some(StopMarker { page: 2, line: 3 }));

    let mut buf = Vec::new();
    write_ndjson(&mut buf, &result, true).unwrap();
    let output = String::from_utf8(buf).unwrap();
    assert_eq!(output.lines().count(), 4);
    assert!(output.lines().last().unwrap().contains("\"kind\":\"error\""));
}

#[test]
fn test_demo_statement() {
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");

    let concepts = load_concepts(demos.join("statement.yaml")).unwrap();
    let converter = ValueConverter::new();
    let config = load_conversion_config(demos.join("conversion.yaml"), &converter).unwrap();
    let lines = read_document(demos.join("statement.txt")).unwrap();

    let result = TextParser::new(&concepts, &converter, &config).parse(lines);

    assert!(result.is_clean());
    assert_eq!(
        result.values_for("amount"),
        vec![&decimal("-4.50"), &decimal("2500.00"), &decimal("-1200.00")]
    );
    assert_eq!(result.by_concept().len(), 5);
}
