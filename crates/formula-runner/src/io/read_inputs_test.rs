use super::{load_template, load_variables, parse_inline_var, InputError};
use crate::cli::VariableArgs;
use formula_engine::{Value, ValueType, VariableResolver};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn inline_vars_infer_scalar_types() {
    assert_eq!(
        parse_inline_var("qty=12").expect("parse"),
        ("qty".to_string(), Value::Number(12.0))
    );
    assert_eq!(
        parse_inline_var("vip=true").expect("parse"),
        ("vip".to_string(), Value::Boolean(true))
    );
    assert_eq!(
        parse_inline_var("region=EU").expect("parse"),
        ("region".to_string(), Value::from("EU"))
    );
    assert_eq!(
        parse_inline_var("note=a=b").expect("parse"),
        ("note".to_string(), Value::from("a=b"))
    );
    assert_eq!(
        parse_inline_var("empty=").expect("parse"),
        ("empty".to_string(), Value::from(""))
    );
    assert!(matches!(parse_inline_var("qty"), Err(InputError::InlineVar { .. })));
    assert!(matches!(parse_inline_var("=3"), Err(InputError::InlineVar { .. })));
}

#[test]
fn load_variables_merges_file_and_inline_values() {
    let path = write_temp_file("vars.json", r#"{"base_price": 20, "quantity": 2, "tier": "gold"}"#);
    let args = VariableArgs {
        vars: Some(path),
        var: vec!["quantity=5".to_string()],
    };
    let resolver = load_variables(&args).expect("vars");
    assert_eq!(
        resolver.get_variable("quantity").expect("lookup"),
        Some(Value::Number(5.0))
    );
    assert_eq!(
        resolver.get_variable("tier").expect("lookup"),
        Some(Value::from("gold"))
    );
    assert_eq!(resolver.len(), 3);
}

#[test]
fn load_variables_rejects_nested_values() {
    let path = write_temp_file("vars-nested.yaml", "price:\n  amount: 3\n");
    let args = VariableArgs {
        vars: Some(path),
        var: Vec::new(),
    };
    let err = load_variables(&args).expect_err("must fail");
    assert!(matches!(err, InputError::Decode { .. }));
}

#[test]
fn load_template_reads_yaml_rules_and_variables() {
    let path = write_temp_file(
        "template.yaml",
        r#"
name: volume discount
variables:
  - name: quantity
    display_name: Quantity
    type: number
    default: 1
rules:
  - name: bulk
    condition: quantity >= 10
    calculation: base_price * 0.9
  - condition: "true"
    calculation: base_price
"#,
    );
    let template = load_template(path.as_path()).expect("template");
    assert_eq!(template.name.as_deref(), Some("volume discount"));
    assert_eq!(template.variables.len(), 1);
    assert_eq!(template.variables[0].value_type, ValueType::Number);
    assert_eq!(template.rules.len(), 2);
    assert_eq!(template.rules[0].name.as_deref(), Some("bulk"));
    assert_eq!(template.rules[1].condition, "true");
    assert!(template.formula.is_none());
}

#[test]
fn load_template_reports_missing_file() {
    let err = load_template(std::path::Path::new("/nonexistent/template.yaml")).expect_err("must fail");
    assert!(matches!(err, InputError::ReadFile { .. }));
}

fn write_temp_file(name: &str, content: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time must be monotonic")
        .as_nanos();
    path.push(format!("formula-runner-io-{}-{nanos}-{name}", std::process::id()));
    fs::write(&path, content).expect("must write temp file");
    path
}
