use super::*;
use qo_ir::PlanDef;

const JOIN_PLAN: &str = r#"
catalog:
  tables:
    - name: customers
      columns:
        - { name: id, type: int, nullable: false }
        - { name: name, type: string }
      primary_key: [id]
plan:
  op: inner-join
  left: { op: scan, table: customers }
  right:
    op: max1-row
    input: { op: values, names: [k], rows: [[1]] }
  on: [{ eq: [{ col: customers.id }, { col: k }] }]
"#;

fn built() -> BuiltPlan {
    PlanDef::parse(JOIN_PLAN).unwrap().build().unwrap()
}

#[test]
fn test_report_renders_tree() {
    let out = report(&built(), false, false);
    assert!(out.starts_with("inner-join"));
    assert!(out.contains("max1-row"));
    assert!(!out.contains("cardinality:"));
    assert!(!out.contains("Telemetry:"));
}

#[test]
fn test_report_verbose_adds_props() {
    let out = report(&built(), true, false);
    assert!(out.contains("cardinality:"));
    assert!(out.contains("not-null:"));
}

#[test]
fn test_report_telemetry_counts() {
    let out = report(&built(), false, true);
    let tail = out.split("Telemetry:\n").nth(1).unwrap();
    assert_eq!(tail, "  inner-join: 1\n  max1-row: 1\n");

    let plain = PlanDef::parse("plan:\n  op: values\n  names: [x]\n")
        .unwrap()
        .build()
        .unwrap();
    assert!(report(&plain, false, true).ends_with("Telemetry:\n  (none)\n"));
}
