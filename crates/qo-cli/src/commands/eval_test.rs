use super::*;
use crate::commands::common::ExitCode;
use qo_ir::PlanDef;
use std::fs;

const PLAN: &str = r#"
catalog:
  tables:
    - name: orders
      columns:
        - { name: id, type: int, nullable: false }
        - { name: total, type: int }
      primary_key: [id]
data:
  orders: [[1, 5], [2, 7], [3, 1]]
plan:
  op: select
  input: { op: scan, table: orders }
  filters: [{ gt: [{ col: orders.total }, 4] }]
"#;

#[test]
fn test_evaluate_table() {
    let built = PlanDef::parse(PLAN).unwrap().build().unwrap();
    let out = evaluate(&built, EvalOutput::Table, 100).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "orders.id  orders.total");
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[4], "(2 rows)");
}

#[test]
fn test_evaluate_json() {
    let built = PlanDef::parse(PLAN).unwrap().build().unwrap();
    let out = evaluate(&built, EvalOutput::Json, 100).unwrap();
    let mut rows: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    rows.sort_by_key(|r| r["orders.id"].as_i64());
    assert_eq!(
        rows,
        vec![
            serde_json::json!({ "orders.id": 1, "orders.total": 5 }),
            serde_json::json!({ "orders.id": 2, "orders.total": 7 }),
        ]
    );
}

#[test]
fn test_evaluate_missing_data_is_an_error() {
    let text = PLAN.replace("data:\n  orders: [[1, 5], [2, 7], [3, 1]]\n", "");
    let built = PlanDef::parse(&text).unwrap().build().unwrap();
    let err = evaluate(&built, EvalOutput::Table, 100).unwrap_err();
    assert!(err.to_string().contains("Failed to evaluate plan"));
}

#[test]
fn test_execute_plan_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("qo.yml"), "name: demo\noutput: json\n").unwrap();
    let plan = dir.path().join("plan.yml");
    fs::write(&plan, PLAN).unwrap();
    let global = GlobalArgs {
        verbose: false,
        project_dir: dir.path().display().to_string(),
        config: None,
    };
    let args = EvalArgs {
        plan: plan.display().to_string(),
        output: None,
    };
    execute(&args, &global).unwrap();

    // A plan that breaks an operator contract exits 1.
    fs::write(
        &plan,
        "plan:\n  op: limit\n  input: { op: values, names: [x] }\n  count: -1\n",
    )
    .unwrap();
    let err = execute(&args, &global).unwrap_err();
    assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(1));
}
