//! Eval command implementation

use anyhow::{Context, Result};
use qo_core::OutputFormat;
use qo_ir::{BuiltPlan, Evaluator};

use crate::cli::{EvalArgs, EvalOutput, GlobalArgs};
use crate::commands::common::{
    build_or_exit, format_json, format_table, headers, load_config, load_plan,
};

/// Execute the eval command
pub(crate) fn execute(args: &EvalArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let plan = load_plan(&args.plan, &config, global)?;
    let built = build_or_exit(&plan, &args.plan)?;
    let format = args.output.unwrap_or(match config.output {
        OutputFormat::Table => EvalOutput::Table,
        OutputFormat::Json => EvalOutput::Json,
    });
    let out = evaluate(&built, format, config.eval.max_rows)?;
    if global.verbose {
        eprintln!("[verbose] Evaluated {}", args.plan);
    }
    println!("{out}");
    Ok(())
}

/// Evaluate a built plan and format its rows
pub(crate) fn evaluate(built: &BuiltPlan, format: EvalOutput, max_rows: usize) -> Result<String> {
    let rel = Evaluator::new(&built.md, &built.data)
        .eval(&built.root)
        .context("Failed to evaluate plan")?;
    if rel.len() > max_rows {
        log::warn!("Showing {max_rows} of {} rows (eval.max_rows)", rel.len());
    }
    let headers = headers(&built.md, &rel);
    match format {
        EvalOutput::Table => Ok(format_table(&headers, &rel.rows, max_rows)
            .trim_end()
            .to_string()),
        EvalOutput::Json => format_json(&headers, &rel.rows, max_rows),
    }
}

#[cfg(test)]
#[path = "eval_test.rs"]
mod tests;
