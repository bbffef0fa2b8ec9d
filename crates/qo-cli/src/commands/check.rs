//! Check command implementation

use anyhow::Result;
use qo_ir::{render_with, BuiltPlan, FeatureCounts, FormatOptions};
use std::fmt::Write;

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::common::{build_or_exit, load_config, load_plan};

/// Execute the check command
pub(crate) fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let plan = load_plan(&args.plan, &config, global)?;
    let built = build_or_exit(&plan, &args.plan)?;
    if global.verbose {
        eprintln!(
            "[verbose] Built {} with {} columns registered",
            args.plan,
            built.md.column_count()
        );
    }
    print!(
        "{}",
        report(&built, global.verbose, args.telemetry || config.telemetry)
    );
    Ok(())
}

/// The rendered tree, followed by telemetry counts when requested
pub(crate) fn report(built: &BuiltPlan, verbose: bool, telemetry: bool) -> String {
    let mut out = render_with(&built.root, &built.md, FormatOptions { verbose });
    if telemetry {
        let counts = FeatureCounts::from_plan(&built.root);
        out.push_str("\nTelemetry:\n");
        if counts.is_empty() {
            out.push_str("  (none)\n");
        }
        for (name, n) in counts.iter() {
            let _ = writeln!(out, "  {name}: {n}");
        }
    }
    out
}

#[cfg(test)]
#[path = "check_test.rs"]
mod tests;
