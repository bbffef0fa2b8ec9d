//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use qo_core::{CatalogDef, Config, CoreError, Metadata};
use qo_ir::{BuiltPlan, Datum, PlanDef, Relation};
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main exits with the code and prints nothing.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load qo.yml from `--config` or the project directory. A project without
/// a qo.yml runs with defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    if let Some(path) = &global.config {
        return Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config: {path}"));
    }
    match Config::load_from_dir(Path::new(&global.project_dir)) {
        Ok(config) => Ok(config),
        Err(CoreError::ConfigNotFound { path }) => {
            if global.verbose {
                eprintln!("[verbose] No config at {path}, using defaults");
            }
            Ok(Config::default())
        }
        Err(e) => Err(e).context("Failed to load project config"),
    }
}

/// Load a plan file and prepend the catalogs named in the config
pub(crate) fn load_plan(path: &str, config: &Config, global: &GlobalArgs) -> Result<PlanDef> {
    let mut plan =
        PlanDef::load(Path::new(path)).with_context(|| format!("Failed to load plan: {path}"))?;
    let root = Path::new(&global.project_dir);
    let mut catalog = CatalogDef::default();
    for catalog_path in config.catalog_paths_absolute(root) {
        if global.verbose {
            eprintln!("[verbose] Loading catalog {}", catalog_path.display());
        }
        let extra = CatalogDef::load(&catalog_path)
            .with_context(|| format!("Failed to load catalog: {}", catalog_path.display()))?;
        catalog.merge(extra);
    }
    catalog.merge(std::mem::take(&mut plan.catalog));
    plan.catalog = catalog;
    Ok(plan)
}

/// Build a plan, printing the contract violation and exiting 1 on failure
pub(crate) fn build_or_exit(plan: &PlanDef, path: &str) -> Result<BuiltPlan> {
    match plan.build() {
        Ok(built) => Ok(built),
        Err(e) => {
            eprintln!("{path}: {e}");
            Err(ExitCode(1).into())
        }
    }
}

/// Column headers of a result, by qualified column name
pub(crate) fn headers(md: &Metadata, rel: &Relation) -> Vec<String> {
    rel.cols.iter().map(|c| md.column_label(c)).collect()
}

/// Display text of a value in table output
pub(crate) fn cell(value: &Datum) -> String {
    match value {
        Datum::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render rows as an aligned text table, truncated to `max_rows`
pub(crate) fn format_table(headers: &[String], rows: &[Vec<Datum>], max_rows: usize) -> String {
    let shown = &rows[..rows.len().min(max_rows)];
    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|row| row.iter().map(cell).collect())
        .collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &cells {
        for (i, c) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(c.len());
            }
        }
    }

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.as_slice()));
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.as_slice()));
        out.push('\n');
    }
    if rows.len() > shown.len() {
        out.push_str(&format!("... ({} more rows)\n", rows.len() - shown.len()));
    }
    out.push_str(&format!(
        "({} row{})\n",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    ));
    out
}

/// Render rows as a JSON array of objects keyed by header, truncated to
/// `max_rows`
pub(crate) fn format_json(
    headers: &[String],
    rows: &[Vec<Datum>],
    max_rows: usize,
) -> Result<String> {
    let objects: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .iter()
        .take(max_rows)
        .map(|row| {
            headers
                .iter()
                .cloned()
                .zip(row.iter().map(serde_json::to_value))
                .map(|(h, v)| v.map(|v| (h, v)))
                .collect::<serde_json::Result<serde_json::Map<_, _>>>()
        })
        .collect::<serde_json::Result<_>>()
        .context("Failed to serialize rows")?;
    serde_json::to_string_pretty(&objects).context("Failed to serialize rows")
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
