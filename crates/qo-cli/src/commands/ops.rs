//! Ops command implementation

use anyhow::{bail, Context, Result};
use qo_ir::{operator_def, operator_defs, IrError, Operator, OperatorDef, Tag};
use serde::Serialize;
use std::fmt::Write;

use crate::cli::{GlobalArgs, OpsAction, OpsArgs, OpsOutput};

/// Execute the ops command
pub(crate) fn execute(args: &OpsArgs, global: &GlobalArgs) -> Result<()> {
    let out = match &args.action {
        Some(OpsAction::Show { name }) => show(name, args.output)?,
        None => {
            let defs = select_defs(args.tag.as_deref())?;
            if global.verbose {
                eprintln!("[verbose] {} of {} operators selected", defs.len(), Operator::COUNT);
            }
            list(&defs, args.output)?
        }
    };
    print!("{out}");
    Ok(())
}

/// Catalog entries, optionally restricted to operators carrying `tag`
pub(crate) fn select_defs(tag: Option<&str>) -> Result<Vec<OperatorDef>> {
    let Some(name) = tag else {
        return Ok(operator_defs());
    };
    let Some(tag) = Tag::from_name(name) else {
        let known: Vec<&str> = Tag::ALL.iter().map(|t| t.name()).collect();
        bail!("Unknown tag '{name}' (expected one of: {})", known.join(", "));
    };
    Ok(operator_defs()
        .into_iter()
        .filter(|def| def.tags.contains(tag))
        .collect())
}

/// Render a list of catalog entries
pub(crate) fn list(defs: &[OperatorDef], output: OpsOutput) -> Result<String> {
    match output {
        OpsOutput::Text => {
            let width = defs.iter().map(|d| d.name.len()).max().unwrap_or(0);
            let mut out = String::new();
            for def in defs {
                let _ = writeln!(out, "{:<width$}  {}", def.name, def.tags);
            }
            Ok(out)
        }
        _ => serialize(&defs, output),
    }
}

/// Render one operator's catalog entry
pub(crate) fn show(name: &str, output: OpsOutput) -> Result<String> {
    let op = Operator::from_name(name).ok_or_else(|| IrError::UnknownOperator {
        name: name.to_string(),
    })?;
    let def = operator_def(op);
    if output != OpsOutput::Text {
        return serialize(&def, output);
    }
    let mut out = String::new();
    let _ = writeln!(out, "{}", def.name);
    let _ = writeln!(out, "  tags: {}", def.tags);
    if def.children.is_empty() {
        let _ = writeln!(out, "  children: none");
    } else {
        let _ = writeln!(out, "  children:");
        for (i, slot) in def.children.iter().enumerate() {
            let _ = writeln!(out, "    {i}: {} ({:?})", slot.name, slot.kind);
        }
    }
    match &def.private {
        Some(private) => {
            let _ = writeln!(out, "  private: {}", private.name);
            for field in &private.fields {
                let _ = writeln!(out, "    {}: {}", field.name, field.ty);
            }
        }
        None => {
            let _ = writeln!(out, "  private: none");
        }
    }
    Ok(out)
}

fn serialize<T: Serialize + ?Sized>(value: &T, output: OpsOutput) -> Result<String> {
    match output {
        OpsOutput::Json => {
            let mut json =
                serde_json::to_string_pretty(value).context("Failed to serialize catalog")?;
            json.push('\n');
            Ok(json)
        }
        _ => serde_yaml::to_string(value).context("Failed to serialize catalog"),
    }
}

#[cfg(test)]
#[path = "ops_test.rs"]
mod tests;
