//! Plan tree rendering
//!
//! Renders a plan as an indented box-drawing tree:
//!
//! ```text
//! select
//!  ├── columns: t.a:1 t.b:2
//!  ├── scan t
//!  │    └── columns: t.a:1 t.b:2
//!  └── filters
//!       └── (@1 = 3)
//! ```

use crate::catalog::operator_def;
use crate::private::{ScanPrivate, ZigzagJoinPrivate};
use crate::relop::{Child, RelExpr, RelNode};
use crate::scalar::{AggregationItem, Generator, ScalarExpr};
use qo_core::{ColList, ColSet, Metadata, OrderingChoice};
use std::fmt::Write;

/// Rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Include cardinality, outer and not-null columns
    pub verbose: bool,
}

struct Item {
    text: String,
    children: Vec<Item>,
}

impl Item {
    fn leaf(text: impl Into<String>) -> Self {
        Item {
            text: text.into(),
            children: Vec::new(),
        }
    }
}

/// Render `node` with default options
pub fn render(node: &RelNode, md: &Metadata) -> String {
    render_with(node, md, FormatOptions::default())
}

/// Render `node`
pub fn render_with(node: &RelNode, md: &Metadata, options: FormatOptions) -> String {
    let item = node_item(node, md, options);
    let mut out = String::new();
    out.push_str(&item.text);
    out.push('\n');
    write_children(&mut out, &item.children, "");
    out
}

fn write_children(out: &mut String, children: &[Item], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (branch, cont) = if last {
            (" └── ", "     ")
        } else {
            (" ├── ", " │   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{}", child.text);
        write_children(out, &child.children, &format!("{prefix}{cont}"));
    }
}

/// `name:id` labels of a column list
pub fn col_list_labels(md: &Metadata, cols: &ColList) -> String {
    labels(md, cols.iter())
}

/// `name:id` labels of a column set
pub fn col_set_labels(md: &Metadata, cols: &ColSet) -> String {
    labels(md, cols.iter())
}

fn labels(md: &Metadata, cols: impl Iterator<Item = qo_core::ColumnId>) -> String {
    cols.map(|c| format!("{}:{}", md.column_label(c), c.get()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn table_name(md: &Metadata, table: qo_core::TableId) -> String {
    md.table(table)
        .map(|t| t.name.clone())
        .unwrap_or_else(|_| table.to_string())
}

fn index_name(md: &Metadata, table: qo_core::TableId, index: qo_core::IndexOrdinal) -> String {
    let name = md
        .table(table)
        .ok()
        .and_then(|t| t.index(index).ok().map(|i| i.name.clone()))
        .unwrap_or_else(|| index.to_string());
    format!("{}@{}", table_name(md, table), name)
}

fn scan_header(md: &Metadata, p: &ScanPrivate) -> String {
    if p.index.is_primary() {
        format!("scan {}", table_name(md, p.table))
    } else {
        format!("scan {}", index_name(md, p.table, p.index))
    }
}

fn scan_attrs(p: &ScanPrivate, attrs: &mut Vec<Item>) {
    if let Some(c) = &p.constraint {
        let spans: Vec<String> = c
            .spans
            .iter()
            .map(|s| {
                let key = |k: &[crate::scalar::Datum]| {
                    k.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("/")
                };
                format!(
                    "{}{} - {}{}",
                    if s.start_inclusive { "[" } else { "(" },
                    key(&s.start),
                    key(&s.end),
                    if s.end_inclusive { "]" } else { ")" },
                )
            })
            .collect();
        attrs.push(Item::leaf(format!(
            "constraint: {}: {}",
            c.columns,
            spans.join(" ")
        )));
    }
    if let Some(limit) = p.hard_limit {
        let rev = if limit.reverse { "(rev)" } else { "" };
        attrs.push(Item::leaf(format!("limit: {}{rev}", limit.rows)));
    }
    if p.flags.force_index {
        attrs.push(Item::leaf("flags: force-index"));
    }
    if p.flags.no_index_join {
        attrs.push(Item::leaf("flags: no-index-join"));
    }
}

fn ordering_attr(label: &str, ordering: &OrderingChoice, attrs: &mut Vec<Item>) {
    if !ordering.is_any() {
        attrs.push(Item::leaf(format!("{label}: {ordering}")));
    }
}

fn zigzag_attrs(md: &Metadata, p: &ZigzagJoinPrivate, attrs: &mut Vec<Item>) {
    attrs.push(Item::leaf(format!(
        "left: {} eq {} fixed {} = {:?}",
        index_name(md, p.left_table, p.left_index),
        p.left_eq_cols,
        p.left_fixed_cols,
        p.left_fixed_vals.iter().map(|d| d.to_string()).collect::<Vec<_>>()
    )));
    attrs.push(Item::leaf(format!(
        "right: {} eq {} fixed {} = {:?}",
        index_name(md, p.right_table, p.right_index),
        p.right_eq_cols,
        p.right_fixed_cols,
        p.right_fixed_vals.iter().map(|d| d.to_string()).collect::<Vec<_>>()
    )));
}

fn header_and_attrs(node: &RelNode, md: &Metadata) -> (String, Vec<Item>) {
    let op = node.op();
    let mut attrs = Vec::new();
    let header = match node.expr() {
        RelExpr::Scan(p) => {
            scan_attrs(p, &mut attrs);
            scan_header(md, p)
        }
        RelExpr::VirtualScan(p) => format!("{op} {}", table_name(md, p.table)),
        RelExpr::SequenceSelect(p) => {
            let name = md
                .sequence(p.sequence)
                .map(|s| s.name)
                .unwrap_or_else(|_| p.sequence.to_string());
            format!("{op} {name}")
        }
        RelExpr::IndexJoin { private, .. } => format!("{op} {}", table_name(md, private.table)),
        RelExpr::LookupJoin { private, .. } => {
            attrs.push(Item::leaf(format!("type: {}", private.join_type)));
            attrs.push(Item::leaf(format!("key columns: {}", private.key_cols)));
            format!("{op} {}", index_name(md, private.table, private.index))
        }
        RelExpr::MergeJoin { private, .. } => {
            attrs.push(Item::leaf(format!("type: {}", private.join_type)));
            attrs.push(Item::leaf(format!(
                "equality: {} = {}",
                private.left_eq, private.right_eq
            )));
            ordering_attr("left ordering", &private.left_ordering, &mut attrs);
            ordering_attr("right ordering", &private.right_ordering, &mut attrs);
            op.to_string()
        }
        RelExpr::ZigzagJoin { private, .. } => {
            zigzag_attrs(md, private, &mut attrs);
            op.to_string()
        }
        RelExpr::Limit { ordering, .. } | RelExpr::Offset { ordering, .. } => {
            ordering_attr("internal-ordering", ordering, &mut attrs);
            op.to_string()
        }
        RelExpr::RowNumber { private, .. } => {
            attrs.push(Item::leaf(format!(
                "row number: {}",
                col_set_labels(md, &ColSet::single(private.col))
            )));
            ordering_attr("ordering", &private.ordering, &mut attrs);
            op.to_string()
        }
        RelExpr::Explain { private, .. } => {
            if private.options.verbose {
                attrs.push(Item::leaf("mode: verbose"));
            }
            op.to_string()
        }
        RelExpr::ShowTraceForSession(p) => {
            let compact = if p.compact { " compact" } else { "" };
            attrs.push(Item::leaf(format!("trace: {:?}{compact}", p.trace_type).to_lowercase()));
            op.to_string()
        }
        expr => {
            if let Some(j) = expr.as_join() {
                let flags = j.private.flags;
                let names = [
                    (flags.disallow_hash_join, "disallow-hash-join"),
                    (flags.disallow_merge_join, "disallow-merge-join"),
                    (flags.disallow_lookup_join, "disallow-lookup-join"),
                ];
                for (set, name) in names {
                    if set {
                        attrs.push(Item::leaf(format!("flags: {name}")));
                    }
                }
            } else if let Some(g) = expr.as_grouping() {
                if !g.private.grouping_cols.is_empty() {
                    attrs.push(Item::leaf(format!(
                        "grouping columns: {}",
                        col_set_labels(md, &g.private.grouping_cols)
                    )));
                }
                ordering_attr("internal-ordering", &g.private.ordering, &mut attrs);
            } else if let Some(s) = expr.as_set() {
                attrs.push(Item::leaf(format!(
                    "left columns: {}",
                    col_list_labels(md, &s.private.left_cols)
                )));
                attrs.push(Item::leaf(format!(
                    "right columns: {}",
                    col_list_labels(md, &s.private.right_cols)
                )));
            }
            op.to_string()
        }
    };
    (header, attrs)
}

fn agg_text(agg: &AggregationItem) -> String {
    let arg = agg.arg.as_ref().map(|a| a.to_string()).unwrap_or_default();
    format!("{} := {}({arg})", agg.col, agg.func.name())
}

fn generator_text(g: &Generator) -> String {
    let join = |items: &[ScalarExpr]| {
        items
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    match g {
        Generator::Unnest(items) => format!("unnest({})", join(items)),
        Generator::GenerateSeries { start, stop } => format!("generate_series({start}, {stop})"),
        Generator::Rows(rows) => {
            let rows: Vec<String> = rows.iter().map(|r| format!("({})", join(r))).collect();
            format!("rows({})", rows.join(", "))
        }
    }
}

fn node_item(node: &RelNode, md: &Metadata, options: FormatOptions) -> Item {
    let (text, mut children) = header_and_attrs(node, md);
    let props = node.props();
    let columns = match &props.output_list {
        Some(list) => col_list_labels(md, list),
        None => col_set_labels(md, &props.output_cols),
    };
    children.insert(0, Item::leaf(format!("columns: {columns}")));
    if options.verbose {
        children.push(Item::leaf(format!("cardinality: {}", props.cardinality)));
        if !props.outer_cols.is_empty() {
            children.push(Item::leaf(format!("outer: {}", props.outer_cols)));
        }
        if !props.not_null_cols.is_empty() {
            children.push(Item::leaf(format!("not-null: {}", props.not_null_cols)));
        }
    }

    let def = operator_def(node.op());
    for (i, child) in node.expr().children().enumerate() {
        let slot = def.children.get(i).map(|s| s.name).unwrap_or("child");
        let item = match child {
            Child::Rel(rel) => node_item(rel, md, options),
            Child::Filters(filters) if filters.is_empty() => Item::leaf(format!("{slot} (true)")),
            Child::Filters(filters) => Item {
                text: slot.to_string(),
                children: filters.iter().map(|f| Item::leaf(f.to_string())).collect(),
            },
            Child::Scalar(s) => Item::leaf(format!("{slot}: {s}")),
            Child::Rows(rows) => Item {
                text: slot.to_string(),
                children: rows
                    .iter()
                    .map(|r| {
                        let vals: Vec<String> = r.iter().map(|v| v.to_string()).collect();
                        Item::leaf(format!("({})", vals.join(", ")))
                    })
                    .collect(),
            },
            Child::Projections(items) => Item {
                text: slot.to_string(),
                children: items
                    .iter()
                    .map(|p| Item::leaf(format!("{} := {}", p.col, p.expr)))
                    .collect(),
            },
            Child::Aggregations(items) => Item {
                text: slot.to_string(),
                children: items.iter().map(|a| Item::leaf(agg_text(a))).collect(),
            },
            Child::Zip(items) => Item {
                text: slot.to_string(),
                children: items
                    .iter()
                    .map(|z| Item::leaf(format!("{} := {}", z.cols, generator_text(&z.func))))
                    .collect(),
            },
        };
        let empty_list = matches!(
            child,
            Child::Projections([]) | Child::Aggregations([]) | Child::Zip([])
        );
        if !empty_list {
            children.push(item);
        }
    }
    Item { text, children }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_render_select_over_scan() {
        let fx = Fixture::new();
        let f = fx.factory();
        let a = fx.col("t.a");
        let plan = f.select(fx.scan("t"), vec![eq(col(a), lit(3))]).unwrap();
        let text = render(&plan, &fx.md);
        let expected = "\
select
 ├── columns: t.a:1 t.b:2 t.c:3
 ├── scan t
 │    └── columns: t.a:1 t.b:2 t.c:3
 └── filters
      └── (@1 = 3)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_verbose_values() {
        let fx = Fixture::new();
        let f = fx.factory();
        let (values, _) = int_values(&f, &[1, 2]);
        let text = render_with(&values, &fx.md, FormatOptions { verbose: true });
        assert!(text.starts_with("values\n"));
        assert!(text.contains("cardinality: [2 - 2]"));
        assert!(text.contains("not-null:"));
        assert!(text.contains(" └── rows\n"));
        assert!(text.contains("(1)"));
    }

    #[test]
    fn test_render_empty_filters_as_true() {
        let fx = Fixture::new();
        let f = fx.factory();
        let join = f.inner_join(fx.scan("t"), fx.scan("u"), vec![]).unwrap();
        let text = render(&join, &fx.md);
        assert!(text.contains("on (true)"));
        assert_eq!(text.matches("scan ").count(), 2);
    }
}
