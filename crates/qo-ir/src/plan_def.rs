//! YAML plan definitions.
//!
//! A plan file carries an inline catalog, optional table data and sequence
//! state, and a nested operator tree. Columns are referred to by name:
//! `table.column` for base-table columns, the bare name for synthesized
//! columns (or for table columns when unambiguous). Names resolve against
//! the columns produced by the node's inputs plus the columns bound by
//! enclosing Apply joins.
//!
//! ```yaml
//! catalog:
//!   tables:
//!     - name: t
//!       columns: [{ name: a, type: int, nullable: false }]
//!       primary_key: [a]
//! data:
//!   t: [[1], [2]]
//! plan:
//!   op: select
//!   input: { op: scan, table: t }
//!   filters: [{ gt: [{ col: t.a }, 1] }]
//! ```

use crate::error::{IrError, IrResult};
use crate::eval::{DataStore, SequenceState};
use crate::factory::Factory;
use crate::operator::Operator;
use crate::private::{
    Constraint, ExplainOptions, GroupingPrivate, IndexJoinPrivate, JoinPrivate, JoinType,
    LookupJoinPrivate, MergeJoinPrivate, ScanFlags, ScanLimit, ScanPrivate, Span, TraceType,
    ZigzagJoinPrivate,
};
use crate::relop::RelRef;
use crate::scalar::{
    AggFunc, AggregationItem, BinOp, Datum, Generator, ProjectionItem, ScalarExpr, UnOp, ZipItem,
};
use qo_core::{
    CatalogDef, ColList, ColSet, ColumnId, ColumnType, CoreError, Metadata, Ordering,
    OrderingChoice, OrderingColumn, TableMeta,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A scalar expression as written in a plan file.
///
/// Plain YAML values are constants. Everything else is a single-key map:
/// `{col: t.a}`, `{eq: [l, r]}`, `{not: x}`, `{coalesce: [..]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarDef {
    /// Column reference or operator application
    Op(Box<ScalarOpDef>),
    /// Constant
    Lit(Datum),
}

/// Operator forms of [`ScalarDef`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarOpDef {
    Col(String),
    Eq(ScalarDef, ScalarDef),
    Ne(ScalarDef, ScalarDef),
    Lt(ScalarDef, ScalarDef),
    Le(ScalarDef, ScalarDef),
    Gt(ScalarDef, ScalarDef),
    Ge(ScalarDef, ScalarDef),
    And(ScalarDef, ScalarDef),
    Or(ScalarDef, ScalarDef),
    Plus(ScalarDef, ScalarDef),
    Minus(ScalarDef, ScalarDef),
    Mul(ScalarDef, ScalarDef),
    Concat(ScalarDef, ScalarDef),
    Not(ScalarDef),
    Neg(ScalarDef),
    IsNull(ScalarDef),
    IsNotNull(ScalarDef),
    Coalesce(Vec<ScalarDef>),
}

/// A named synthesized column
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedScalarDef {
    pub name: String,
    pub expr: ScalarDef,
}

/// An aggregate of a grouping operator
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationDef {
    pub name: String,
    pub func: AggFunc,
    #[serde(default)]
    pub arg: Option<ScalarDef>,
}

/// A set-returning generator of `project-set`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorDef {
    Unnest(Vec<ScalarDef>),
    GenerateSeries(ScalarDef, ScalarDef),
    Rows(Vec<Vec<ScalarDef>>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZipDef {
    pub generator: GeneratorDef,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanDef {
    pub table: String,
    /// Index name; the primary index when absent
    #[serde(default)]
    pub index: Option<String>,
    /// Unqualified column names; every table column when absent
    #[serde(default)]
    pub cols: Option<Vec<String>>,
    /// Key spans over a prefix of the index columns
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub limit: Option<ScanLimit>,
    #[serde(default)]
    pub flags: ScanFlags,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValuesDef {
    pub names: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<ScalarDef>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDef {
    pub input: Box<NodeDef>,
    #[serde(default)]
    pub projections: Vec<NamedScalarDef>,
    #[serde(default)]
    pub passthrough: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinDef {
    pub left: Box<NodeDef>,
    pub right: Box<NodeDef>,
    #[serde(default)]
    pub on: Vec<ScalarDef>,
    #[serde(default)]
    pub private: JoinPrivate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupJoinDef {
    pub input: Box<NodeDef>,
    pub table: String,
    pub index: String,
    pub key: Vec<String>,
    #[serde(default = "default_join_type")]
    pub join_type: JoinType,
    #[serde(default)]
    pub on: Vec<ScalarDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeJoinDef {
    pub left: Box<NodeDef>,
    pub right: Box<NodeDef>,
    #[serde(default = "default_join_type")]
    pub join_type: JoinType,
    /// `+name` / `-name`
    pub left_eq: Vec<String>,
    pub right_eq: Vec<String>,
    #[serde(default)]
    pub on: Vec<ScalarDef>,
}

fn default_join_type() -> JoinType {
    JoinType::Inner
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZigzagSideDef {
    pub table: String,
    pub index: String,
    /// Values of the leading index columns
    #[serde(default)]
    pub fixed: Vec<Datum>,
    /// Equality columns, unqualified
    pub eq: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZigzagJoinDef {
    pub left: ZigzagSideDef,
    pub right: ZigzagSideDef,
    #[serde(default)]
    pub on: Vec<ScalarDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDef {
    pub input: Box<NodeDef>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub aggregations: Vec<AggregationDef>,
    #[serde(default)]
    pub ordering: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetDef {
    pub left: Box<NodeDef>,
    pub right: Box<NodeDef>,
    /// Left columns in position order; the left result order when absent
    #[serde(default)]
    pub left_cols: Option<Vec<String>>,
    #[serde(default)]
    pub right_cols: Option<Vec<String>>,
}

/// One node of a plan file, tagged by its kebab-case operator name
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", deny_unknown_fields)]
pub enum NodeDef {
    Scan(ScanDef),
    VirtualScan {
        table: String,
    },
    SequenceSelect {
        sequence: String,
    },
    Values(ValuesDef),
    Select {
        input: Box<NodeDef>,
        #[serde(default)]
        filters: Vec<ScalarDef>,
    },
    Project(ProjectDef),
    InnerJoin(JoinDef),
    LeftJoin(JoinDef),
    RightJoin(JoinDef),
    FullJoin(JoinDef),
    SemiJoin(JoinDef),
    AntiJoin(JoinDef),
    InnerJoinApply(JoinDef),
    LeftJoinApply(JoinDef),
    RightJoinApply(JoinDef),
    FullJoinApply(JoinDef),
    SemiJoinApply(JoinDef),
    AntiJoinApply(JoinDef),
    IndexJoin {
        input: Box<NodeDef>,
        table: String,
    },
    LookupJoin(LookupJoinDef),
    MergeJoin(MergeJoinDef),
    ZigzagJoin(ZigzagJoinDef),
    GroupBy(GroupDef),
    ScalarGroupBy(GroupDef),
    DistinctOn(GroupDef),
    Union(SetDef),
    Intersect(SetDef),
    Except(SetDef),
    UnionAll(SetDef),
    IntersectAll(SetDef),
    ExceptAll(SetDef),
    Limit {
        input: Box<NodeDef>,
        count: ScalarDef,
        #[serde(default)]
        ordering: Vec<String>,
    },
    Offset {
        input: Box<NodeDef>,
        count: ScalarDef,
        #[serde(default)]
        ordering: Vec<String>,
    },
    Max1Row {
        input: Box<NodeDef>,
    },
    RowNumber {
        input: Box<NodeDef>,
        #[serde(default)]
        ordering: Vec<String>,
    },
    ProjectSet {
        input: Box<NodeDef>,
        zip: Vec<ZipDef>,
    },
    Explain {
        input: Box<NodeDef>,
        #[serde(default)]
        verbose: bool,
    },
    ShowTraceForSession {
        #[serde(default)]
        kv: bool,
        #[serde(default)]
        compact: bool,
    },
}

impl NodeDef {
    fn join(&self) -> Option<(Operator, &JoinDef)> {
        let pair = match self {
            NodeDef::InnerJoin(j) => (Operator::InnerJoin, j),
            NodeDef::LeftJoin(j) => (Operator::LeftJoin, j),
            NodeDef::RightJoin(j) => (Operator::RightJoin, j),
            NodeDef::FullJoin(j) => (Operator::FullJoin, j),
            NodeDef::SemiJoin(j) => (Operator::SemiJoin, j),
            NodeDef::AntiJoin(j) => (Operator::AntiJoin, j),
            NodeDef::InnerJoinApply(j) => (Operator::InnerJoinApply, j),
            NodeDef::LeftJoinApply(j) => (Operator::LeftJoinApply, j),
            NodeDef::RightJoinApply(j) => (Operator::RightJoinApply, j),
            NodeDef::FullJoinApply(j) => (Operator::FullJoinApply, j),
            NodeDef::SemiJoinApply(j) => (Operator::SemiJoinApply, j),
            NodeDef::AntiJoinApply(j) => (Operator::AntiJoinApply, j),
            _ => return None,
        };
        Some(pair)
    }

    fn set(&self) -> Option<(Operator, &SetDef)> {
        let pair = match self {
            NodeDef::Union(s) => (Operator::Union, s),
            NodeDef::Intersect(s) => (Operator::Intersect, s),
            NodeDef::Except(s) => (Operator::Except, s),
            NodeDef::UnionAll(s) => (Operator::UnionAll, s),
            NodeDef::IntersectAll(s) => (Operator::IntersectAll, s),
            NodeDef::ExceptAll(s) => (Operator::ExceptAll, s),
            _ => return None,
        };
        Some(pair)
    }

    fn grouping(&self) -> Option<(Operator, &GroupDef)> {
        let pair = match self {
            NodeDef::GroupBy(g) => (Operator::GroupBy, g),
            NodeDef::ScalarGroupBy(g) => (Operator::ScalarGroupBy, g),
            NodeDef::DistinctOn(g) => (Operator::DistinctOn, g),
            _ => return None,
        };
        Some(pair)
    }
}

/// A parsed plan file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanDef {
    /// Tables and sequences the plan reads
    #[serde(default)]
    pub catalog: CatalogDef,
    /// Rows per table name, in table column order
    #[serde(default)]
    pub data: BTreeMap<String, Vec<Vec<Datum>>>,
    /// State per sequence name
    #[serde(default)]
    pub sequences: BTreeMap<String, SequenceState>,
    /// The operator tree
    pub plan: NodeDef,
}

/// A plan built from a [`PlanDef`], with the registry and data it refers to
#[derive(Debug)]
pub struct BuiltPlan {
    pub md: Metadata,
    pub root: RelRef,
    pub data: DataStore,
}

impl PlanDef {
    /// Load a plan file
    pub fn load(path: &Path) -> IrResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse plan YAML
    pub fn parse(content: &str) -> IrResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Register the catalog, build the operator tree and load the data
    pub fn build(&self) -> IrResult<BuiltPlan> {
        let md = Metadata::from_catalog(&self.catalog)?;
        let root = Builder {
            f: Factory::new(&md),
        }
        .node(&self.plan, &ColSet::new())?;
        let data = self.load_data(&md)?;
        Ok(BuiltPlan { md, root, data })
    }

    fn load_data(&self, md: &Metadata) -> IrResult<DataStore> {
        let mut data = DataStore::new();
        for (name, rows) in &self.data {
            let table = md.table_by_name(name)?;
            data.insert_rows(&table, rows.iter().cloned())
                .map_err(|e| IrError::PlanDef {
                    message: e.to_string(),
                })?;
        }
        for (name, state) in &self.sequences {
            let id = md.sequence_by_name(name).ok_or_else(|| IrError::PlanDef {
                message: format!("unknown sequence '{name}'"),
            })?;
            data.set_sequence(id, *state);
        }
        Ok(data)
    }
}

struct Builder<'md> {
    f: Factory<'md>,
}

impl<'md> Builder<'md> {
    fn md(&self) -> &'md Metadata {
        self.f.metadata()
    }

    fn resolve(&self, name: &str, visible: &ColSet) -> IrResult<ColumnId> {
        let md = self.md();
        let qualified = name.contains('.');
        let mut found = None;
        for c in visible {
            let Ok(meta) = md.column(c) else { continue };
            let hit = if qualified {
                meta.qualified_name(md).eq_ignore_ascii_case(name)
            } else {
                meta.name.eq_ignore_ascii_case(name)
            };
            if hit {
                if found.is_some() {
                    return Err(IrError::AmbiguousColumnName {
                        name: name.to_string(),
                    });
                }
                found = Some(c);
            }
        }
        found.ok_or_else(|| IrError::UnknownColumnName {
            name: name.to_string(),
        })
    }

    fn resolve_list(&self, names: &[String], visible: &ColSet) -> IrResult<ColList> {
        names.iter().map(|n| self.resolve(n, visible)).collect()
    }

    /// `+name` / `-name` / `name`
    fn ordering(&self, specs: &[String], visible: &ColSet) -> IrResult<Ordering> {
        specs
            .iter()
            .map(|spec| -> IrResult<OrderingColumn> {
                let (descending, name) = match spec.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, spec.strip_prefix('+').unwrap_or(spec)),
                };
                let col = self.resolve(name, visible)?;
                Ok(if descending {
                    OrderingColumn::desc(col)
                } else {
                    OrderingColumn::asc(col)
                })
            })
            .collect()
    }

    fn ordering_choice(&self, specs: &[String], visible: &ColSet) -> IrResult<OrderingChoice> {
        Ok(OrderingChoice::from_ordering(&self.ordering(specs, visible)?))
    }

    fn scalar(&self, def: &ScalarDef, visible: &ColSet) -> IrResult<ScalarExpr> {
        let op = match def {
            ScalarDef::Lit(d) => return Ok(ScalarExpr::Const(d.clone())),
            ScalarDef::Op(op) => op.as_ref(),
        };
        let binary = |bin: BinOp, l: &ScalarDef, r: &ScalarDef| -> IrResult<ScalarExpr> {
            Ok(ScalarExpr::binary(
                bin,
                self.scalar(l, visible)?,
                self.scalar(r, visible)?,
            ))
        };
        let boxed = |e: &ScalarDef| -> IrResult<Box<ScalarExpr>> {
            Ok(Box::new(self.scalar(e, visible)?))
        };
        match op {
            ScalarOpDef::Col(name) => Ok(ScalarExpr::col(self.resolve(name, visible)?)),
            ScalarOpDef::Eq(l, r) => binary(BinOp::Eq, l, r),
            ScalarOpDef::Ne(l, r) => binary(BinOp::NotEq, l, r),
            ScalarOpDef::Lt(l, r) => binary(BinOp::Lt, l, r),
            ScalarOpDef::Le(l, r) => binary(BinOp::LtEq, l, r),
            ScalarOpDef::Gt(l, r) => binary(BinOp::Gt, l, r),
            ScalarOpDef::Ge(l, r) => binary(BinOp::GtEq, l, r),
            ScalarOpDef::And(l, r) => binary(BinOp::And, l, r),
            ScalarOpDef::Or(l, r) => binary(BinOp::Or, l, r),
            ScalarOpDef::Plus(l, r) => binary(BinOp::Plus, l, r),
            ScalarOpDef::Minus(l, r) => binary(BinOp::Minus, l, r),
            ScalarOpDef::Mul(l, r) => binary(BinOp::Multiply, l, r),
            ScalarOpDef::Concat(l, r) => binary(BinOp::Concat, l, r),
            ScalarOpDef::Not(e) => Ok(ScalarExpr::Unary {
                op: UnOp::Not,
                input: boxed(e)?,
            }),
            ScalarOpDef::Neg(e) => Ok(ScalarExpr::Unary {
                op: UnOp::Minus,
                input: boxed(e)?,
            }),
            ScalarOpDef::IsNull(e) => Ok(ScalarExpr::IsNull {
                input: boxed(e)?,
                negated: false,
            }),
            ScalarOpDef::IsNotNull(e) => Ok(ScalarExpr::IsNull {
                input: boxed(e)?,
                negated: true,
            }),
            ScalarOpDef::Coalesce(args) => Ok(ScalarExpr::Coalesce(
                args.iter()
                    .map(|a| self.scalar(a, visible))
                    .collect::<IrResult<_>>()?,
            )),
        }
    }

    fn scalars(&self, defs: &[ScalarDef], visible: &ColSet) -> IrResult<Vec<ScalarExpr>> {
        defs.iter().map(|d| self.scalar(d, visible)).collect()
    }

    fn table(&self, name: &str) -> IrResult<std::sync::Arc<TableMeta>> {
        Ok(self.md().table_by_name(name)?)
    }

    fn index(&self, table: &TableMeta, name: &str) -> IrResult<qo_core::IndexOrdinal> {
        table
            .index_by_name(name)
            .ok_or_else(|| IrError::UnknownIndexName {
                table: table.name.clone(),
                index: name.to_string(),
            })
    }

    /// Build `def`. `outer` holds the columns bound by enclosing Apply joins.
    fn node(&self, def: &NodeDef, outer: &ColSet) -> IrResult<RelRef> {
        let f = &self.f;
        let md = self.md();
        // Columns visible to scalars over a single input
        let over = |input: &RelRef| input.output_cols().union(outer);

        if let Some((op, j)) = def.join() {
            let left = self.node(&j.left, outer)?;
            let right_outer = if op.has_tag(crate::tag::Tag::JoinApply) {
                outer.union(left.output_cols())
            } else {
                outer.clone()
            };
            let right = self.node(&j.right, &right_outer)?;
            let visible = over(&left).union(right.output_cols());
            let on = self.scalars(&j.on, &visible)?;
            return f.join(op, left, right, on, j.private);
        }
        if let Some((op, s)) = def.set() {
            let left = self.node(&s.left, outer)?;
            let right = self.node(&s.right, outer)?;
            let cols = |names: &Option<Vec<String>>, input: &RelRef| match names {
                Some(names) => self.resolve_list(names, input.output_cols()),
                None => Ok(crate::eval::result_cols(input)),
            };
            let left_cols = cols(&s.left_cols, &left)?;
            let right_cols = cols(&s.right_cols, &right)?;
            return f.set_op_new_cols(op, left, right, left_cols, right_cols);
        }
        if let Some((op, g)) = def.grouping() {
            let input = self.node(&g.input, outer)?;
            let visible = over(&input);
            let grouping_cols = self.resolve_list(&g.group_by, input.output_cols())?.to_set();
            let ordering = self.ordering_choice(&g.ordering, input.output_cols())?;
            let aggregations = g
                .aggregations
                .iter()
                .map(|a| -> IrResult<AggregationItem> {
                    let arg = a
                        .arg
                        .as_ref()
                        .map(|e| self.scalar(e, &visible))
                        .transpose()?;
                    let arg_ty = arg.as_ref().map(|e| e.result_type(md)).unwrap_or_default();
                    Ok(AggregationItem {
                        col: md.add_column(a.name.clone(), a.func.result_type(arg_ty)),
                        func: a.func,
                        arg,
                    })
                })
                .collect::<IrResult<Vec<_>>>()?;
            let private = GroupingPrivate {
                grouping_cols,
                ordering,
            };
            return f.grouping(op, input, aggregations, private);
        }

        match def {
            NodeDef::Scan(s) => self.scan(s),
            NodeDef::VirtualScan { table } => f.virtual_scan(self.table(table)?.id),
            NodeDef::SequenceSelect { sequence } => {
                let id = md
                    .sequence_by_name(sequence)
                    .ok_or_else(|| IrError::PlanDef {
                        message: format!("unknown sequence '{sequence}'"),
                    })?;
                f.sequence_select(id)
            }
            NodeDef::Values(v) => {
                let rows = v
                    .rows
                    .iter()
                    .map(|row| self.scalars(row, outer))
                    .collect::<IrResult<Vec<_>>>()?;
                let cols = v
                    .names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let ty = rows
                            .iter()
                            .filter_map(|r| r.get(i))
                            .map(|e| e.result_type(md))
                            .find(|t| *t != ColumnType::Unknown)
                            .unwrap_or_default();
                        md.add_column(name.clone(), ty)
                    })
                    .collect();
                f.values(rows, cols)
            }
            NodeDef::Select { input, filters } => {
                let input = self.node(input, outer)?;
                let filters = self.scalars(filters, &over(&input))?;
                f.select(input, filters)
            }
            NodeDef::Project(p) => {
                let input = self.node(&p.input, outer)?;
                let visible = over(&input);
                let passthrough = self.resolve_list(&p.passthrough, input.output_cols())?.to_set();
                let projections = p
                    .projections
                    .iter()
                    .map(|item| -> IrResult<ProjectionItem> {
                        let expr = self.scalar(&item.expr, &visible)?;
                        let col = md.add_column(item.name.clone(), expr.result_type(md));
                        Ok(ProjectionItem { col, expr })
                    })
                    .collect::<IrResult<Vec<_>>>()?;
                f.project(input, projections, passthrough)
            }
            NodeDef::IndexJoin { input, table } => {
                let input = self.node(input, outer)?;
                let table = self.table(table)?;
                f.index_join(
                    input,
                    IndexJoinPrivate {
                        table: table.id,
                        cols: table.col_set(),
                    },
                )
            }
            NodeDef::LookupJoin(l) => {
                let input = self.node(&l.input, outer)?;
                let table = self.table(&l.table)?;
                let index = self.index(&table, &l.index)?;
                let key_cols = self.resolve_list(&l.key, input.output_cols())?;
                let cols = input.output_cols().union(&table.col_set());
                let on = self.scalars(&l.on, &cols.union(outer))?;
                f.lookup_join(
                    input,
                    on,
                    LookupJoinPrivate {
                        join_type: l.join_type,
                        table: table.id,
                        index,
                        key_cols,
                        cols,
                    },
                )
            }
            NodeDef::MergeJoin(m) => {
                let left = self.node(&m.left, outer)?;
                let right = self.node(&m.right, outer)?;
                let left_eq = self.ordering(&m.left_eq, left.output_cols())?;
                let right_eq = self.ordering(&m.right_eq, right.output_cols())?;
                let visible = over(&left).union(right.output_cols());
                let on = self.scalars(&m.on, &visible)?;
                let private = MergeJoinPrivate {
                    join_type: m.join_type,
                    left_ordering: OrderingChoice::from_ordering(&left_eq),
                    right_ordering: OrderingChoice::from_ordering(&right_eq),
                    left_eq,
                    right_eq,
                };
                f.merge_join(left, right, on, private)
            }
            NodeDef::ZigzagJoin(z) => self.zigzag(z, outer),
            NodeDef::Limit {
                input,
                count,
                ordering,
            } => {
                let input = self.node(input, outer)?;
                let count = self.scalar(count, outer)?;
                let ordering = self.ordering_choice(ordering, input.output_cols())?;
                f.limit(input, count, ordering)
            }
            NodeDef::Offset {
                input,
                count,
                ordering,
            } => {
                let input = self.node(input, outer)?;
                let count = self.scalar(count, outer)?;
                let ordering = self.ordering_choice(ordering, input.output_cols())?;
                f.offset(input, count, ordering)
            }
            NodeDef::Max1Row { input } => f.max1_row(self.node(input, outer)?),
            NodeDef::RowNumber { input, ordering } => {
                let input = self.node(input, outer)?;
                let ordering = self.ordering_choice(ordering, input.output_cols())?;
                f.row_number(input, ordering)
            }
            NodeDef::ProjectSet { input, zip } => {
                let input = self.node(input, outer)?;
                let visible = over(&input);
                let zip = zip
                    .iter()
                    .map(|z| self.zip_item(z, &visible))
                    .collect::<IrResult<Vec<_>>>()?;
                f.project_set(input, zip)
            }
            NodeDef::Explain { input, verbose } => {
                let input = self.node(input, outer)?;
                f.explain(
                    input,
                    ExplainOptions {
                        verbose: *verbose,
                        types: false,
                    },
                )
            }
            NodeDef::ShowTraceForSession { kv, compact } => {
                let trace_type = if *kv { TraceType::Kv } else { TraceType::Trace };
                f.show_trace(trace_type, *compact)
            }
            other => Err(IrError::PlanDef {
                message: format!("unhandled plan node {other:?}"),
            }),
        }
    }

    fn scan(&self, s: &ScanDef) -> IrResult<RelRef> {
        let table = self.table(&s.table)?;
        let cols = match &s.cols {
            Some(names) => self.resolve_list(names, &table.col_set())?.to_set(),
            None => table.col_set(),
        };
        let mut private = ScanPrivate::new(table.id, cols);
        if let Some(name) = &s.index {
            private.index = self.index(&table, name)?;
        }
        if !s.spans.is_empty() {
            let width = s
                .spans
                .iter()
                .map(|sp| sp.start.len().max(sp.end.len()))
                .max()
                .unwrap_or(0);
            let key = &table.index(private.index)?.key;
            private.constraint = Some(Constraint {
                columns: key.iter().take(width).cloned().collect(),
                spans: s.spans.clone(),
            });
        }
        private.hard_limit = s.limit;
        private.flags = s.flags;
        self.f.scan(private)
    }

    fn zigzag(&self, z: &ZigzagJoinDef, outer: &ColSet) -> IrResult<RelRef> {
        let side = |d: &ZigzagSideDef| -> IrResult<_> {
            let table = self.table(&d.table)?;
            let index = self.index(&table, &d.index)?;
            let fixed_cols: ColList = table
                .index(index)?
                .key
                .iter()
                .take(d.fixed.len())
                .map(|c| c.col)
                .collect();
            let eq_cols = self.resolve_list(&d.eq, &table.col_set())?;
            Ok((table, index, fixed_cols, eq_cols))
        };
        let (lt, li, lfixed, leq) = side(&z.left)?;
        let (rt, ri, rfixed, req) = side(&z.right)?;
        let cols = lt.col_set().union(&rt.col_set());
        let on = self.scalars(&z.on, &cols.union(outer))?;
        self.f.zigzag_join(
            on,
            ZigzagJoinPrivate {
                left_table: lt.id,
                left_index: li,
                right_table: rt.id,
                right_index: ri,
                left_eq_cols: leq,
                right_eq_cols: req,
                left_fixed_cols: lfixed,
                right_fixed_cols: rfixed,
                left_fixed_vals: z.left.fixed.clone(),
                right_fixed_vals: z.right.fixed.clone(),
                cols,
            },
        )
    }

    fn zip_item(&self, z: &ZipDef, visible: &ColSet) -> IrResult<ZipItem> {
        let md = self.md();
        let func = match &z.generator {
            GeneratorDef::Unnest(items) => Generator::Unnest(self.scalars(items, visible)?),
            GeneratorDef::GenerateSeries(start, stop) => Generator::GenerateSeries {
                start: self.scalar(start, visible)?,
                stop: self.scalar(stop, visible)?,
            },
            GeneratorDef::Rows(rows) => Generator::Rows(
                rows.iter()
                    .map(|r| self.scalars(r, visible))
                    .collect::<IrResult<_>>()?,
            ),
        };
        let ty = match &func {
            Generator::GenerateSeries { .. } => ColumnType::Int,
            _ => ColumnType::Unknown,
        };
        let cols = z.names.iter().map(|n| md.add_column(n.clone(), ty)).collect();
        Ok(ZipItem { func, cols })
    }
}

#[cfg(test)]
#[path = "plan_def_test.rs"]
mod tests;
