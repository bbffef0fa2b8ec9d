//! Validating node constructor
//!
//! [`Factory`] is the only way to build a [`RelNode`]. Each constructor runs
//! the operator's contract checks, derives the node's properties and wraps it
//! in a shared [`RelRef`]. The factory borrows the compilation's
//! [`Metadata`], which it also uses to allocate ids for synthesized columns
//! and Values identities.

use crate::error::{IrError, IrResult};
use crate::operator::Operator;
use crate::private::{
    ExplainOptions, ExplainPrivate, FakeRelPrivate, GroupingPrivate, IndexJoinPrivate,
    JoinPrivate, LookupJoinPrivate, MergeJoinPrivate, RowNumberPrivate, ScanPrivate,
    SequenceSelectPrivate, SetPrivate, ShowTracePrivate, TraceType, ValuesPrivate,
    VirtualScanPrivate, ZigzagJoinPrivate,
};
use crate::props::{self, RelProps};
use crate::relop::{GroupingExpr, JoinExpr, RelExpr, RelNode, RelRef, SetExpr};
use crate::scalar::{AggregationItem, Filters, ProjectionItem, ScalarExpr, ZipItem};
use crate::validate;
use qo_core::{
    ColList, ColSet, ColumnType, Metadata, OrderingChoice, SequenceId, TableId,
};
use std::sync::Arc;

/// Builds validated plan nodes for one compilation
#[derive(Debug, Clone, Copy)]
pub struct Factory<'md> {
    md: &'md Metadata,
}

impl<'md> Factory<'md> {
    /// Create a factory over the compilation's metadata
    pub fn new(md: &'md Metadata) -> Self {
        Self { md }
    }

    /// The metadata registry
    pub fn metadata(&self) -> &'md Metadata {
        self.md
    }

    /// Validate `expr`, derive its properties and wrap it in a node
    pub fn construct(&self, expr: RelExpr) -> IrResult<RelRef> {
        validate::check(&expr, self.md)?;
        let props = props::derive(&expr, self.md)?;
        log::debug!(
            "built {} with columns {} cardinality {}",
            expr.op(),
            props.output_cols,
            props.cardinality
        );
        Ok(Arc::new(RelNode::new(expr, props)))
    }

    /// Build a replacement for `node` over new relational children, in slot
    /// order. `node` itself is untouched.
    pub fn replace_rel_children(&self, node: &RelRef, children: Vec<RelRef>) -> IrResult<RelRef> {
        let expected = node.rel_children().len();
        let expr = node.expr().with_rel_children(&children).ok_or_else(|| {
            IrError::contract(
                node.op(),
                format!("expected {expected} relational children, got {}", children.len()),
            )
        })?;
        self.construct(expr)
    }

    /// Scan with explicit private data
    pub fn scan(&self, private: ScanPrivate) -> IrResult<RelRef> {
        self.construct(RelExpr::Scan(private))
    }

    /// Unconstrained primary-index scan of every column of `table`
    pub fn scan_table(&self, table: TableId) -> IrResult<RelRef> {
        let cols = self.md.table(table)?.col_set();
        self.scan(ScanPrivate::new(table, cols))
    }

    /// Scan every column of a virtual table
    pub fn virtual_scan(&self, table: TableId) -> IrResult<RelRef> {
        let cols = self.md.table(table)?.col_set();
        self.construct(RelExpr::VirtualScan(VirtualScanPrivate { table, cols }))
    }

    /// Read a sequence's state, allocating its three output columns
    pub fn sequence_select(&self, sequence: SequenceId) -> IrResult<RelRef> {
        self.md.sequence(sequence)?;
        let cols: ColList = [
            ("last_value", ColumnType::Int),
            ("log_cnt", ColumnType::Int),
            ("is_called", ColumnType::Bool),
        ]
        .into_iter()
        .map(|(name, ty)| self.md.add_column(name, ty))
        .collect();
        self.construct(RelExpr::SequenceSelect(SequenceSelectPrivate { sequence, cols }))
    }

    /// Constant rows over `cols`, with a fresh Values identity
    pub fn values(&self, rows: Vec<Vec<ScalarExpr>>, cols: ColList) -> IrResult<RelRef> {
        let id = self.md.next_values_id();
        self.construct(RelExpr::Values {
            rows,
            private: ValuesPrivate { cols, id },
        })
    }

    /// Filter rows
    pub fn select(&self, input: RelRef, filters: Filters) -> IrResult<RelRef> {
        self.construct(RelExpr::Select { input, filters })
    }

    /// Synthesize and pass through columns
    pub fn project(
        &self,
        input: RelRef,
        projections: Vec<ProjectionItem>,
        passthrough: ColSet,
    ) -> IrResult<RelRef> {
        self.construct(RelExpr::Project {
            input,
            projections,
            passthrough,
        })
    }

    /// Any of the twelve Join-family operators
    pub fn join(
        &self,
        op: Operator,
        left: RelRef,
        right: RelRef,
        on: Filters,
        private: JoinPrivate,
    ) -> IrResult<RelRef> {
        let join = JoinExpr {
            left,
            right,
            on,
            private,
        };
        let expr = RelExpr::join(op, join)
            .ok_or_else(|| IrError::contract(op, "not a join-family operator"))?;
        self.construct(expr)
    }

    /// Inner join with default hints
    pub fn inner_join(&self, left: RelRef, right: RelRef, on: Filters) -> IrResult<RelRef> {
        self.join(Operator::InnerJoin, left, right, on, JoinPrivate::default())
    }

    /// Index join
    pub fn index_join(&self, input: RelRef, private: IndexJoinPrivate) -> IrResult<RelRef> {
        self.construct(RelExpr::IndexJoin { input, private })
    }

    /// Lookup join
    pub fn lookup_join(
        &self,
        input: RelRef,
        on: Filters,
        private: LookupJoinPrivate,
    ) -> IrResult<RelRef> {
        self.construct(RelExpr::LookupJoin { input, on, private })
    }

    /// Merge join
    pub fn merge_join(
        &self,
        left: RelRef,
        right: RelRef,
        on: Filters,
        private: MergeJoinPrivate,
    ) -> IrResult<RelRef> {
        self.construct(RelExpr::MergeJoin {
            left,
            right,
            on,
            private,
        })
    }

    /// Zigzag join
    pub fn zigzag_join(&self, on: Filters, private: ZigzagJoinPrivate) -> IrResult<RelRef> {
        self.construct(RelExpr::ZigzagJoin { on, private })
    }

    /// Any of the three grouping operators
    pub fn grouping(
        &self,
        op: Operator,
        input: RelRef,
        aggregations: Vec<AggregationItem>,
        private: GroupingPrivate,
    ) -> IrResult<RelRef> {
        let grouping = GroupingExpr {
            input,
            aggregations,
            private,
        };
        let expr = RelExpr::grouping(op, grouping)
            .ok_or_else(|| IrError::contract(op, "not a grouping operator"))?;
        self.construct(expr)
    }

    /// Group by `grouping_cols`
    pub fn group_by(
        &self,
        input: RelRef,
        aggregations: Vec<AggregationItem>,
        grouping_cols: ColSet,
    ) -> IrResult<RelRef> {
        let private = GroupingPrivate {
            grouping_cols,
            ordering: OrderingChoice::any(),
        };
        self.grouping(Operator::GroupBy, input, aggregations, private)
    }

    /// Aggregate the whole input into one row
    pub fn scalar_group_by(
        &self,
        input: RelRef,
        aggregations: Vec<AggregationItem>,
    ) -> IrResult<RelRef> {
        self.grouping(
            Operator::ScalarGroupBy,
            input,
            aggregations,
            GroupingPrivate::default(),
        )
    }

    /// Keep the first row (by `private.ordering`) of each group
    pub fn distinct_on(
        &self,
        input: RelRef,
        aggregations: Vec<AggregationItem>,
        private: GroupingPrivate,
    ) -> IrResult<RelRef> {
        self.grouping(Operator::DistinctOn, input, aggregations, private)
    }

    /// Any of the six set operators
    pub fn set_op(
        &self,
        op: Operator,
        left: RelRef,
        right: RelRef,
        private: SetPrivate,
    ) -> IrResult<RelRef> {
        let set = SetExpr {
            left,
            right,
            private,
        };
        let expr =
            RelExpr::set_op(op, set).ok_or_else(|| IrError::contract(op, "not a set operator"))?;
        self.construct(expr)
    }

    /// Set operator whose output columns are freshly allocated, named and
    /// typed after the left columns
    pub fn set_op_new_cols(
        &self,
        op: Operator,
        left: RelRef,
        right: RelRef,
        left_cols: ColList,
        right_cols: ColList,
    ) -> IrResult<RelRef> {
        let mut out_cols = ColList::new();
        for col in &left_cols {
            let meta = self.md.column(col)?;
            out_cols.push(self.md.add_column(meta.name, meta.ty));
        }
        self.set_op(
            op,
            left,
            right,
            SetPrivate {
                left_cols,
                right_cols,
                out_cols,
            },
        )
    }

    /// First `limit` rows by `ordering`
    pub fn limit(
        &self,
        input: RelRef,
        limit: ScalarExpr,
        ordering: OrderingChoice,
    ) -> IrResult<RelRef> {
        self.construct(RelExpr::Limit {
            input,
            limit,
            ordering,
        })
    }

    /// Skip `offset` rows by `ordering`
    pub fn offset(
        &self,
        input: RelRef,
        offset: ScalarExpr,
        ordering: OrderingChoice,
    ) -> IrResult<RelRef> {
        self.construct(RelExpr::Offset {
            input,
            offset,
            ordering,
        })
    }

    /// Assert at most one input row at runtime
    pub fn max1_row(&self, input: RelRef) -> IrResult<RelRef> {
        self.construct(RelExpr::Max1Row { input })
    }

    /// Number rows by `ordering`, allocating the numbering column
    pub fn row_number(&self, input: RelRef, ordering: OrderingChoice) -> IrResult<RelRef> {
        let col = self.md.add_column("row_num", ColumnType::Int);
        self.construct(RelExpr::RowNumber {
            input,
            private: RowNumberPrivate { ordering, col },
        })
    }

    /// Zip generators with each input row
    pub fn project_set(&self, input: RelRef, zip: Vec<ZipItem>) -> IrResult<RelRef> {
        self.construct(RelExpr::ProjectSet { input, zip })
    }

    /// Describe `input`, allocating the `info` output column
    pub fn explain(&self, input: RelRef, options: ExplainOptions) -> IrResult<RelRef> {
        let cols = ColList::from(vec![self.md.add_column("info", ColumnType::String)]);
        self.construct(RelExpr::Explain {
            input,
            private: ExplainPrivate { options, cols },
        })
    }

    /// Session trace, allocating its output columns
    pub fn show_trace(&self, trace_type: TraceType, compact: bool) -> IrResult<RelRef> {
        let names: &[&str] = if compact {
            &["age", "message", "tag", "operation"]
        } else {
            &[
                "timestamp",
                "age",
                "message",
                "tag",
                "location",
                "operation",
                "span",
            ]
        };
        let cols: ColList = names
            .iter()
            .map(|name| self.md.add_column(*name, ColumnType::String))
            .collect();
        self.construct(RelExpr::ShowTraceForSession(ShowTracePrivate {
            trace_type,
            compact,
            cols,
        }))
    }

    /// Node reporting `props` verbatim
    pub fn fake_rel(&self, props: RelProps) -> IrResult<RelRef> {
        self.construct(RelExpr::FakeRel(FakeRelPrivate { props }))
    }
}

#[cfg(test)]
#[path = "factory_test.rs"]
mod tests;
