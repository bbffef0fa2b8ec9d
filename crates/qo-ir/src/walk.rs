//! Generic plan traversal through child slots
//!
//! These walkers never look at concrete variants; they only use
//! `child_count`/`child`, so they keep working as operators are added.

use crate::operator::Operator;
use crate::relop::RelRef;
use crate::tag::Tag;

/// Visit every node in pre-order with its depth (the root is depth 0)
pub fn visit_pre_order<F>(root: &RelRef, visit: &mut F)
where
    F: FnMut(&RelRef, usize),
{
    fn go<F: FnMut(&RelRef, usize)>(node: &RelRef, depth: usize, visit: &mut F) {
        visit(node, depth);
        for child in node.rel_children() {
            go(child, depth + 1, visit);
        }
    }
    go(root, 0, visit);
}

/// Operators of every node, in pre-order
pub fn collect_ops(root: &RelRef) -> Vec<Operator> {
    let mut ops = Vec::new();
    visit_pre_order(root, &mut |node, _| ops.push(node.op()));
    ops
}

/// Nodes carrying `tag`, in pre-order
pub fn find_tagged(root: &RelRef, tag: Tag) -> Vec<RelRef> {
    let mut found = Vec::new();
    visit_pre_order(root, &mut |node, _| {
        if node.has_tag(tag) {
            found.push(node.clone());
        }
    });
    found
}

/// Number of nodes in the plan (shared sub-trees count once per reference)
pub fn node_count(root: &RelRef) -> usize {
    let mut count = 0;
    visit_pre_order(root, &mut |_, _| count += 1);
    count
}
