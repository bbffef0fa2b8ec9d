//! Feature usage counts for Telemetry-tagged operators

use crate::relop::RelRef;
use crate::tag::Tag;
use crate::walk::visit_pre_order;
use serde::Serialize;
use std::collections::BTreeMap;

/// How often each Telemetry-tagged operator occurs in a plan, keyed by
/// operator name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureCounts(BTreeMap<&'static str, u64>);

impl FeatureCounts {
    /// Count the Telemetry-tagged operators in `plan`
    pub fn from_plan(plan: &RelRef) -> Self {
        let mut counts = FeatureCounts::default();
        visit_pre_order(plan, &mut |node, _| {
            if node.has_tag(Tag::Telemetry) {
                *counts.0.entry(node.op().name()).or_insert(0) += 1;
            }
        });
        counts
    }

    /// Count for one operator name
    pub fn get(&self, name: &str) -> u64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Whether nothing was counted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Counts in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Add another plan's counts
    pub fn merge(&mut self, other: &FeatureCounts) {
        for (name, n) in other.iter() {
            *self.0.entry(name).or_insert(0) += n;
        }
    }
}
