use log::trace;

use crate::plan::{Plan, PlanNodeRef};
use crate::rules::{Pattern, PatternChildren, Rule, RuleImpl};

/// Nodes bound to the operands of a pattern, in pre-order (root first).
///
/// A binding is a read-only view: it holds shared references to existing nodes and never changes
/// them.
#[derive(Clone, Debug)]
pub struct Binding {
    nodes: Vec<PlanNodeRef>,
}

impl Binding {
    /// Binds `pattern` to the subtree rooted at `node`.
    pub fn bind(node: &PlanNodeRef, pattern: &Pattern) -> Option<Binding> {
        let mut nodes = Vec::with_capacity(pattern.operand_count());
        if bind_operand(node, pattern, &mut nodes) {
            Some(Binding { nodes })
        } else {
            None
        }
    }

    pub fn root(&self) -> &PlanNodeRef {
        &self.nodes[0]
    }

    /// Node bound to the `idx`-th operand in pre-order.
    pub fn node(&self, idx: usize) -> &PlanNodeRef {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[PlanNodeRef] {
        &self.nodes
    }
}

fn bind_operand(node: &PlanNodeRef, pattern: &Pattern, nodes: &mut Vec<PlanNodeRef>) -> bool {
    if !pattern.matches_operator(node.operator()) {
        return false;
    }
    nodes.push(node.clone());

    match pattern.children() {
        PatternChildren::Any => true,
        PatternChildren::Leaf => node.inputs().is_empty(),
        PatternChildren::Inputs(children) => {
            children.len() == node.inputs().len()
                && node
                    .inputs()
                    .iter()
                    .zip(children.iter())
                    .all(|(input, child)| bind_operand(input, child, nodes))
        }
    }
}

/// Finds every place in `plan` where one of `rules` binds.
///
/// Nodes are visited in breadth first order from the root, and rules in the order given, so the
/// result is deterministic for a given plan.
pub fn find_bindings<'a>(plan: &Plan, rules: &'a [RuleImpl]) -> Vec<(&'a RuleImpl, Binding)> {
    let mut bindings = vec![];
    for node in plan.bfs_iterator() {
        for rule in rules {
            match Binding::bind(&node, rule.pattern()) {
                Some(binding) => bindings.push((rule, binding)),
                None => trace!("Rule {} does not bind to {}", rule.name(), node.operator()),
            }
        }
    }
    bindings
}
