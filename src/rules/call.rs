use std::rc::Rc;

use log::warn;

use crate::error::OptResult;
use crate::operator::Operator;
use crate::plan::{PlanNode, PlanNodeIdGen, PlanNodeRef};
use crate::rules::Binding;

/// Context of one rule firing.
///
/// Holds the binding the rule fired on and a single result slot. The driver inspects the slot
/// after [`Rule::on_match`](crate::rules::Rule::on_match) returns: empty means the rule declined.
pub struct RuleCall<'a> {
    binding: Binding,
    id_gen: &'a mut PlanNodeIdGen,
    result: Option<PlanNodeRef>,
}

impl<'a> RuleCall<'a> {
    pub fn new(binding: Binding, id_gen: &'a mut PlanNodeIdGen) -> Self {
        Self {
            binding,
            id_gen,
            result: None,
        }
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Node bound to the `idx`-th pattern operand, root at 0.
    pub fn node(&self, idx: usize) -> &PlanNodeRef {
        self.binding.node(idx)
    }

    /// Builds a new validated node with a fresh id.
    pub fn new_node<O>(&mut self, operator: O, inputs: Vec<PlanNodeRef>) -> OptResult<PlanNodeRef>
    where
        O: Into<Operator>,
    {
        let node = PlanNode::try_new(self.id_gen.next(), operator.into(), inputs)?;
        Ok(Rc::new(node))
    }

    /// Proposes `replacement` for the bound root.
    ///
    /// # Panics
    ///
    /// If the replacement's fields are not type compatible with the bound root's, position by
    /// position. The driver splices the replacement in without checking it again.
    pub fn transform_to(&mut self, replacement: PlanNodeRef) {
        let original = self.binding.root().schema();
        assert!(
            original.is_compatible_with(replacement.schema()),
            "Replacement fields {} are not compatible with original fields {}",
            replacement.schema(),
            original
        );

        if self.result.is_some() {
            warn!(
                "Ignoring second replacement for {}, a rule call keeps only its first result",
                self.binding.root().operator()
            );
            return;
        }
        self.result = Some(replacement);
    }

    pub fn result(&self) -> Option<&PlanNodeRef> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<PlanNodeRef> {
        self.result
    }
}
