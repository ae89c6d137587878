use std::fmt;

use crate::operator::Operator;

/// Constraint on the inputs of a pattern operand.
#[derive(Clone, Debug)]
pub enum PatternChildren {
    /// Inputs are not inspected.
    Any,
    /// Operator must have no inputs.
    Leaf,
    /// One pattern per input, matched positionally.
    Inputs(Vec<Pattern>),
}

/// Structural pattern a rule declares over the operator tree.
///
/// A pattern is a tree of operands. Each operand tests the operator of one node and constrains
/// that node's inputs, so patterns compose to any depth:
///
/// ```
/// use rel_rewrite::operator::Operator;
/// use rel_rewrite::rules::Pattern;
///
/// // A projection directly on top of an aggregate.
/// let pattern = Pattern::with_inputs(
///     |op| matches!(op, Operator::Projection(_)),
///     vec![Pattern::new(|op| matches!(op, Operator::Aggregate(_)))],
/// );
/// assert_eq!(2, pattern.operand_count());
/// ```
#[derive(Clone)]
pub struct Pattern {
    predicate: fn(&Operator) -> bool,
    children: PatternChildren,
}

impl Pattern {
    /// Operand matching any node whose operator satisfies `predicate`, whatever its inputs.
    pub fn new(predicate: fn(&Operator) -> bool) -> Self {
        Self {
            predicate,
            children: PatternChildren::Any,
        }
    }

    pub fn leaf(predicate: fn(&Operator) -> bool) -> Self {
        Self {
            predicate,
            children: PatternChildren::Leaf,
        }
    }

    pub fn with_inputs(predicate: fn(&Operator) -> bool, inputs: Vec<Pattern>) -> Self {
        Self {
            predicate,
            children: PatternChildren::Inputs(inputs),
        }
    }

    pub fn matches_operator(&self, operator: &Operator) -> bool {
        (self.predicate)(operator)
    }

    pub fn children(&self) -> &PatternChildren {
        &self.children
    }

    /// Number of operands in this pattern tree, i.e. the number of nodes a binding holds.
    pub fn operand_count(&self) -> usize {
        1 + match &self.children {
            PatternChildren::Inputs(inputs) => inputs.iter().map(Pattern::operand_count).sum(),
            PatternChildren::Any | PatternChildren::Leaf => 0,
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
