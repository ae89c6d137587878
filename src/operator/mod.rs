//! Relational operators.
//!
//! An [`Operator`] only carries its own arguments. Inputs are held by the enclosing
//! [`PlanNode`](crate::plan::PlanNode), which validates the operator against the schemas of its
//! inputs when it is built.

use std::fmt;

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;

use crate::error::OptResult;
use crate::properties::Schema;

mod aggregate;
pub use aggregate::*;
mod filter;
pub use filter::*;
mod join;
pub use join::*;
mod limit;
pub use limit::*;
mod projection;
pub use projection::*;
mod table_scan;
pub use table_scan::*;

#[enum_dispatch]
pub trait LogicalOperatorTrait {
    /// Number of inputs the operator consumes.
    fn input_count(&self) -> usize;

    /// Derives the output schema from the input schemas.
    ///
    /// Fails with [`OptError::MalformedPlan`](crate::error::OptError::MalformedPlan) when the
    /// operator is inconsistent with its inputs. `inputs.len()` has already been checked against
    /// [`input_count`](LogicalOperatorTrait::input_count).
    fn derive_schema(&self, inputs: &[&Schema]) -> OptResult<Schema>;
}

/// Logical relational operator.
#[enum_dispatch(LogicalOperatorTrait)]
#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum Operator {
    Aggregate(Aggregate),
    Projection(Projection),
    Join(Join),
    TableScan(TableScan),
    Filter(Filter),
    Limit(Limit),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Aggregate(op) => fmt::Display::fmt(op, f),
            Operator::Projection(op) => fmt::Display::fmt(op, f),
            Operator::Join(op) => fmt::Display::fmt(op, f),
            Operator::TableScan(op) => fmt::Display::fmt(op, f),
            Operator::Filter(op) => fmt::Display::fmt(op, f),
            Operator::Limit(op) => fmt::Display::fmt(op, f),
        }
    }
}
