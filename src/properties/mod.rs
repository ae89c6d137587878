//! Properties of relation operators.
//!
//! Only logical properties are tracked here: the ordered output fields of each operator. They are
//! derived once, when a [`PlanNode`](crate::plan::PlanNode) is built, and never change afterwards.

mod logical;
pub use logical::*;
mod schema;
pub use schema::*;
