//! ## Background
//!
//! The query optimizer accepts an unoptimized logical query plan and rewrites it into an
//! equivalent plan that is cheaper to execute. This crate is the rewrite layer of such an
//! optimizer: rules declare a structural pattern over the operator tree, and when the pattern
//! binds, the rule builds a replacement subtree that produces exactly the same fields, in the
//! same order, with the same relational meaning.
//!
//! Deciding *when* to fire a rule and choosing among competing plans belongs to a search driver.
//! A simple fix point driver in the manner of Calcite's HepPlanner is provided in [`heuristic`];
//! any other driver only needs [`rules::Binding`], [`rules::RuleCall`] and the [`rules::Rule`]
//! trait.
//!
//! ## Design
//!
//! * [`plan`] Immutable plan nodes, shared through reference counting.
//! * [`operator`] Relational operators and their structural checks.
//! * [`properties`] Output schema derivation.
//! * [`expr`] Scalar expressions and the builders rules use to assemble them.
//! * [`rules`] Pattern binding, rule invocation, and rule implementations, such as
//!   [`rules::RemoveDistinctAggregateRule`].
//! * [`heuristic`] Heuristic optimizer implementation.
//!
//! ## Reference
//!
//! 1. Graefe, G., 1995. The cascades framework for query optimization. IEEE Data Eng. Bull., 18(3),
//! pp.19-29.
//! 2. Begoli, E., Camacho-Rodríguez, J., Hyde, J., Mior, M.J. and Lemire, D., 2018. Apache
//! Calcite: A foundational framework for optimized query processing over heterogeneous data
//! sources. In Proceedings of the 2018 International Conference on Management of Data
//! (pp. 221-230).

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod error;
pub mod expr;
pub mod heuristic;
pub mod operator;
pub mod plan;
pub mod properties;
pub mod rules;
