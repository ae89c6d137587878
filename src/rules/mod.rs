//! Rewrite rules and the machinery to bind and fire them.
//!
//! A rule declares a [`Pattern`]. The driver binds the pattern against plan nodes
//! ([`Binding::bind`], [`find_bindings`]), wraps each binding in a [`RuleCall`] and passes it to
//! [`Rule::on_match`]. The rule either submits one replacement through
//! [`RuleCall::transform_to`] or declines by submitting nothing. Splicing the replacement into
//! the surrounding plan is up to the driver, see [`heuristic`](crate::heuristic).

use enum_dispatch::enum_dispatch;
use log::debug;

use crate::error::OptResult;
use crate::plan::{PlanNodeIdGen, PlanNodeRef};

mod binding;
pub use binding::*;
mod call;
pub use call::*;
mod pattern;
pub use pattern::*;
mod remove_distinct_aggregate;
pub use remove_distinct_aggregate::*;

#[enum_dispatch]
pub trait Rule {
    fn name(&self) -> &'static str;

    /// The pattern to determine whether the rule can be applied.
    fn pattern(&self) -> &Pattern;

    /// Fires the rule on a binding of its pattern.
    ///
    /// Errors abort the firing. A rule that has nothing to rewrite returns `Ok(())` without
    /// calling [`RuleCall::transform_to`].
    fn on_match(&self, call: &mut RuleCall<'_>) -> OptResult<()>;
}

#[enum_dispatch(Rule)]
#[derive(Clone, Debug)]
pub enum RuleImpl {
    RemoveDistinctAggregateRule(RemoveDistinctAggregateRule),
}

lazy_static! {
    /// Rules a heuristic optimizer runs when no rule set is given.
    pub static ref DEFAULT_RULES: Vec<RuleImpl> = vec![RemoveDistinctAggregateRule::new().into()];
}

/// Fires `rule` on `binding` and returns the replacement it proposed, if any.
pub fn fire_rule(
    rule: &RuleImpl,
    binding: Binding,
    id_gen: &mut PlanNodeIdGen,
) -> OptResult<Option<PlanNodeRef>> {
    let mut call = RuleCall::new(binding, id_gen);
    rule.on_match(&mut call)?;
    let result = call.into_result();
    if result.is_none() {
        debug!("Rule {} declined", rule.name());
    }
    Ok(result)
}
