//! Elimination of `DISTINCT` aggregate calls.
//!
//! An aggregate such as
//!
//! ```text
//! SELECT deptno, SUM(sal), COUNT(DISTINCT sal), COUNT(DISTINCT gender)
//! FROM emp
//! GROUP BY deptno
//! ```
//!
//! is rewritten into joins against `SELECT DISTINCT` sub-queries, one per distinct argument list:
//!
//! ```text
//! SELECT e.deptno, e.sum_sal, ds.count_sal, dg.count_gender
//! FROM (SELECT deptno, SUM(sal) AS sum_sal FROM emp GROUP BY deptno) AS e
//! JOIN (
//!   SELECT deptno, COUNT(sal) AS count_sal
//!   FROM (SELECT DISTINCT deptno, sal FROM emp)
//!   GROUP BY deptno) AS ds ON e.deptno = ds.deptno
//! JOIN (
//!   SELECT deptno, COUNT(gender) AS count_gender
//!   FROM (SELECT DISTINCT deptno, gender FROM emp)
//!   GROUP BY deptno) AS dg ON e.deptno = dg.deptno
//! ```
//!
//! When every call is distinct and all calls share one argument list, no join is needed: the
//! aggregate is simply computed over the `SELECT DISTINCT` of its group and argument fields.

use std::collections::HashMap;

use anyhow::bail;
use itertools::Itertools;
use log::debug;

use crate::error::{OptError, OptResult};
use crate::expr::{col, conjunction, lit_bool, Expr, FieldIndex};
use crate::operator::{Aggregate, AggregateCall, Join, JoinType, Operator, Projection};
use crate::plan::PlanNodeRef;
use crate::rules::{Pattern, Rule, RuleCall};

/// Maps an input field ordinal to its ordinal in a `SELECT DISTINCT` projection.
pub type SourceMap = HashMap<FieldIndex, FieldIndex>;

/// Rewrites an aggregate with `DISTINCT` calls into one without them.
///
/// Only aggregates holding at least one distinct call bind to this rule's pattern.
#[derive(Clone, Debug)]
pub struct RemoveDistinctAggregateRule {
    pattern: Pattern,
}

impl RemoveDistinctAggregateRule {
    pub fn new() -> Self {
        Self {
            pattern: Pattern::new(|op| {
                op.as_aggregate()
                    .map_or(false, Aggregate::contains_distinct_call)
            }),
        }
    }
}

impl Default for RemoveDistinctAggregateRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RemoveDistinctAggregateRule {
    fn name(&self) -> &'static str {
        "RemoveDistinctAggregateRule"
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn on_match(&self, call: &mut RuleCall<'_>) -> OptResult<()> {
        let node = call.node(0).clone();
        let aggregate = match node.operator() {
            Operator::Aggregate(aggregate) => aggregate,
            other => bail!(OptError::InvalidRule(format!(
                "{} bound to {}",
                self.name(),
                other
            ))),
        };
        let input = node.inputs()[0].clone();

        // Distinct argument lists in first-seen order, so that rewriting the same plan twice
        // produces the same tree.
        let non_distinct_count = aggregate.calls().iter().filter(|c| !c.is_distinct()).count();
        let arg_lists: Vec<&[FieldIndex]> = aggregate
            .calls()
            .iter()
            .filter(|c| c.is_distinct())
            .map(AggregateCall::args)
            .unique()
            .collect();
        assert!(
            !arg_lists.is_empty(),
            "{} bound to an aggregate without distinct calls: {}",
            self.name(),
            aggregate
        );

        if non_distinct_count == 0 && arg_lists.len() == 1 {
            debug!(
                "Rewriting {} over a single distinct argument list {:?}",
                aggregate, arg_lists[0]
            );
            let converted = convert_monopole(call, &input, aggregate, arg_lists[0])?;
            call.transform_to(converted);
            return Ok(());
        }

        debug!(
            "Rewriting {} into joins over {} distinct argument lists",
            aggregate,
            arg_lists.len()
        );

        // Where each output field of the original aggregate ends up. Group fields and
        // non-distinct calls come from the base aggregate, distinct calls are filled in as their
        // argument list gets joined.
        let group_count = aggregate.group_count();
        let original_fields = node.schema().fields();
        let mut refs: Vec<Option<Expr>> = vec![None; original_fields.len()];
        for (i, field) in original_fields[..group_count].iter().enumerate() {
            refs[i] = Some(col(i, field.data_type()));
        }

        let mut base_calls = vec![];
        for (i, agg_call) in aggregate.calls().iter().enumerate() {
            if agg_call.is_distinct() {
                continue;
            }
            refs[group_count + i] = Some(col(
                group_count + base_calls.len(),
                agg_call.result_type(),
            ));
            base_calls.push(agg_call.clone());
        }

        let mut rel = call.new_node(
            Aggregate::new(group_count, base_calls),
            vec![input.clone()],
        )?;
        for arg_list in arg_lists {
            rel = join_distinct(call, &input, aggregate, rel, arg_list, &mut refs)?;
        }

        let exprs = match refs.into_iter().collect::<Option<Vec<Expr>>>() {
            Some(exprs) => exprs,
            None => bail!(OptError::InvalidRule(format!(
                "not every field of {} was mapped by the rewrite",
                aggregate
            ))),
        };
        let project = call.new_node(
            Projection::new(exprs, node.schema().field_names()),
            vec![rel],
        )?;

        call.transform_to(project);
        Ok(())
    }
}

/// Rewrites an aggregate whose calls are all distinct over the same arguments.
///
/// ```text
/// SELECT deptno, COUNT(DISTINCT sal), SUM(DISTINCT sal) FROM emp GROUP BY deptno
/// ```
///
/// becomes
///
/// ```text
/// SELECT deptno, COUNT(sal), SUM(sal)
/// FROM (SELECT DISTINCT deptno, sal FROM emp)
/// GROUP BY deptno
/// ```
fn convert_monopole(
    call: &mut RuleCall<'_>,
    input: &PlanNodeRef,
    aggregate: &Aggregate,
    arg_list: &[FieldIndex],
) -> OptResult<PlanNodeRef> {
    let (distinct, source_of) =
        create_select_distinct(call, input, aggregate.group_count(), arg_list)?;

    let calls = aggregate
        .calls()
        .iter()
        .map(|agg_call| {
            if agg_call.is_distinct() && agg_call.args() == arg_list {
                rewrite_call(agg_call, &source_of)
            } else {
                Ok(agg_call.clone())
            }
        })
        .collect::<OptResult<Vec<_>>>()?;

    call.new_node(Aggregate::new(aggregate.group_count(), calls), vec![distinct])
}

/// Joins `left` with the aggregation of every distinct call over `arg_list`.
///
/// ```text
/// Aggregate(group_count=1, calls=[COUNT(DISTINCT $1), SUM($2)])
/// ```
///
/// with `left` being the base aggregate and `arg_list` `[1]` becomes
///
/// ```text
/// Join(type=Inner, condition=($0 = $2))
///   left
///   Aggregate(group_count=1, calls=[COUNT($1)])
///     Aggregate(group_count=2, calls=[])
///       Projection(exprs=[$0, $1], ...)
///         input
/// ```
///
/// `refs` entries of the rewritten calls are pointed at their position in the join output.
fn join_distinct(
    call: &mut RuleCall<'_>,
    input: &PlanNodeRef,
    aggregate: &Aggregate,
    left: PlanNodeRef,
    arg_list: &[FieldIndex],
    refs: &mut [Option<Expr>],
) -> OptResult<PlanNodeRef> {
    let group_count = aggregate.group_count();
    let left_width = left.schema().len();
    let (distinct, source_of) = create_select_distinct(call, input, group_count, arg_list)?;

    let mut distinct_calls = vec![];
    for (i, agg_call) in aggregate.calls().iter().enumerate() {
        // Only distinct calls over exactly this argument list, e.g. for `[sal]` rewrite
        // COUNT(DISTINCT sal) and SUM(DISTINCT sal) but not COUNT(DISTINCT gender) or SUM(sal).
        if !agg_call.is_distinct() || agg_call.args() != arg_list {
            continue;
        }
        let rewritten = rewrite_call(agg_call, &source_of)?;
        debug_assert!(refs[group_count + i].is_none());
        refs[group_count + i] = Some(col(
            left_width + group_count + distinct_calls.len(),
            rewritten.result_type(),
        ));
        distinct_calls.push(rewritten);
    }

    let distinct_agg =
        call.new_node(Aggregate::new(group_count, distinct_calls), vec![distinct])?;
    let condition = join_condition(&left, &distinct_agg, group_count, &source_of);
    call.new_node(
        Join::new(JoinType::Inner, condition),
        vec![left, distinct_agg],
    )
}

/// `left.$0 = right.$0 AND left.$1 = right.$1 ...` over the group fields, addressed in the
/// join's concatenated row. Without group fields both sides hold a single row and the
/// condition is `true`.
fn join_condition(
    left: &PlanNodeRef,
    right: &PlanNodeRef,
    group_count: usize,
    source_of: &SourceMap,
) -> Expr {
    let left_fields = left.schema().fields();
    let right_fields = right.schema().fields();
    let left_width = left_fields.len();

    conjunction((0..group_count).map(|i| {
        let right_ordinal = source_of[&i];
        col(i, left_fields[i].data_type()).eq_to(col(
            left_width + right_ordinal,
            right_fields[right_ordinal].data_type(),
        ))
    }))
    .unwrap_or_else(|| lit_bool(true))
}

/// Builds `SELECT DISTINCT <group fields>, <arguments>` over `input`.
///
/// Fields are selected by ordinal: group fields first, then each argument in order, skipping any
/// ordinal already selected. Given `[f0, f1, f2]` grouped on `f0` and `arg_list` `[2, 0]` the
/// projection is `[$0, $2]`, and the returned map holds `0 -> 0` and `2 -> 1`.
///
/// Fails with [`OptError::MalformedPlan`] when an ordinal is out of range for `input`.
pub fn create_select_distinct(
    call: &mut RuleCall<'_>,
    input: &PlanNodeRef,
    group_count: usize,
    arg_list: &[FieldIndex],
) -> OptResult<(PlanNodeRef, SourceMap)> {
    let input_schema = input.schema();
    let mut source_of = SourceMap::new();
    let mut exprs = vec![];
    let mut names = vec![];

    for ordinal in (0..group_count).chain(arg_list.iter().copied()) {
        if source_of.contains_key(&ordinal) {
            continue;
        }
        let field = match input_schema.field(ordinal) {
            Some(field) => field,
            None => bail!(OptError::malformed(format!(
                "cannot select field ${} from {} input fields",
                ordinal,
                input_schema.len()
            ))),
        };
        source_of.insert(ordinal, exprs.len());
        exprs.push(col(ordinal, field.data_type()));
        names.push(field.name().to_string());
    }

    let width = exprs.len();
    let project = call.new_node(Projection::new(exprs, names), vec![input.clone()])?;
    let distinct = call.new_node(Aggregate::new(width, vec![]), vec![project])?;
    Ok((distinct, source_of))
}

/// Turns a distinct call into a plain call over the `SELECT DISTINCT` fields.
fn rewrite_call(agg_call: &AggregateCall, source_of: &SourceMap) -> OptResult<AggregateCall> {
    let args = agg_call
        .args()
        .iter()
        .map(|arg| match source_of.get(arg) {
            Some(source) => Ok(*source),
            None => bail!(OptError::InvalidRule(format!(
                "argument ${} of {} was not selected",
                arg, agg_call
            ))),
        })
        .collect::<OptResult<Vec<_>>>()?;
    Ok(agg_call.with_args(false, args))
}
