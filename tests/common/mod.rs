//! Fixtures and a row-at-a-time reference evaluator for plans.
//!
//! The evaluator exists only to check that rewritten plans return the same rows as the
//! original ones. It favours obviousness over speed.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;
use rel_rewrite::expr::{Expr, ScalarOperator, ScalarValue};
use rel_rewrite::operator::{AggregateCall, AggregateFunction, JoinType, Operator};
use rel_rewrite::plan::{LogicalPlanBuilder, PlanNode, PlanNodeIdGen, PlanNodeRef};
use rel_rewrite::properties::{DataType, Field, Schema};
use rel_rewrite::rules::{fire_rule, Binding, RemoveDistinctAggregateRule, Rule, RuleImpl};

pub const DEPTNO: usize = 0;
pub const SAL: usize = 1;
pub const GENDER: usize = 2;
pub const NAME: usize = 3;

pub fn emp_schema() -> Schema {
    Schema::new(vec![
        Field::new("deptno", DataType::Int64),
        Field::new("sal", DataType::Int64),
        Field::new("gender", DataType::Utf8),
        Field::new("name", DataType::Utf8),
    ])
}

pub fn call(function: AggregateFunction, distinct: bool, args: &[usize]) -> AggregateCall {
    let result_type = match function {
        AggregateFunction::Count | AggregateFunction::Sum => DataType::Int64,
        AggregateFunction::Avg => DataType::Float64,
        AggregateFunction::Min | AggregateFunction::Max => {
            emp_schema().fields()[args[0]].data_type()
        }
    };
    AggregateCall::new(function, distinct, args.iter().copied(), result_type)
}

/// `Aggregate(group_count, calls)` directly over a scan of `emp`.
pub fn emp_aggregate(group_count: usize, calls: Vec<AggregateCall>) -> PlanNodeRef {
    LogicalPlanBuilder::new()
        .scan("emp", emp_schema())
        .unwrap()
        .aggregate(group_count, calls)
        .unwrap()
        .build()
        .unwrap()
        .root()
}

/// Fires [`RemoveDistinctAggregateRule`] on `node` the way a driver would.
///
/// Returns `None` when the rule's pattern does not bind or the rule declines.
pub fn remove_distinct(node: &PlanNodeRef) -> Option<PlanNodeRef> {
    let rule: RuleImpl = RemoveDistinctAggregateRule::new().into();
    let binding = Binding::bind(node, rule.pattern())?;
    let mut id_gen = PlanNodeIdGen::starting_at(1000);
    fire_rule(&rule, binding, &mut id_gen).unwrap()
}

pub fn contains_distinct_call(node: &PlanNode) -> bool {
    let here = node
        .operator()
        .as_aggregate()
        .map_or(false, |aggregate| aggregate.contains_distinct_call());
    here || node.inputs().iter().any(|input| contains_distinct_call(input))
}

pub fn count_joins(node: &PlanNode) -> usize {
    let here = usize::from(matches!(node.operator(), Operator::Join(_)));
    here + node.inputs().iter().map(|input| count_joins(input)).sum::<usize>()
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

pub type Row = Vec<Value>;

/// Rows of each scanned table, by table name.
pub type Tables = HashMap<String, Vec<Row>>;

pub fn emp_row(deptno: i64, sal: i64, gender: &str, name: &str) -> Row {
    vec![
        Value::Int(deptno),
        Value::Int(sal),
        Value::Str(gender.to_string()),
        Value::Str(name.to_string()),
    ]
}

/// Evaluates `node` and returns its rows sorted, i.e. as a multiset.
pub fn evaluate_sorted(node: &PlanNode, tables: &Tables) -> Vec<Row> {
    let mut rows = evaluate(node, tables);
    rows.sort();
    rows
}

pub fn evaluate(node: &PlanNode, tables: &Tables) -> Vec<Row> {
    let inputs: Vec<Vec<Row>> = node
        .inputs()
        .iter()
        .map(|input| evaluate(input, tables))
        .collect();

    match node.operator() {
        Operator::TableScan(scan) => tables[scan.table_name()].clone(),
        Operator::Filter(filter) => inputs[0]
            .iter()
            .filter(|row| eval_expr(filter.predicate(), row) == Value::Bool(true))
            .cloned()
            .collect(),
        Operator::Limit(limit) => inputs[0].iter().take(limit.limit()).cloned().collect(),
        Operator::Projection(projection) => inputs[0]
            .iter()
            .map(|row| {
                projection
                    .exprs()
                    .iter()
                    .map(|expr| eval_expr(expr, row))
                    .collect()
            })
            .collect(),
        Operator::Join(join) => {
            assert_eq!(JoinType::Inner, join.join_type());
            let mut rows = vec![];
            for left in &inputs[0] {
                for right in &inputs[1] {
                    let row: Row = left.iter().chain(right.iter()).cloned().collect();
                    if eval_expr(join.condition(), &row) == Value::Bool(true) {
                        rows.push(row);
                    }
                }
            }
            rows
        }
        Operator::Aggregate(aggregate) => {
            let group_count = aggregate.group_count();
            let mut groups: Vec<(Row, Vec<Row>)> = vec![];
            for row in &inputs[0] {
                let key = row[..group_count].to_vec();
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, rows)) => rows.push(row.clone()),
                    None => groups.push((key, vec![row.clone()])),
                }
            }
            // A scalar aggregate returns one row even over no input.
            if group_count == 0 && groups.is_empty() {
                groups.push((vec![], vec![]));
            }

            groups
                .into_iter()
                .map(|(mut key, rows)| {
                    key.extend(
                        aggregate
                            .calls()
                            .iter()
                            .map(|agg_call| eval_aggregate(agg_call, &rows)),
                    );
                    key
                })
                .collect()
        }
    }
}

fn eval_aggregate(agg_call: &AggregateCall, rows: &[Row]) -> Value {
    let mut args: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| agg_call.args().iter().map(|arg| row[*arg].clone()).collect())
        .collect();
    if agg_call.is_distinct() {
        let unique: BTreeSet<Vec<Value>> = args.into_iter().collect();
        args = unique.into_iter().collect();
    }

    match agg_call.function() {
        AggregateFunction::Count => Value::Int(args.len() as i64),
        AggregateFunction::Sum => {
            if args.is_empty() {
                return Value::Null;
            }
            Value::Int(
                args.iter()
                    .map(|arg| match &arg[0] {
                        Value::Int(v) => *v,
                        other => panic!("cannot sum {:?}", other),
                    })
                    .sum(),
            )
        }
        AggregateFunction::Min => first_args(args).min().unwrap_or(Value::Null),
        AggregateFunction::Max => first_args(args).max().unwrap_or(Value::Null),
        AggregateFunction::Avg => panic!("AVG is not supported by the reference evaluator"),
    }
}

fn first_args(args: Vec<Vec<Value>>) -> impl Iterator<Item = Value> {
    args.into_iter().map(|mut arg| arg.remove(0))
}

fn eval_expr(expr: &Expr, row: &Row) -> Value {
    match expr {
        Expr::Column(field_ref) => row[field_ref.index()].clone(),
        Expr::Literal(ScalarValue::Boolean(v)) => Value::Bool(*v),
        Expr::Literal(ScalarValue::Int64(v)) => Value::Int(*v),
        Expr::Literal(ScalarValue::Float64(v)) => Value::Float(*v),
        Expr::Literal(ScalarValue::Utf8(v)) => Value::Str(v.clone()),
        Expr::Call { op, args } => {
            let left = eval_expr(&args[0], row);
            let right = eval_expr(&args[1], row);
            match op {
                ScalarOperator::Equals => Value::Bool(left == right),
                ScalarOperator::And => {
                    Value::Bool(left == Value::Bool(true) && right == Value::Bool(true))
                }
            }
        }
    }
}
