use std::collections::HashSet;
use std::fmt;
use std::mem::swap;
use std::rc::Rc;

use anyhow::{bail, Context};
use prettytable::Table;

use crate::error::{OptError, OptResult};
use crate::expr::Expr;
use crate::operator::{
    Aggregate, AggregateCall, Filter, Join, JoinType, Limit, LogicalOperatorTrait, Operator,
    Projection, TableScan,
};
use crate::properties::{LogicalProperty, Schema};

pub type PlanNodeId = u32;

pub type PlanNodeRef = Rc<PlanNode>;

/// One node in a plan.
///
/// Nodes are immutable once built. A rewrite never changes an existing node, it builds new nodes
/// that share existing inputs through [`PlanNodeRef`].
#[derive(Debug)]
pub struct PlanNode {
    id: PlanNodeId,
    operator: Operator,
    inputs: Vec<PlanNodeRef>,
    logical_prop: LogicalProperty,
}

/// The `eq` should ignore `id`.
impl PartialEq for PlanNode {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator
            && self.inputs == other.inputs
            && self.logical_prop == other.logical_prop
    }
}

impl PlanNode {
    /// Builds a node after checking `operator` against its inputs.
    pub fn try_new(id: PlanNodeId, operator: Operator, inputs: Vec<PlanNodeRef>) -> OptResult<Self> {
        if inputs.len() != operator.input_count() {
            bail!(OptError::malformed(format!(
                "{} expects {} inputs, got {}",
                operator,
                operator.input_count(),
                inputs.len()
            )));
        }

        let input_schemas: Vec<&Schema> = inputs.iter().map(|input| input.schema()).collect();
        let schema = operator
            .derive_schema(&input_schemas)
            .with_context(|| format!("Failed to build {}", operator))?;

        Ok(Self {
            id,
            operator,
            inputs,
            logical_prop: LogicalProperty::new(schema),
        })
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn inputs(&self) -> &[PlanNodeRef] {
        &self.inputs
    }

    pub fn logical_prop(&self) -> &LogicalProperty {
        &self.logical_prop
    }

    /// Ordered output fields of this node.
    pub fn schema(&self) -> &Schema {
        self.logical_prop.schema()
    }

    fn explain(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.operator, indent = depth * 2)?;
        for input in &self.inputs {
            input.explain(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.explain(f, 0)
    }
}

/// Allocates plan node ids.
#[derive(Debug, Default)]
pub struct PlanNodeIdGen {
    next: PlanNodeId,
}

impl PlanNodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: PlanNodeId) -> Self {
        Self { next }
    }

    pub fn next(&mut self) -> PlanNodeId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// A query plan.
///
/// A query plan is a single root dag(directed acyclic graph), since rewrites may share one input
/// between several new parents.
#[derive(PartialEq, Debug)]
pub struct Plan {
    root: PlanNodeRef,
}

/// Breath first iterator of a single root dag plan.
///
/// Nodes are told apart by identity, not by id: separately built subtrees may reuse ids.
struct BFSPlanNodeIter {
    visited: HashSet<*const PlanNode>,
    cur_level: Vec<PlanNodeRef>,
    next_level: Vec<PlanNodeRef>,
}

impl Iterator for BFSPlanNodeIter {
    type Item = PlanNodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_level.is_empty() {
            swap(&mut self.cur_level, &mut self.next_level);
            self.cur_level.reverse();
        }

        if let Some(p) = self.cur_level.pop() {
            for input in &p.inputs {
                if self.visited.insert(Rc::as_ptr(input)) {
                    self.next_level.push(input.clone());
                }
            }

            Some(p)
        } else {
            None
        }
    }
}

impl Plan {
    pub fn new(root: PlanNodeRef) -> Self {
        Self { root }
    }

    pub fn root(&self) -> PlanNodeRef {
        self.root.clone()
    }

    /// Visits every node once, level by level, left input before right input.
    pub fn bfs_iterator(&self) -> impl Iterator<Item = PlanNodeRef> {
        let mut visited = HashSet::new();
        visited.insert(Rc::as_ptr(&self.root));

        BFSPlanNodeIter {
            cur_level: vec![self.root.clone()],
            next_level: vec![],
            visited,
        }
    }

    /// Renders one row per node with its operator and output fields.
    pub fn explain_table(&self) -> String {
        let mut table = Table::new();
        table.set_titles(row!["id", "operator", "fields"]);
        for node in self.bfs_iterator() {
            table.add_row(row![node.id(), node.operator(), node.schema()]);
        }
        table.to_string()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

/// Builds a logical plan bottom up, validating every node as it is added.
#[derive(Debug, Default)]
pub struct LogicalPlanBuilder {
    root: Option<PlanNodeRef>,
    id_gen: PlanNodeIdGen,
}

impl LogicalPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_root(&self, operator: &str) -> OptResult<PlanNodeRef> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => bail!(OptError::malformed(format!("{} requires an input", operator))),
        }
    }

    fn reset_root(&mut self, operator: Operator, inputs: Vec<PlanNodeRef>) -> OptResult<&mut Self> {
        let plan_node = PlanNode::try_new(self.id_gen.next(), operator, inputs)?;
        self.root = Some(Rc::new(plan_node));
        Ok(self)
    }

    pub fn scan<S: Into<String>>(&mut self, table_name: S, schema: Schema) -> OptResult<&mut Self> {
        self.reset_root(TableScan::new(table_name, schema).into(), vec![])
    }

    pub fn filter(&mut self, predicate: Expr) -> OptResult<&mut Self> {
        let input = self.current_root("Filter")?;
        self.reset_root(Filter::new(predicate).into(), vec![input])
    }

    pub fn projection<S: Into<String>>(
        &mut self,
        exprs: Vec<Expr>,
        field_names: Vec<S>,
    ) -> OptResult<&mut Self> {
        let input = self.current_root("Projection")?;
        let field_names = field_names.into_iter().map(Into::into).collect();
        self.reset_root(Projection::new(exprs, field_names).into(), vec![input])
    }

    pub fn aggregate(
        &mut self,
        group_count: usize,
        calls: Vec<AggregateCall>,
    ) -> OptResult<&mut Self> {
        let input = self.current_root("Aggregate")?;
        self.reset_root(Aggregate::new(group_count, calls).into(), vec![input])
    }

    pub fn limit(&mut self, limit: usize) -> OptResult<&mut Self> {
        let input = self.current_root("Limit")?;
        self.reset_root(Limit::new(limit).into(), vec![input])
    }

    /// Joins the current root (left) with `right`.
    pub fn join(
        &mut self,
        join_type: JoinType,
        condition: Expr,
        right: PlanNodeRef,
    ) -> OptResult<&mut Self> {
        let left = self.current_root("Join")?;
        self.reset_root(Join::new(join_type, condition).into(), vec![left, right])
    }

    /// Consume current plan, but not rest state, e.g. plan node id.
    ///
    /// This is useful for building multi child plan, e.g. join.
    pub fn build(&mut self) -> OptResult<Plan> {
        match self.root.take() {
            Some(root) => Ok(Plan { root }),
            None => bail!(OptError::malformed("cannot build an empty plan")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;
    use crate::operator::AggregateFunction;
    use crate::properties::{DataType, Field};

    fn emp() -> Schema {
        Schema::new(vec![
            Field::new("deptno", DataType::Int64),
            Field::new("sal", DataType::Int64),
        ])
    }

    fn dept() -> Schema {
        Schema::new(vec![
            Field::new("deptno", DataType::Int64),
            Field::new("dname", DataType::Utf8),
        ])
    }

    fn is_malformed(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<OptError>(),
            Some(OptError::MalformedPlan(_))
        )
    }

    #[test]
    fn test_join_schema_offsets() {
        let mut builder = LogicalPlanBuilder::new();
        let dept = builder.scan("dept", dept()).unwrap().build().unwrap().root();
        let plan = builder
            .scan("emp", emp())
            .unwrap()
            .join(
                JoinType::Inner,
                col(0, DataType::Int64).eq_to(col(2, DataType::Int64)),
                dept,
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            "[deptno: Int64, sal: Int64, deptno: Int64, dname: Utf8]",
            plan.root().schema().to_string()
        );
    }

    #[test]
    fn test_malformed_nodes_are_rejected() {
        let mut builder = LogicalPlanBuilder::new();
        builder.scan("emp", emp()).unwrap();

        let err = builder
            .projection(vec![col(2, DataType::Int64)], vec!["x"])
            .unwrap_err();
        assert!(is_malformed(&err));

        let err = builder.filter(col(0, DataType::Int64)).unwrap_err();
        assert!(is_malformed(&err));

        let err = LogicalPlanBuilder::new().limit(10).unwrap_err();
        assert!(is_malformed(&err));

        let scan = builder.build().unwrap().root();
        let err = PlanNode::try_new(100, Limit::new(1).into(), vec![scan.clone(), scan]).unwrap_err();
        assert!(is_malformed(&err));
    }

    #[test]
    fn test_eq_ignores_id() {
        let build = |first_id| {
            let scan = Rc::new(
                PlanNode::try_new(first_id, TableScan::new("emp", emp()).into(), vec![]).unwrap(),
            );
            PlanNode::try_new(
                first_id + 1,
                Aggregate::new(
                    1,
                    vec![AggregateCall::new(
                        AggregateFunction::Sum,
                        false,
                        [1],
                        DataType::Int64,
                    )],
                )
                .into(),
                vec![scan],
            )
            .unwrap()
        };

        assert_eq!(build(0), build(10));
    }

    #[test]
    fn test_explain() {
        let plan = LogicalPlanBuilder::new()
            .scan("emp", emp())
            .unwrap()
            .limit(5)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!("Limit(5)\n  TableScan(emp)\n", plan.to_string());

        let table = plan.explain_table();
        assert!(table.contains("Limit(5)"));
        assert!(table.contains("[deptno: Int64, sal: Int64]"));
    }

    #[test]
    fn test_bfs_visits_shared_input_once() {
        let mut builder = LogicalPlanBuilder::new();
        let scan = builder.scan("emp", emp()).unwrap().build().unwrap().root();
        let join = PlanNode::try_new(
            10,
            Join::new(JoinType::Inner, crate::expr::lit_bool(true)).into(),
            vec![scan.clone(), scan],
        )
        .unwrap();

        let plan = Plan::new(Rc::new(join));
        assert_eq!(2, plan.bfs_iterator().count());
    }

    #[test]
    fn test_bfs_visits_nodes_sharing_an_id() {
        let emp_scan = LogicalPlanBuilder::new()
            .scan("emp", emp())
            .unwrap()
            .build()
            .unwrap()
            .root();
        let dept_scan = LogicalPlanBuilder::new()
            .scan("dept", dept())
            .unwrap()
            .build()
            .unwrap()
            .root();
        let join = PlanNode::try_new(
            0,
            Join::new(JoinType::Inner, crate::expr::lit_bool(true)).into(),
            vec![emp_scan, dept_scan],
        )
        .unwrap();

        let plan = Plan::new(Rc::new(join));
        let names: Vec<String> = plan
            .bfs_iterator()
            .map(|node| node.operator().to_string())
            .collect();
        assert_eq!(
            vec!["Join(type=Inner, condition=true)", "TableScan(emp)", "TableScan(dept)"],
            names
        );
    }
}
