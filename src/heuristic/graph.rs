use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use petgraph::prelude::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{Bfs, EdgeRef};
use petgraph::{Directed, Direction};

use crate::error::OptResult;
use crate::operator::Operator;
use crate::plan::{Plan, PlanNode, PlanNodeId, PlanNodeIdGen, PlanNodeRef};

/// Edges point from parent to input, weighted by the input's position.
type HepGraph = StableGraph<HepOptimizerNode, usize, Directed, u32>;
pub type HepNodeId = NodeIndex<u32>;

#[derive(Debug)]
pub struct HepOptimizerNode {
    plan_node_id: PlanNodeId,
    operator: Operator,
}

impl HepOptimizerNode {
    pub fn plan_node_id(&self) -> PlanNodeId {
        self.plan_node_id
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

/// A plan should be a single root dag.
///
/// Each graph node carries a plan node id that is unique within the graph. Plan nodes rebuilt
/// from the graph keep that id, so that a rule result which reuses them is spliced back onto the
/// existing graph nodes instead of copying them.
pub(super) struct PlanGraph {
    graph: HepGraph,
    root: HepNodeId,
    node_ids: HashMap<PlanNodeId, HepNodeId>,
}

impl PlanGraph {
    /// Converts a plan into a graph.
    ///
    /// Ids of the incoming plan are not trusted to be unique, e.g. subtrees from separate
    /// [`LogicalPlanBuilder`](crate::plan::LogicalPlanBuilder)s all start at 0. Nodes are told
    /// apart by identity instead and get fresh ids from `id_gen`.
    pub(super) fn new(plan: &Plan, id_gen: &mut PlanNodeIdGen) -> Self {
        let mut graph = PlanGraph {
            graph: HepGraph::default(),
            root: HepNodeId::default(),
            node_ids: HashMap::new(),
        };
        let mut imported = HashMap::new();
        graph.root = graph.import_plan_node(&plan.root(), id_gen, &mut imported);
        graph
    }

    fn import_plan_node(
        &mut self,
        plan_node: &PlanNodeRef,
        id_gen: &mut PlanNodeIdGen,
        imported: &mut HashMap<*const PlanNode, HepNodeId>,
    ) -> HepNodeId {
        if let Some(node_id) = imported.get(&Rc::as_ptr(plan_node)) {
            return *node_id;
        }

        let input_ids: Vec<HepNodeId> = plan_node
            .inputs()
            .iter()
            .map(|input| self.import_plan_node(input, id_gen, imported))
            .collect();
        let node_id = self.add_node(id_gen.next(), plan_node.operator().clone(), input_ids);
        imported.insert(Rc::as_ptr(plan_node), node_id);
        node_id
    }

    fn add_node(
        &mut self,
        plan_node_id: PlanNodeId,
        operator: Operator,
        input_ids: Vec<HepNodeId>,
    ) -> HepNodeId {
        let node_id = self.graph.add_node(HepOptimizerNode {
            plan_node_id,
            operator,
        });
        for (idx, input_id) in input_ids.into_iter().enumerate() {
            self.graph.add_edge(node_id, input_id, idx);
        }
        self.node_ids.insert(plan_node_id, node_id);
        node_id
    }

    pub(super) fn node(&self, node_id: HepNodeId) -> &HepOptimizerNode {
        &self.graph[node_id]
    }

    #[cfg(test)]
    pub(super) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return node ids in top down order.
    pub(super) fn top_down_node_iters(&self) -> impl Iterator<Item = HepNodeId> {
        let mut ids = Vec::with_capacity(self.graph.node_count());
        let mut bfs = Bfs::new(&self.graph, self.root);
        while let Some(node_id) = bfs.next(&self.graph) {
            ids.push(node_id);
        }

        ids.into_iter()
    }

    /// Return node ids in bottom up order.
    pub(super) fn bottom_up_node_iters(&self) -> impl Iterator<Item = HepNodeId> {
        self.top_down_node_iters().collect::<Vec<_>>().into_iter().rev()
    }

    fn inputs_of(&self, node_id: HepNodeId) -> Vec<HepNodeId> {
        let mut inputs: Vec<(usize, HepNodeId)> = self
            .graph
            .edges_directed(node_id, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        inputs.sort_by_key(|(idx, _)| *idx);
        inputs.into_iter().map(|(_, input)| input).collect()
    }

    /// Adds a rule result and its inputs, reusing graph nodes for plan nodes rebuilt from this
    /// graph.
    ///
    /// New nodes of the result must carry ids from the same generator the graph was built with.
    fn insert_plan_node(&mut self, plan_node: &PlanNodeRef) -> HepNodeId {
        if let Some(node_id) = self.node_ids.get(&plan_node.id()) {
            return *node_id;
        }

        let input_ids: Vec<HepNodeId> = plan_node
            .inputs()
            .iter()
            .map(|input| self.insert_plan_node(input))
            .collect();
        self.add_node(plan_node.id(), plan_node.operator().clone(), input_ids)
    }

    /// Replace the subtree at `origin_node_id` with a rule result.
    ///
    /// # Return
    ///
    /// The return value indicates whether graph changed.
    pub(super) fn replace_plan_node(
        &mut self,
        replacement: &PlanNodeRef,
        origin_node_id: HepNodeId,
    ) -> bool {
        let parent_edges: Vec<(EdgeIndex<u32>, HepNodeId, usize)> = self
            .graph
            .edges_directed(origin_node_id, Direction::Incoming)
            .map(|edge| (edge.id(), edge.source(), *edge.weight()))
            .collect();

        let new_node_id = self.insert_plan_node(replacement);
        if new_node_id == origin_node_id {
            return false;
        }

        // Redirect parents's input to new node
        for (edge, parent, idx) in parent_edges {
            self.graph.remove_edge(edge);
            self.graph.add_edge(parent, new_node_id, idx);
        }

        if self.root == origin_node_id {
            self.root = new_node_id;
        }
        self.remove_unreachable();

        true
    }

    /// Drops nodes no longer reachable from the root: the replaced node, unless the replacement
    /// still uses it, and inputs only it used.
    fn remove_unreachable(&mut self) {
        let reachable: HashSet<HepNodeId> = self.top_down_node_iters().collect();
        let unreachable: Vec<HepNodeId> = self
            .graph
            .node_indices()
            .filter(|node_id| !reachable.contains(node_id))
            .collect();
        for node_id in unreachable {
            if let Some(node) = self.graph.remove_node(node_id) {
                self.node_ids.remove(&node.plan_node_id);
            }
        }
    }

    /// Rebuilds the plan rooted at `node_id`.
    ///
    /// Nodes reachable through several parents are built once and shared.
    pub(super) fn to_plan_node(&self, node_id: HepNodeId) -> OptResult<PlanNodeRef> {
        let mut built = HashMap::new();
        self.build_plan_node(node_id, &mut built)
    }

    fn build_plan_node(
        &self,
        node_id: HepNodeId,
        built: &mut HashMap<HepNodeId, PlanNodeRef>,
    ) -> OptResult<PlanNodeRef> {
        if let Some(plan_node) = built.get(&node_id) {
            return Ok(plan_node.clone());
        }

        let inputs = self
            .inputs_of(node_id)
            .into_iter()
            .map(|input_id| self.build_plan_node(input_id, built))
            .collect::<OptResult<Vec<_>>>()?;
        let node = &self.graph[node_id];
        let plan_node = Rc::new(PlanNode::try_new(
            node.plan_node_id,
            node.operator.clone(),
            inputs,
        )?);
        built.insert(node_id, plan_node.clone());
        Ok(plan_node)
    }

    pub(super) fn to_plan(&self) -> OptResult<Plan> {
        Ok(Plan::new(self.to_plan_node(self.root)?))
    }
}
