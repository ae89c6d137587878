use anyhow::Context;
use log::{debug, trace};

use crate::error::OptResult;
use crate::heuristic::graph::PlanGraph;
use crate::heuristic::HepNodeId;
use crate::plan::{Plan, PlanNodeIdGen};
use crate::rules::{fire_rule, Binding, Rule, RuleImpl, DEFAULT_RULES};

/// Match order of plan tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchOrder {
    BottomUp,
    TopDown,
}

/// Settings of a [`HepOptimizer`].
#[derive(Clone, Debug)]
pub struct HepConfig {
    pub match_order: MatchOrder,
    /// Max number of iteration
    pub max_iter_times: usize,
}

impl Default for HepConfig {
    fn default() -> Self {
        Self {
            match_order: MatchOrder::TopDown,
            max_iter_times: 1000,
        }
    }
}

impl HepConfig {
    pub fn with_match_order(mut self, match_order: MatchOrder) -> Self {
        self.match_order = match_order;
        self
    }

    pub fn with_max_iter_times(mut self, max_iter_times: usize) -> Self {
        self.max_iter_times = max_iter_times;
        self
    }
}

pub struct HepOptimizer {
    config: HepConfig,
    rules: Vec<RuleImpl>,
    graph: PlanGraph,
    id_gen: PlanNodeIdGen,
}

impl HepOptimizer {
    pub fn new(config: HepConfig, rules: Vec<RuleImpl>, plan: Plan) -> Self {
        // The graph numbers its nodes from `id_gen`, and rule results continue from there, so
        // every plan node id seen by the graph is unique.
        let mut id_gen = PlanNodeIdGen::new();
        let graph = PlanGraph::new(&plan, &mut id_gen);

        Self {
            config,
            rules,
            graph,
            id_gen,
        }
    }

    /// Optimizer running [`DEFAULT_RULES`].
    pub fn with_default_rules(config: HepConfig, plan: Plan) -> Self {
        Self::new(config, DEFAULT_RULES.clone(), plan)
    }

    /// Applies rules until the plan no longer changes or `max_iter_times` is reached.
    pub fn find_best_plan(mut self) -> OptResult<Plan> {
        for times in 0..self.config.max_iter_times {
            // The plan no longer changes after iteration
            let mut fixed_point = true;
            let node_ids: Vec<HepNodeId> = match self.config.match_order {
                MatchOrder::TopDown => self.graph.top_down_node_iters().collect(),
                MatchOrder::BottomUp => self.graph.bottom_up_node_iters().collect(),
            };

            'nodes: for node_id in node_ids {
                for rule in &*self.rules.clone() {
                    if self.apply_rule(rule, node_id)? {
                        debug!(
                            "Plan after applying rule {}:\n{}",
                            rule.name(),
                            self.graph.to_plan()?
                        );
                        fixed_point = false;
                        break 'nodes;
                    }
                }
            }

            if fixed_point {
                debug!("Reached fixed point after {} iterations", times + 1);
                break;
            }
        }

        self.graph.to_plan()
    }

    fn apply_rule(&mut self, rule: &RuleImpl, node_id: HepNodeId) -> OptResult<bool> {
        let plan_node = self.graph.to_plan_node(node_id)?;
        let binding = match Binding::bind(&plan_node, rule.pattern()) {
            Some(binding) => binding,
            None => {
                trace!(
                    "Skipped applying rule {} to expression {}",
                    rule.name(),
                    self.graph.node(node_id).operator()
                );
                return Ok(false);
            }
        };

        debug!(
            "Trying to apply rule {} to expression {}",
            rule.name(),
            plan_node.operator()
        );
        let result = fire_rule(rule, binding, &mut self.id_gen)
            .with_context(|| format!("Failed to apply rule {}", rule.name()))?;

        match result {
            Some(new_plan_node) => Ok(self.graph.replace_plan_node(&new_plan_node, node_id)),
            // No transformation generated.
            None => Ok(false),
        }
    }
}
