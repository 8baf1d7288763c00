//! A synchronous, single-threaded expression evaluator.
use crate::computation::ledger::{ComputationError, Ledger};
use crate::store::{NodeId, NodeKind, Operation, Registry};
use std::collections::HashSet;

pub struct Evaluator<'a> {
    registry: &'a Registry,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Evaluates a single node against the current parameter and variable values.
    pub fn value(&self, target: NodeId) -> Result<f64, ComputationError> {
        let mut ledger = Ledger::new();
        self.compute(&[target], &mut ledger)?;
        match ledger.get(target) {
            Some(result) => result.clone(),
            None => Err(ComputationError::UnknownNode(target)),
        }
    }

    /// Computes the values for a set of target nodes, calculating their dependencies as needed.
    /// Values already present in the ledger are reused.
    pub fn compute(&self, targets: &[NodeId], ledger: &mut Ledger) -> Result<(), ComputationError> {
        let mut eval_order = Vec::new();
        let mut visiting = HashSet::new(); // For cycle detection
        let mut visited = HashSet::new();  // For memoization

        ledger.ensure_capacity(self.registry.count());
        for &target_id in targets {
            if !self.registry.contains(target_id) {
                return Err(ComputationError::UnknownNode(target_id));
            }
            self.build_eval_order_dfs(target_id, ledger, &mut eval_order, &mut visiting, &mut visited)?;
        }

        for &node_id in &eval_order {
            // The DFS ensures parents are evaluated first.
            let result = self.evaluate_node(node_id, ledger);
            ledger.insert(node_id, result);
        }

        Ok(())
    }

    /// Post-order DFS over parents, i.e. a topological sort of the sub-graph.
    fn build_eval_order_dfs(
        &self,
        node_id: NodeId,
        ledger: &Ledger,
        eval_order: &mut Vec<NodeId>,
        visiting: &mut HashSet<NodeId>,
        visited: &mut HashSet<NodeId>,
    ) -> Result<(), ComputationError> {
        if visited.contains(&node_id) || ledger.get(node_id).is_some() {
            return Ok(());
        }
        if visiting.contains(&node_id) {
            return Err(ComputationError::CycleDetected);
        }

        visiting.insert(node_id);
        for &parent_id in self.registry.get_parents(node_id) {
            self.build_eval_order_dfs(parent_id, ledger, eval_order, visiting, visited)?;
        }
        visiting.remove(&node_id);
        visited.insert(node_id);
        eval_order.push(node_id);
        Ok(())
    }

    fn evaluate_node(&self, node_id: NodeId, ledger: &Ledger) -> Result<f64, ComputationError> {
        match self.registry.kind(node_id) {
            NodeKind::Constant(v) | NodeKind::Param(v) => Ok(*v),
            NodeKind::Variable(_) => self
                .registry
                .var_state(node_id)
                .and_then(|s| s.value)
                .ok_or_else(|| ComputationError::UnresolvedValue {
                    node_id,
                    node_name: self.registry.name(node_id).to_string(),
                }),
            NodeKind::Formula(op) => {
                let parents = self.registry.get_parents(node_id);
                if parents.len() != op.arity() {
                    return Err(ComputationError::ParentCountMismatch {
                        node_id,
                        expected: op.arity(),
                        actual: parents.len(),
                    });
                }
                let mut args = Vec::with_capacity(parents.len());
                for &pid in parents {
                    match ledger.get(pid) {
                        Some(Ok(v)) => args.push(*v),
                        Some(Err(e)) => return Err(e.clone()),
                        None => return Err(ComputationError::UnknownNode(pid)),
                    }
                }
                Self::apply(node_id, *op, &args)
            }
        }
    }

    fn apply(node_id: NodeId, op: Operation, args: &[f64]) -> Result<f64, ComputationError> {
        let result = match op {
            Operation::Add => args[0] + args[1],
            Operation::Subtract => args[0] - args[1],
            Operation::Multiply => args[0] * args[1],
            Operation::Divide => {
                if args[1] == 0.0 {
                    return Err(ComputationError::MathError { node_id, msg: "division by zero".to_string() });
                }
                args[0] / args[1]
            }
            Operation::Power => args[0].powf(args[1]),
            Operation::Negate => -args[0],
        };
        if !result.is_finite() {
            return Err(ComputationError::MathError {
                node_id,
                msg: format!("{} {} {} is not finite", args[0], op.symbol(), args.get(1).copied().unwrap_or_default()),
            });
        }
        Ok(result)
    }
}
