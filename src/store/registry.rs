use super::types::*;
use serde::{Serialize, Deserialize};
use std::collections::{HashSet, VecDeque};

/// Columnar storage for every symbolic node of a model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    // Columnar Arrays
    pub kinds: Vec<NodeKind>,
    pub meta: Vec<NodeMetadata>,

    // Topology (CSR-ish)
    pub parents_flat: Vec<NodeId>,
    pub parents_ranges: Vec<(u32, u32)>, // (start, count)

    // Variable side table
    pub var_states: Vec<VarState>,

    // Ephemeral state for uniqueness checks (Not serialized, rebuilt on load)
    #[serde(skip)]
    pub used_names: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.kinds.len() }

    pub fn contains(&self, id: NodeId) -> bool { id.index() < self.count() }

    /// Rebuilds the `used_names` set after deserialization.
    pub fn rebuild_name_cache(&mut self) {
        self.used_names = self.meta.iter().map(|m| m.name.clone()).collect();
    }

    pub fn add_node(&mut self, kind: NodeKind, parents: &[NodeId], mut meta: NodeMetadata) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);

        // --- Unique Name Enforcement ---
        // Anonymous intermediate formulas are exempt.
        if !meta.name.is_empty() {
            let original_name = meta.name.clone();
            let mut candidate_name = original_name.clone();
            let mut counter = 1;

            while self.used_names.contains(&candidate_name) {
                candidate_name = format!("{}_{}", original_name, counter);
                counter += 1;
            }
            self.used_names.insert(candidate_name.clone());
            meta.name = candidate_name;
        }

        // 1. Register Parents
        let start = self.parents_flat.len() as u32;
        let count = parents.len() as u32;
        self.parents_flat.extend_from_slice(parents);
        self.parents_ranges.push((start, count));

        // 2. Metadata
        self.kinds.push(kind);
        self.meta.push(meta);

        id
    }

    pub fn add_constant(&mut self, value: f64) -> NodeId {
        self.add_node(NodeKind::Constant(value), &[], NodeMetadata::default())
    }

    pub fn add_param(&mut self, value: f64, meta: NodeMetadata) -> NodeId {
        self.add_node(NodeKind::Param(value), &[], meta)
    }

    pub fn add_var(&mut self, state: VarState, meta: NodeMetadata) -> NodeId {
        let slot = self.var_states.len() as u32;
        self.var_states.push(state);
        self.add_node(NodeKind::Variable(slot), &[], meta)
    }

    pub fn add_formula(&mut self, op: Operation, parents: &[NodeId]) -> NodeId {
        self.add_node(NodeKind::Formula(op), parents, NodeMetadata::default())
    }

    pub fn mul(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.add_formula(Operation::Multiply, &[lhs, rhs])
    }

    pub fn pow(&mut self, base: NodeId, exponent: NodeId) -> NodeId {
        self.add_formula(Operation::Power, &[base, exponent])
    }

    #[inline(always)]
    pub fn get_parents(&self, id: NodeId) -> &[NodeId] {
        let (start, count) = self.parents_ranges[id.index()];
        &self.parents_flat[start as usize..(start + count) as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind { &self.kinds[id.index()] }
    pub fn name(&self, id: NodeId) -> &str { &self.meta[id.index()].name }

    pub fn param_value(&self, id: NodeId) -> Option<f64> {
        match self.kinds.get(id.index())? {
            NodeKind::Param(v) => Some(*v),
            _ => None,
        }
    }

    pub fn set_param_value(&mut self, id: NodeId, value: f64) -> Result<(), String> {
        match self.kinds.get_mut(id.index()) {
            Some(NodeKind::Param(old)) => {
                *old = value;
                Ok(())
            }
            _ => Err(format!("Node {:?} is not a parameter.", id)),
        }
    }

    pub fn var_state(&self, id: NodeId) -> Option<&VarState> {
        match self.kinds.get(id.index())? {
            NodeKind::Variable(slot) => self.var_states.get(*slot as usize),
            _ => None,
        }
    }

    pub fn var_state_mut(&mut self, id: NodeId) -> Option<&mut VarState> {
        match self.kinds.get(id.index())? {
            NodeKind::Variable(slot) => self.var_states.get_mut(*slot as usize),
            _ => None,
        }
    }

    /// Every node the given nodes depend on, including themselves.
    pub fn upstream_from(&self, start_nodes: &[NodeId]) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from(start_nodes.to_vec());

        while let Some(node) = queue.pop_front() {
            if visited.insert(node) {
                for &parent in self.get_parents(node) {
                    queue.push_back(parent);
                }
            }
        }
        visited
    }

    /// Variables reachable from `root`, in ascending id order.
    pub fn variables_in(&self, root: NodeId) -> Vec<NodeId> {
        let mut vars: Vec<NodeId> = self.upstream_from(&[root])
            .into_iter()
            .filter(|id| matches!(self.kinds[id.index()], NodeKind::Variable(_)))
            .collect();
        vars.sort();
        vars
    }
}
