use crate::computation::{ComputationError, Evaluator, Ledger};
use crate::expression::Relation;
use crate::store::{NodeId, NodeKind, Operation, Registry};
use std::collections::HashMap;
use std::fmt::Write;

/// Infix rendering of the expression rooted at `root`, e.g.
/// `x[Liq,A]**order[Liq,A]*x[Liq,B]**order[Liq,B]`.
pub fn format_expression(registry: &Registry, root: NodeId) -> String {
    let mut out = String::new();
    write_expr(registry, root, &mut out);
    out
}

/// `lhs == rhs`, with `None` standing in for an empty right-hand side.
pub fn format_relation(registry: &Registry, relation: &Relation) -> String {
    let lhs = format_expression(registry, relation.lhs);
    let rhs = relation.rhs.map_or_else(|| "None".to_string(), |r| format_expression(registry, r));
    format!("{} == {}", lhs, rhs)
}

fn precedence(kind: &NodeKind) -> u8 {
    match kind {
        NodeKind::Formula(Operation::Add | Operation::Subtract) => 1,
        NodeKind::Formula(Operation::Multiply | Operation::Divide) => 2,
        NodeKind::Formula(Operation::Negate) => 3,
        NodeKind::Formula(Operation::Power) => 4,
        NodeKind::Constant(v) if *v < 0.0 => 3,
        _ => 5,
    }
}

fn write_operand(registry: &Registry, node: NodeId, min_prec: u8, out: &mut String) {
    if precedence(registry.kind(node)) < min_prec {
        out.push('(');
        write_expr(registry, node, out);
        out.push(')');
    } else {
        write_expr(registry, node, out);
    }
}

fn write_expr(registry: &Registry, node: NodeId, out: &mut String) {
    match registry.kind(node) {
        NodeKind::Constant(v) => {
            let _ = write!(out, "{}", v);
        }
        NodeKind::Param(_) | NodeKind::Variable(_) => out.push_str(registry.name(node)),
        NodeKind::Formula(op) => {
            let parents = registry.get_parents(node);
            let own = precedence(registry.kind(node));
            match (op, parents) {
                (Operation::Negate, [arg]) => {
                    out.push('-');
                    write_operand(registry, *arg, own, out);
                }
                (Operation::Power, [base, exp]) => {
                    // Right-associative: a nested power on the left needs brackets.
                    write_operand(registry, *base, own + 1, out);
                    out.push_str("**");
                    write_operand(registry, *exp, own, out);
                }
                (Operation::Add | Operation::Multiply, [lhs, rhs]) => {
                    write_operand(registry, *lhs, own, out);
                    out.push_str(if *op == Operation::Add { " + " } else { "*" });
                    write_operand(registry, *rhs, own, out);
                }
                (Operation::Subtract | Operation::Divide, [lhs, rhs]) => {
                    write_operand(registry, *lhs, own, out);
                    out.push_str(if *op == Operation::Subtract { " - " } else { "/" });
                    write_operand(registry, *rhs, own + 1, out);
                }
                _ => {
                    let _ = write!(out, "{}(?)", op.symbol());
                }
            }
        }
    }
}

/// Tree dump of an expression with the current value of every node.
pub fn format_trace(registry: &Registry, target: NodeId) -> String {
    let mut ledger = Ledger::new();
    let mut output = String::new();

    if !registry.contains(target) {
        let _ = writeln!(output, "Error: Invalid Node ID {:?}", target);
        return output;
    }
    // Per-node failures are recorded in the ledger and shown inline.
    let _ = Evaluator::new(registry).compute(&[target], &mut ledger);

    let mut tracer = Tracer { registry, ledger: &ledger, visited_at_level: HashMap::new(), output };
    let title = match registry.name(target) {
        "" => format_expression(registry, target),
        name => name.to_string(),
    };
    let _ = writeln!(tracer.output, "EXPRESSION TRACE for '{}':", title);
    let _ = writeln!(tracer.output, "--------------------------------------------------");
    tracer.trace_node(target, 1, "");
    tracer.output
}

struct Tracer<'a> {
    registry: &'a Registry,
    ledger: &'a Ledger,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, node_id: NodeId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&node_id) {
            let _ = writeln!(self.output, "{}-> (Ref to L{})", prefix, first_seen);
            return;
        }
        self.visited_at_level.insert(node_id, level);

        let value = self.format_value(node_id);
        match self.registry.kind(node_id) {
            NodeKind::Constant(_) => {
                let _ = writeln!(self.output, "{}[L{}] {}", prefix, level, value);
            }
            NodeKind::Param(_) => {
                let _ = writeln!(self.output, "{}[L{}] {}{} -> Param", prefix, level, self.registry.name(node_id), value);
            }
            NodeKind::Variable(_) => {
                let fixed = self.registry.var_state(node_id).is_some_and(|s| s.fixed);
                let tag = if fixed { "Var (fixed)" } else { "Var" };
                let _ = writeln!(self.output, "{}[L{}] {}{} -> {}", prefix, level, self.registry.name(node_id), value, tag);
            }
            NodeKind::Formula(op) => {
                let _ = writeln!(self.output, "{}[L{}] ({}){}", prefix, level, op.symbol(), value);
                let parents = self.registry.get_parents(node_id);
                self.recurse_children(prefix, parents, level);
            }
        }
    }

    fn recurse_children(&mut self, prefix: &str, children: &[NodeId], level: usize) {
        let stem = build_child_stem(prefix);
        for (i, &child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`-- " } else { "|-- " };
            self.trace_node(child, level + 1, &format!("{}{}", stem, connector));
        }
    }

    fn format_value(&self, id: NodeId) -> String {
        match self.ledger.get(id) {
            Some(Ok(v)) => format!(" [{:.4}]", v),
            Some(Err(ComputationError::UnresolvedValue { .. })) => " [?]".to_string(),
            Some(Err(e)) => format!(" [Err: {}]", e),
            None => " [?]".to_string(),
        }
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`-- ", "    ").replace("|-- ", "|   ")
}
