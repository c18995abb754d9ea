// SPDX-License-Identifier: MIT

//! Expression tree to task graph
//!
//! One task per operation node, emitted in post-order so a task's
//! dependencies always carry smaller ids than the task itself.

use super::types::{
    Dependency, ExpressionId, Operand, Side, Task, TaskGraph, TaskId, TaskStatus,
};
use crate::calc::expression::{AstNode, Operator, Walk};

/// Decompose `ast` into tasks with ids starting at `first_id`
pub fn decompose(ast: &AstNode, expression_id: ExpressionId, first_id: TaskId) -> TaskGraph {
    let mut decomposer = Decomposer {
        expression_id,
        next_id: first_id,
        graph: TaskGraph::default(),
    };

    // How a parent refers to each finished subtree, innermost last
    let mut operands: Vec<Operand> = Vec::new();
    let mut steps = vec![Walk::Enter(ast)];

    while let Some(step) = steps.pop() {
        match step {
            Walk::Enter(AstNode::Literal(v)) => operands.push(Operand::Literal(*v)),
            Walk::Enter(AstNode::Operation { op, left, right }) => {
                steps.push(Walk::Exit(*op));
                steps.push(Walk::Enter(right));
                steps.push(Walk::Enter(left));
            }
            Walk::Exit(op) => {
                let (Some(right), Some(left)) = (operands.pop(), operands.pop()) else {
                    unreachable!("both subtrees are visited before their operation");
                };
                operands.push(decomposer.emit(op, left, right));
            }
        }
    }

    if let Some(Operand::PendingOn(root)) = operands.pop() {
        decomposer.graph.root = Some(root);
    }
    decomposer.graph
}

struct Decomposer {
    expression_id: ExpressionId,
    next_id: TaskId,
    graph: TaskGraph,
}

impl Decomposer {
    /// Add the task for one operation node whose operands are known
    fn emit(&mut self, op: Operator, left: Operand, right: Operand) -> Operand {
        let id = self.next_id;
        self.next_id += 1;

        for (operand, side) in [(left, Side::Left), (right, Side::Right)] {
            if let Operand::PendingOn(on) = operand {
                self.graph.dependencies.push(Dependency {
                    on,
                    dependent: id,
                    side,
                });
            }
        }

        let mut task = Task {
            id,
            expression_id: self.expression_id,
            node: self.graph.tasks.len(),
            op,
            left,
            right,
            status: TaskStatus::Blocked,
        };
        if task.is_resolved() {
            task.status = TaskStatus::Ready;
        }
        self.graph.tasks.push(task);

        Operand::PendingOn(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::expression::parse;

    fn graph_for(input: &str) -> TaskGraph {
        decompose(&parse(input).unwrap(), 1, 100)
    }

    #[test]
    fn test_literal_has_no_tasks() {
        let graph = graph_for("42");
        assert!(graph.is_empty());
        assert_eq!(graph.root, None);
        assert!(graph.dependencies.is_empty());
    }

    #[test]
    fn test_single_operation() {
        let graph = graph_for("2 + 3");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.root, Some(100));

        let task = &graph.tasks[0];
        assert_eq!(task.op, Operator::Add);
        assert_eq!(task.left, Operand::Literal(2.0));
        assert_eq!(task.right, Operand::Literal(3.0));
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(task.expression_id, 1);
    }

    #[test]
    fn test_dependent_operand_is_pending() {
        // 3 + (4 * 2): the addition must wait for the multiplication
        let graph = graph_for("3 + 4 * 2");
        assert_eq!(graph.len(), 2);

        let mul = &graph.tasks[0];
        assert_eq!(mul.id, 100);
        assert_eq!(mul.op, Operator::Multiply);
        assert_eq!(mul.status, TaskStatus::Ready);

        let add = &graph.tasks[1];
        assert_eq!(add.id, 101);
        assert_eq!(add.left, Operand::Literal(3.0));
        assert_eq!(add.right, Operand::PendingOn(100));
        assert_eq!(add.status, TaskStatus::Blocked);

        assert_eq!(graph.root, Some(101));
        assert_eq!(
            graph.dependencies,
            vec![Dependency {
                on: 100,
                dependent: 101,
                side: Side::Right
            }]
        );
    }

    #[test]
    fn test_independent_subtrees_are_both_ready() {
        let graph = graph_for("(1 + 2) * (3 - 4)");
        assert_eq!(graph.len(), 3);
        let ready = graph
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Ready)
            .count();
        assert_eq!(ready, 2);

        let root = graph.tasks.last().unwrap();
        assert_eq!(graph.root, Some(root.id));
        assert_eq!(root.left, Operand::PendingOn(100));
        assert_eq!(root.right, Operand::PendingOn(101));
        assert_eq!(graph.dependencies.len(), 2);
    }

    #[test]
    fn test_node_ids_follow_post_order() {
        let graph = graph_for("2 ^ 3 ^ 2");
        let nodes: Vec<_> = graph.tasks.iter().map(|t| t.node).collect();
        assert_eq!(nodes, vec![0, 1]);
        // Right-associative: the inner 3 ^ 2 runs first
        assert_eq!(graph.tasks[0].left, Operand::Literal(3.0));
        assert_eq!(graph.tasks[1].left, Operand::Literal(2.0));
        assert_eq!(graph.tasks[1].right, Operand::PendingOn(100));
    }

    #[test]
    fn test_dependencies_point_backwards() {
        let graph = graph_for("((1 + 2) * 3 - 4) / (5 ^ 2 + 6)");
        for dep in &graph.dependencies {
            assert!(dep.on < dep.dependent);
        }
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let input = format!("1{}", "+1".repeat(200_000));
        let graph = graph_for(&input);

        assert_eq!(graph.len(), 200_000);
        assert_eq!(graph.root, Some(100 + 199_999));
        assert_eq!(graph.tasks[0].status, TaskStatus::Ready);
        assert!(graph.tasks[1..]
            .iter()
            .all(|t| t.status == TaskStatus::Blocked && t.left == Operand::PendingOn(t.id - 1)));
    }
}
