// SPDX-License-Identifier: MIT

//! Task graph type definitions

use serde::{Deserialize, Serialize};

use crate::calc::expression::Operator;

/// Registry-assigned task identifier
pub type TaskId = u64;

/// Registry-assigned expression identifier
pub type ExpressionId = u64;

/// Post-order index of an operation node within its expression tree
pub type NodeId = usize;

/// One input of a task: a known value, or the output of another task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Literal(f64),
    PendingOn(TaskId),
}

impl Operand {
    /// The value, if the slot has been resolved
    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Literal(v) => Some(*v),
            Operand::PendingOn(_) => None,
        }
    }
}

/// Which operand slot of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Task lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting on at least one other task
    Blocked,
    /// Both operands known, waiting for a worker
    Ready,
    /// Handed to a worker
    Dispatched,
    /// Result (or failure) received
    Done,
    /// Owning expression failed before this task finished
    Abandoned,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Abandoned)
    }
}

/// A single binary operation extracted from an expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    /// Tree node this task resolves
    pub node: NodeId,
    pub op: Operator,
    pub left: Operand,
    pub right: Operand,
    pub status: TaskStatus,
}

impl Task {
    /// Both operand values, once neither slot is pending
    pub fn operands(&self) -> Option<(f64, f64)> {
        Some((self.left.value()?, self.right.value()?))
    }

    pub fn is_resolved(&self) -> bool {
        self.operands().is_some()
    }

    /// Fill a pending slot with a value. Returns false if the slot was already
    /// a literal, leaving it untouched.
    pub fn fill(&mut self, side: Side, value: f64) -> bool {
        let slot = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        match slot {
            Operand::PendingOn(_) => {
                *slot = Operand::Literal(value);
                true
            }
            Operand::Literal(_) => false,
        }
    }
}

/// `dependent` needs the output of `on` in its `side` slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub on: TaskId,
    pub dependent: TaskId,
    pub side: Side,
}

/// Output of decomposing one expression tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGraph {
    /// Tasks in emission (post-order) order
    pub tasks: Vec<Task>,
    pub dependencies: Vec<Dependency>,
    /// Task resolving the tree root; `None` when the tree is a bare literal
    pub root: Option<TaskId>,
}

impl TaskGraph {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(left: Operand, right: Operand) -> Task {
        Task {
            id: 1,
            expression_id: 1,
            node: 0,
            op: Operator::Add,
            left,
            right,
            status: TaskStatus::Blocked,
        }
    }

    #[test]
    fn test_operand_value() {
        assert_eq!(Operand::Literal(2.5).value(), Some(2.5));
        assert_eq!(Operand::PendingOn(3).value(), None);
    }

    #[test]
    fn test_task_fill() {
        let mut task = make_task(Operand::PendingOn(4), Operand::Literal(1.0));
        assert!(!task.is_resolved());

        assert!(task.fill(Side::Left, 7.0));
        assert!(task.is_resolved());
        assert_eq!(task.operands(), Some((7.0, 1.0)));

        // Literal slots are never overwritten
        assert!(!task.fill(Side::Right, 99.0));
        assert_eq!(task.operands(), Some((7.0, 1.0)));
    }

    #[test]
    fn test_status_terminal() {
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Abandoned.is_terminal());
        assert!(!TaskStatus::Dispatched.is_terminal());
        assert!(!TaskStatus::Ready.is_terminal());
    }

    #[test]
    fn test_operand_serialization() {
        assert_eq!(
            serde_json::to_value(Operand::PendingOn(5)).unwrap(),
            serde_json::json!({"pending_on": 5})
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Dispatched).unwrap(),
            serde_json::json!("dispatched")
        );
    }
}
