//! Error types for task scheduling and part registry operations.

use thiserror::Error;

use crate::{PartId, TaskId, TechSkill, TechnicianId};

/// Failure of a single registry operation on one part.
///
/// Grouped tasks collect these per child and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartError {
    #[error("{0} not found")]
    NotFound(PartId),

    #[error("{0} is not installed on a unit")]
    NotInstalled(PartId),

    #[error("no replacement in stock for {part_id} ({kind})")]
    NoReplacement { part_id: PartId, kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IneligibleReason {
    /// The task cannot be worked at all right now.
    #[error("{0}")]
    Blocked(String),

    #[error("{skill} technicians cannot work on this unit")]
    WrongTechType { skill: TechSkill },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("technician {0} not found")]
    TechnicianNotFound(TechnicianId),

    /// Assignment refused; the task is unchanged.
    #[error("cannot assign task {task_id}: {reason}")]
    IneligibleAssignment {
        task_id: TaskId,
        reason: IneligibleReason,
    },

    #[error("task {0} has no technician assigned")]
    Unassigned(TaskId),

    #[error("task {task_id} needs {time_left} more minutes before it can be resolved")]
    NotReady { task_id: TaskId, time_left: u32 },

    #[error("task {0} is scheduled; unassign it first")]
    Scheduled(TaskId),
}
