//! Task and progress state machine.
//!
//! Each actor record carries a set of named tasks. Whether a task may start is
//! decided here from the actor's own tasks plus the LPA milestones (signed,
//! certified, paid). Pages use the same checks to decide what to show, and
//! mutating handlers run them again before they write.

use serde::{Deserialize, Serialize};

use crate::actor::ActorType;

pub mod attorney;
pub mod certificate_provider;
pub mod donor;
pub mod progress;
pub mod transition;

pub use progress::Progress;
pub use transition::{transition, Action, LpaStage, Outcome};

/// Result type for task transitions.
pub type Result<T> = std::result::Result<T, TaskError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("{task} cannot start: {reason}")]
    NotReady {
        task: &'static str,
        reason: &'static str,
    },

    #[error("{action:?} refused for {actor_type}: {reason}")]
    Refused {
        actor_type: ActorType,
        action: Action,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskState {
    pub fn is_not_started(self) -> bool {
        self == TaskState::NotStarted
    }

    pub fn is_in_progress(self) -> bool {
        self == TaskState::InProgress
    }

    pub fn is_completed(self) -> bool {
        self == TaskState::Completed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    #[default]
    NotStarted,
    InProgress,
    Pending,
    Completed,
}

/// One row of a task list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListItem {
    pub name: &'static str,
    pub path: &'static str,
    pub state: TaskState,
    pub enabled: bool,
}

pub(crate) fn require(condition: bool, task: &'static str, reason: &'static str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(TaskError::NotReady { task, reason })
    }
}
