use thiserror::Error;

use crate::{job::PathStatus, tile::GridId};

/// Why a path request didn't produce a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Every reachable tile was searched without reaching the goal.
    #[error("no route to the goal exists")]
    Unreachable,
    /// The goal can't be entered and no enterable tile was found within the proximity radius.
    #[error("the goal tile can't be entered and there's no open tile within range")]
    UnreachableGoal,
    /// The grid was removed while the search was queued or running.
    #[error("grid {0:?} no longer exists")]
    GridRemoved(GridId),
    /// The request's cancellation token was triggered.
    #[error("the search was cancelled")]
    Cancelled,
    /// The search ran longer than the configured iteration cap.
    #[error("the search gave up after {0} iterations")]
    SearchLimit(usize),
}

impl PathError {
    /// The terminal job status this error corresponds to.
    pub fn status(&self) -> PathStatus {
        match self {
            PathError::Cancelled => PathStatus::Cancelled,
            _ => PathStatus::Failed,
        }
    }
}
