//! Core types for coordinator-based execution

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::errors::{EndorserError, Result};
use crate::model::{ChaincodeEvent, ExecutionOutput, Response};

/// Outcome of one task: exactly one per dispatched input
#[derive(Clone, Debug, PartialEq)]
pub struct TaskOutcome {
    /// Input index the task was bound to
    pub index: usize,
    /// Container tag of the backend that ran it
    pub backend: String,
    pub response: Option<Response>,
    pub event: Option<ChaincodeEvent>,
    pub error: Option<EndorserError>,
    pub completed_at: DateTime<Utc>,
}

impl TaskOutcome {
    /// Build an outcome from a backend call result
    pub fn from_result(index: usize, backend: impl Into<String>, result: Result<ExecutionOutput>) -> Self {
        let (response, event, error) = match result {
            Ok(output) => (Some(output.response), output.event, None),
            Err(e) => (None, None, Some(e)),
        };
        Self {
            index,
            backend: backend.into(),
            response,
            event,
            error,
            completed_at: Utc::now(),
        }
    }

    /// Outcome for a task that ended without reporting
    pub fn aborted(index: usize, backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_result(index, backend, Err(EndorserError::task_aborted(index, message)))
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Per-index status view
    pub fn result(&self) -> Result<ExecutionOutput> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(ExecutionOutput::new(
                self.response.clone().unwrap_or_default(),
                self.event.clone(),
            )),
        }
    }
}

/// Events observed by hooks while a batch runs
#[derive(Clone, Debug)]
pub enum TaskEvent {
    TaskDispatched {
        index: usize,
        backend: String,
    },
    TaskCompleted {
        index: usize,
        backend: String,
    },
    TaskFailed {
        index: usize,
        backend: String,
        error: EndorserError,
    },
}

impl TaskEvent {
    pub(crate) fn for_outcome(outcome: &TaskOutcome) -> Self {
        match &outcome.error {
            None => TaskEvent::TaskCompleted {
                index: outcome.index,
                backend: outcome.backend.clone(),
            },
            Some(error) => TaskEvent::TaskFailed {
                index: outcome.index,
                backend: outcome.backend.clone(),
                error: error.clone(),
            },
        }
    }
}

/// Aggregate result of one batch
#[derive(Clone, Debug)]
pub struct BatchResult {
    pub batch_id: Uuid,
    /// Responses shaped by the configured aggregation mode
    pub responses: Vec<Option<Response>>,
    /// Events shaped by the configured aggregation mode
    pub events: Vec<Option<ChaincodeEvent>>,
    /// Single error representing the batch
    pub error: Option<EndorserError>,
    /// Every task outcome, in input order
    pub outcomes: Vec<TaskOutcome>,
    /// Input indices in the order their tasks completed
    pub completion_order: Vec<usize>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Indices of the inputs whose task failed
    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.index)
            .collect()
    }

    /// Per-index results in input order
    pub fn results(&self) -> Vec<Result<ExecutionOutput>> {
        self.outcomes.iter().map(TaskOutcome::result).collect()
    }

    /// Split into the (responses, events, error) triple handed to the endorser
    pub fn into_parts(self) -> (Vec<Option<Response>>, Vec<Option<ChaincodeEvent>>, Option<EndorserError>) {
        (self.responses, self.events, self.error)
    }
}
