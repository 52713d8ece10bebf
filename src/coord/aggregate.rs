//! Result aggregation
//!
//! Folds task outcomes into the batch result. Outcomes are always kept per
//! input index; the response/event lists are shaped by [`AggregationMode`].

use uuid::Uuid;

use crate::coord::types::{BatchResult, TaskOutcome};
use crate::core::config::AggregationMode;
use crate::core::errors::EndorserError;
use crate::model::{ChaincodeEvent, Response};

pub struct Aggregator {
    mode: AggregationMode,
    slots: Vec<Option<TaskOutcome>>,
    completion_order: Vec<usize>,
    responses: Vec<Option<Response>>,
    events: Vec<Option<ChaincodeEvent>>,
    last_error: Option<EndorserError>,
}

impl Aggregator {
    pub fn new(mode: AggregationMode, expected: usize) -> Self {
        Self {
            mode,
            slots: vec![None; expected],
            completion_order: Vec::with_capacity(expected),
            responses: Vec::with_capacity(expected),
            events: Vec::with_capacity(expected),
            last_error: None,
        }
    }

    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    /// Number of distinct outcomes collected so far
    pub fn received(&self) -> usize {
        self.completion_order.len()
    }

    pub fn is_complete(&self) -> bool {
        self.received() >= self.expected()
    }

    /// Indices still waiting for an outcome
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Record one outcome. Returns false when the index is unknown or
    /// already filled; such outcomes are not counted.
    pub fn push(&mut self, outcome: TaskOutcome) -> bool {
        let index = outcome.index;
        match self.slots.get(index) {
            Some(None) => {}
            _ => {
                tracing::warn!(index, "Ignoring duplicate or out-of-range outcome");
                return false;
            }
        }

        self.completion_order.push(index);
        if self.mode == AggregationMode::CompletionOrder {
            self.responses.push(outcome.response.clone());
            self.events.push(outcome.event.clone());
            if let Some(err) = &outcome.error {
                // a failure takes over slot 0
                self.responses[0] = outcome.response.clone();
                self.events[0] = outcome.event.clone();
                self.last_error = Some(err.clone());
            }
        }
        self.slots[index] = Some(outcome);
        true
    }

    /// Produce the batch result
    ///
    /// Slots that never received an outcome are filled with an aborted
    /// outcome so every input is accounted for.
    pub fn finish(mut self, batch_id: Uuid, backends: &[String]) -> BatchResult {
        for index in self.missing() {
            let backend = backends.get(index).cloned().unwrap_or_default();
            self.push(TaskOutcome::aborted(
                index,
                backend,
                "task ended without reporting an outcome",
            ));
        }

        let outcomes: Vec<TaskOutcome> = self.slots.into_iter().flatten().collect();

        let (responses, events, error) = match self.mode {
            AggregationMode::CompletionOrder => (self.responses, self.events, self.last_error),
            AggregationMode::InputOrder => (
                outcomes.iter().map(|o| o.response.clone()).collect(),
                outcomes.iter().map(|o| o.event.clone()).collect(),
                outcomes.iter().find_map(|o| o.error.clone()),
            ),
        };

        BatchResult {
            batch_id,
            responses,
            events,
            error,
            outcomes,
            completion_order: self.completion_order,
        }
    }
}
