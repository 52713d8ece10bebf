//! Coordinator - the heart of parallel execution
//!
//! One task per input is spawned against its selected backend. Every task
//! reports a single `TaskOutcome` over a shared unbounded channel, so the
//! response, event and error of one invocation always travel together and
//! buffering never depends on the batch size.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::coord::aggregate::Aggregator;
use crate::coord::backend::BackendRef;
use crate::coord::hooks::{ExecutionHook, HookContext};
use crate::coord::router::{Assignment, TargetSelector};
use crate::coord::types::{BatchResult, TaskEvent, TaskOutcome};
use crate::core::config::CoordinatorConfig;
use crate::core::errors::{EndorserError, Result};
use crate::model::{ChaincodeInput, TransactionParams};

/// Coordinator for parallel multi-backend execution
pub struct Coordinator {
    roster: Vec<BackendRef>,
    config: CoordinatorConfig,
    hooks: Vec<Arc<dyn ExecutionHook>>,
}

impl Coordinator {
    /// Create a new coordinator over a fixed backend roster
    ///
    /// The last backend of the roster is the primary one.
    pub fn new(roster: Vec<BackendRef>, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        if roster.is_empty() {
            return Err(EndorserError::configuration(
                "backend roster must not be empty",
            ));
        }
        Ok(Self {
            roster,
            config,
            hooks: Vec::new(),
        })
    }

    /// Attach an observer hook
    pub fn with_hook(mut self, hook: Arc<dyn ExecutionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn roster(&self) -> &[BackendRef] {
        &self.roster
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn selector(&self) -> TargetSelector<'_> {
        TargetSelector::new(&self.roster, &self.config)
    }

    /// Run every input concurrently and aggregate the outcomes
    ///
    /// Inputs are expected to be decorated already. Returns an error only
    /// when the batch cannot be dispatched at all (empty batch, routing
    /// failure); backend failures are reported inside the `BatchResult`.
    pub async fn execute(
        &self,
        tx_params: &TransactionParams,
        chaincode_name: &str,
        chaincode_version: &str,
        inputs: Vec<ChaincodeInput>,
    ) -> Result<BatchResult> {
        if inputs.is_empty() {
            return Err(EndorserError::configuration("batch must contain at least one input"));
        }

        let plan = self
            .selector()
            .plan(chaincode_name, chaincode_version, &inputs)?;
        let backend_names: Vec<String> = plan
            .iter()
            .map(|a| a.backend.container_name().to_string())
            .collect();
        let expected = plan.len();

        let batch_id = Uuid::new_v4();
        let hook_ctx = HookContext::new(batch_id, tx_params.tx_id.clone(), chaincode_name, expected);
        info!(
            batch = %batch_id,
            tx_id = %tx_params.tx_id,
            chaincode = chaincode_name,
            size = expected,
            "Dispatching chaincode batch"
        );

        for hook in &self.hooks {
            hook.on_start(&hook_ctx).await;
        }

        let semaphore = self
            .config
            .max_parallel
            .map(|permits| Arc::new(Semaphore::new(permits)));
        let (tx, mut rx) = mpsc::unbounded_channel::<TaskOutcome>();

        for (assignment, input) in plan.into_iter().zip(inputs) {
            let event = TaskEvent::TaskDispatched {
                index: assignment.index,
                backend: assignment.backend.container_name().to_string(),
            };
            for hook in &self.hooks {
                hook.handle(&hook_ctx, &event).await;
            }

            spawn_worker(
                assignment,
                input,
                tx_params,
                semaphore.clone(),
                self.config.task_timeout_ms,
                tx.clone(),
            );
        }
        // Only workers hold senders now; a closed channel means every
        // worker has finished or died.
        drop(tx);

        let mut aggregator = Aggregator::new(self.config.aggregation, expected);
        while !aggregator.is_complete() {
            let outcome = match rx.recv().await {
                Some(outcome) => outcome,
                None => {
                    error!(
                        batch = %batch_id,
                        missing = ?aggregator.missing(),
                        "Workers exited without reporting"
                    );
                    break;
                }
            };

            debug!(
                batch = %batch_id,
                index = outcome.index,
                backend = %outcome.backend,
                success = outcome.is_success(),
                "Collected task outcome"
            );
            let event = TaskEvent::for_outcome(&outcome);
            for hook in &self.hooks {
                hook.handle(&hook_ctx, &event).await;
            }
            aggregator.push(outcome);
        }

        let result = aggregator.finish(batch_id, &backend_names);

        for hook in &self.hooks {
            hook.on_complete(&hook_ctx, result.is_success()).await;
        }
        match &result.error {
            None => info!(batch = %batch_id, "Chaincode batch completed"),
            Some(e) => warn!(
                batch = %batch_id,
                failed = ?result.failed_indices(),
                "Chaincode batch completed with failures: {}",
                e
            ),
        }

        Ok(result)
    }
}

/// Spawn one worker bound to an assignment
fn spawn_worker(
    assignment: Assignment,
    input: ChaincodeInput,
    tx_params: &TransactionParams,
    semaphore: Option<Arc<Semaphore>>,
    timeout_ms: Option<u64>,
    out: mpsc::UnboundedSender<TaskOutcome>,
) {
    let Assignment {
        index,
        backend,
        context,
    } = assignment;

    let mut params = tx_params.clone();
    params.proposal_decorations = input.decorations.clone();

    tokio::spawn(async move {
        let backend_name = backend.container_name().to_string();

        let _permit = match semaphore {
            Some(sem) => match sem.acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    let _ = out.send(TaskOutcome::aborted(index, backend_name, e.to_string()));
                    return;
                }
            },
            None => None,
        };

        debug!(index, backend = %backend_name, version = %context.version, "Executing chaincode");
        let call = backend.execute(&params, &context, &input);
        let result = match timeout_ms {
            Some(ms) => match tokio::time::timeout(std::time::Duration::from_millis(ms), call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(index, backend = %backend_name, timeout_ms = ms, "Chaincode execution timed out");
                    Err(EndorserError::timeout(
                        format!("execute {} on {}", context.name, backend_name),
                        ms,
                    ))
                }
            },
            None => call.await,
        };

        // The receiver only goes away if the caller dropped the batch future
        let _ = out.send(TaskOutcome::from_result(index, backend_name, result));
    });
}
