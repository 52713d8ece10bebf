//! Event hook system for coordinator-based execution
//!
//! Hooks observe task events; they never alter outcomes.

use async_trait::async_trait;
use super::types::TaskEvent;
use std::sync::Arc;
use uuid::Uuid;

/// Context provided to hooks for processing events
#[derive(Clone, Debug)]
pub struct HookContext {
    pub batch_id: Uuid,
    pub tx_id: String,
    pub chaincode: String,
    /// Number of inputs in the batch
    pub size: usize,
}

impl HookContext {
    pub fn new(batch_id: Uuid, tx_id: impl Into<String>, chaincode: impl Into<String>, size: usize) -> Self {
        Self {
            batch_id,
            tx_id: tx_id.into(),
            chaincode: chaincode.into(),
            size,
        }
    }
}

/// Event hook trait
#[async_trait]
pub trait ExecutionHook: Send + Sync {
    /// Handle a task event
    async fn handle(&self, ctx: &HookContext, event: &TaskEvent);

    /// Optional: Called before the first task is dispatched
    async fn on_start(&self, _ctx: &HookContext) {}

    /// Optional: Called once all outcomes are collected
    async fn on_complete(&self, _ctx: &HookContext, _success: bool) {}
}

/// Composite hook that chains multiple hooks
#[derive(Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn ExecutionHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Arc<dyn ExecutionHook>) {
        self.hooks.push(hook);
    }
}

#[async_trait]
impl ExecutionHook for CompositeHook {
    async fn handle(&self, ctx: &HookContext, event: &TaskEvent) {
        for hook in &self.hooks {
            hook.handle(ctx, event).await;
        }
    }

    async fn on_start(&self, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_start(ctx).await;
        }
    }

    async fn on_complete(&self, ctx: &HookContext, success: bool) {
        for hook in &self.hooks {
            hook.on_complete(ctx, success).await;
        }
    }
}

/// Logging hook
pub struct LoggingHook;

#[async_trait]
impl ExecutionHook for LoggingHook {
    async fn handle(&self, ctx: &HookContext, event: &TaskEvent) {
        match event {
            TaskEvent::TaskDispatched { index, backend } => {
                tracing::debug!(batch = %ctx.batch_id, index, backend = %backend, "Task dispatched");
            }
            TaskEvent::TaskCompleted { index, backend } => {
                tracing::info!(batch = %ctx.batch_id, index, backend = %backend, "Task completed");
            }
            TaskEvent::TaskFailed { index, backend, error } => {
                tracing::error!(batch = %ctx.batch_id, index, backend = %backend, "Task failed: {}", error);
            }
        }
    }

    async fn on_complete(&self, ctx: &HookContext, success: bool) {
        tracing::info!(
            batch = %ctx.batch_id,
            tx_id = %ctx.tx_id,
            chaincode = %ctx.chaincode,
            success,
            "Batch finished"
        );
    }
}
