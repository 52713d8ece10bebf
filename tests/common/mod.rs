//! Shared fixtures: instrumented backends and tracing setup

#![allow(dead_code)]

use async_trait::async_trait;
use endorser::{
    BackendRef, ChaincodeContext, ChaincodeEvent, ChaincodeInput, EndorserError,
    ExecutionBackend, ExecutionOutput, Response, Result, TransactionParams,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
    Panic,
}

/// Tracks how many calls run at once across a set of backends
#[derive(Default)]
pub struct Concurrency {
    current: AtomicUsize,
    pub peak: AtomicUsize,
}

/// One recorded backend call
#[derive(Clone, Debug)]
pub struct Call {
    pub context: ChaincodeContext,
    pub input: ChaincodeInput,
    pub params: TransactionParams,
}

/// Backend with scripted delay and result that records every call
pub struct MockBackend {
    name: String,
    delay: Duration,
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<Call>>,
    concurrency: Option<Arc<Concurrency>>,
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: Duration::ZERO,
            behavior: Behavior::Succeed,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            concurrency: None,
        }
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn track(mut self, concurrency: Arc<Concurrency>) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Call> {
        self.seen.lock().clone()
    }

    /// Response this backend returns on success
    pub fn response(name: &str) -> Response {
        Response::ok(name.to_string())
    }

    pub fn event(name: &str) -> ChaincodeEvent {
        ChaincodeEvent {
            chaincode_id: "mycc".to_string(),
            tx_id: String::new(),
            event_name: name.to_string(),
            payload: Default::default(),
        }
    }

    pub fn error(name: &str) -> EndorserError {
        EndorserError::backend(name, "scripted failure")
    }
}

#[async_trait]
impl ExecutionBackend for MockBackend {
    fn container_name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        tx_params: &TransactionParams,
        ctx: &ChaincodeContext,
        input: &ChaincodeInput,
    ) -> Result<ExecutionOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(Call {
            context: ctx.clone(),
            input: input.clone(),
            params: tx_params.clone(),
        });

        if let Some(c) = &self.concurrency {
            let now = c.current.fetch_add(1, Ordering::SeqCst) + 1;
            c.peak.fetch_max(now, Ordering::SeqCst);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(c) = &self.concurrency {
            c.current.fetch_sub(1, Ordering::SeqCst);
        }

        match self.behavior {
            Behavior::Succeed => Ok(ExecutionOutput::new(
                Self::response(&self.name),
                Some(Self::event(&self.name)),
            )),
            Behavior::Fail => Err(Self::error(&self.name)),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("backend {} crashed", self.name),
        }
    }
}

/// Build a roster; returns the concrete handles for inspection too
pub fn roster(backends: Vec<MockBackend>) -> (Vec<Arc<MockBackend>>, Vec<BackendRef>) {
    let mocks: Vec<Arc<MockBackend>> = backends.into_iter().map(Arc::new).collect();
    let refs = mocks.iter().map(|m| m.clone() as BackendRef).collect();
    (mocks, refs)
}

pub fn invoke_inputs(n: usize) -> Vec<ChaincodeInput> {
    (0..n)
        .map(|i| ChaincodeInput::from_args(["invoke".to_string(), i.to_string()]))
        .collect()
}
