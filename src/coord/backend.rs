//! Execution backends
//!
//! A backend runs one chaincode invocation inside its own container set.
//! Backends are shared read-only between the tasks of a batch.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::errors::{EndorserError, Result};
use crate::model::{
    ChaincodeContext, ChaincodeDefinition, ChaincodeDeploymentSpec, ChaincodeInput,
    ExecutionOutput, TransactionParams,
};
use crate::peer::QueryExecutor;

/// Lifecycle lookups served by a backend
#[async_trait]
pub trait ChaincodeLifecycle: Send + Sync {
    async fn chaincode_definition(
        &self,
        name: &str,
        query: &dyn QueryExecutor,
    ) -> Result<ChaincodeDefinition>;
}

/// A named executor capable of running one chaincode invocation
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Container tag used to qualify chaincode versions on this backend
    fn container_name(&self) -> &str;

    /// Execute one invocation
    async fn execute(
        &self,
        tx_params: &TransactionParams,
        ctx: &ChaincodeContext,
        input: &ChaincodeInput,
    ) -> Result<ExecutionOutput>;

    /// Run the legacy init of a deployment
    ///
    /// Defaults to executing the spec's input flagged as init.
    async fn execute_legacy_init(
        &self,
        tx_params: &TransactionParams,
        ctx: &ChaincodeContext,
        spec: &ChaincodeDeploymentSpec,
    ) -> Result<ExecutionOutput> {
        let mut input = spec.chaincode_spec.input.clone();
        input.is_init = true;
        self.execute(tx_params, ctx, &input).await
    }

    /// Lifecycle provider, if this backend carries one
    fn lifecycle(&self) -> Option<Arc<dyn ChaincodeLifecycle>> {
        None
    }
}

/// Shorthand used by the coordinator and the facade
pub type BackendRef = Arc<dyn ExecutionBackend>;

/// Lifecycle lookup on a backend, failing when it has none
pub(crate) fn require_lifecycle(
    backend: &BackendRef,
    chaincode: &str,
) -> Result<Arc<dyn ChaincodeLifecycle>> {
    backend.lifecycle().ok_or_else(|| {
        EndorserError::chaincode(
            chaincode,
            format!(
                "backend {} has no lifecycle provider",
                backend.container_name()
            ),
        )
    })
}
