//! Execution target selection
//!
//! Input `i` goes to backend `i`. Inputs whose first argument is the
//! configuration-block marker always go to the primary backend, the last
//! entry of the roster.

use crate::coord::backend::BackendRef;
use crate::core::config::CoordinatorConfig;
use crate::core::errors::{EndorserError, Result};
use crate::model::{ChaincodeContext, ChaincodeInput};

/// One input bound to the backend that will run it
#[derive(Clone)]
pub struct Assignment {
    pub index: usize,
    pub backend: BackendRef,
    pub context: ChaincodeContext,
}

/// Chooses a backend for every input of a batch
pub struct TargetSelector<'a> {
    roster: &'a [BackendRef],
    config: &'a CoordinatorConfig,
}

impl<'a> TargetSelector<'a> {
    pub fn new(roster: &'a [BackendRef], config: &'a CoordinatorConfig) -> Self {
        Self { roster, config }
    }

    /// The backend reserved for configuration-block requests
    pub fn primary(&self) -> Option<&'a BackendRef> {
        self.roster.last()
    }

    pub fn is_config_block_request(&self, input: &ChaincodeInput) -> bool {
        input.function() == Some(self.config.config_block_marker.as_bytes())
    }

    /// Backend for `inputs[index]`
    pub fn select(&self, index: usize, inputs: &[ChaincodeInput]) -> Result<&'a BackendRef> {
        let input = inputs
            .get(index)
            .ok_or_else(|| EndorserError::routing(index, self.roster.len()))?;

        let backend = if self.is_config_block_request(input) {
            self.primary()
        } else {
            self.roster.get(index)
        };
        backend.ok_or_else(|| EndorserError::routing(index, self.roster.len()))
    }

    /// Version string a backend runs `name` under
    pub fn effective_version(&self, name: &str, version: &str, backend: &BackendRef) -> String {
        if self.config.is_system_chaincode(name) {
            version.to_string()
        } else {
            format!("{}-{}", version, backend.container_name())
        }
    }

    /// Route every input; fails before anything is dispatched
    pub fn plan(&self, name: &str, version: &str, inputs: &[ChaincodeInput]) -> Result<Vec<Assignment>> {
        (0..inputs.len())
            .map(|index| {
                let backend = self.select(index, inputs)?;
                let context =
                    ChaincodeContext::new(name, self.effective_version(name, version, backend));
                Ok(Assignment {
                    index,
                    backend: backend.clone(),
                    context,
                })
            })
            .collect()
    }
}
