//! Input decoration pipeline
//!
//! Decorators enrich a chaincode input with byte annotations before it is
//! dispatched. Decoration is best effort and has no error channel.

pub mod registry;

pub use registry::DecoratorRegistry;

use crate::model::{ChaincodeInput, Decorations, Proposal};
use std::sync::Arc;

/// A pluggable input decorator
pub trait Decorator: Send + Sync {
    /// Name used for registration and logging
    fn name(&self) -> &str;

    /// Return the input with any annotations this decorator adds
    fn decorate(&self, proposal: &Proposal, input: ChaincodeInput) -> ChaincodeInput;
}

/// Reset the input's decorations and run every decorator in order
pub fn apply_decorations(
    proposal: &Proposal,
    mut input: ChaincodeInput,
    decorators: &[Arc<dyn Decorator>],
) -> ChaincodeInput {
    input.decorations = Decorations::new();
    for decorator in decorators {
        input = decorator.decorate(proposal, input);
        tracing::trace!(
            decorator = decorator.name(),
            keys = input.decorations.len(),
            "Applied decorator"
        );
    }
    input
}

/// Decorator that stamps a fixed key/value onto every input
pub struct StaticDecorator {
    key: String,
    value: bytes::Bytes,
}

impl StaticDecorator {
    pub fn new(key: impl Into<String>, value: impl Into<bytes::Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Decorator for StaticDecorator {
    fn name(&self) -> &str {
        &self.key
    }

    fn decorate(&self, _proposal: &Proposal, mut input: ChaincodeInput) -> ChaincodeInput {
        input
            .decorations
            .insert(self.key.clone(), self.value.clone());
        input
    }
}
