//! Ordered registry of input decorators

use std::sync::Arc;
use parking_lot::RwLock;
use crate::decoration::Decorator;

/// Registry for decorators; lookup preserves registration order
#[derive(Clone)]
pub struct DecoratorRegistry {
    decorators: Arc<RwLock<Vec<Arc<dyn Decorator>>>>,
}

impl DecoratorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            decorators: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a decorator, replacing any previous one with the same name
    /// in place
    pub fn register(&self, decorator: Arc<dyn Decorator>) {
        let mut decorators = self.decorators.write();
        match decorators.iter().position(|d| d.name() == decorator.name()) {
            Some(pos) => decorators[pos] = decorator,
            None => decorators.push(decorator),
        }
    }

    /// Snapshot of the registered decorators in order
    pub fn lookup(&self) -> Vec<Arc<dyn Decorator>> {
        self.decorators.read().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decorators.read().iter().any(|d| d.name() == name)
    }

    /// List all registered decorator names
    pub fn list(&self) -> Vec<String> {
        self.decorators
            .read()
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.decorators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.read().is_empty()
    }
}

impl Default for DecoratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::StaticDecorator;

    #[test]
    fn test_register_keeps_order() {
        let registry = DecoratorRegistry::new();
        registry.register(Arc::new(StaticDecorator::new("b", "1")));
        registry.register(Arc::new(StaticDecorator::new("a", "2")));
        registry.register(Arc::new(StaticDecorator::new("b", "3")));

        assert_eq!(registry.list(), vec!["b".to_string(), "a".to_string()]);
        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 2);
    }
}
