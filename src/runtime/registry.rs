//! Name -> constructor table for directives.

use super::directive::Directive;
use crate::core::usage::UsageSchema;
use crate::directives;
use indexmap::IndexMap;

/// Builds a fresh, uninitialized directive.
pub type DirectiveFactory = Box<dyn Fn() -> Box<dyn Directive> + Send + Sync>;

pub struct DirectiveRegistry {
    factories: IndexMap<String, DirectiveFactory>,
}

impl DirectiveRegistry {
    /// A registry with no directives.
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// A registry holding every built-in directive.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        directives::register_builtins(&mut registry);
        registry
    }

    /// Register `name`, replacing any previous entry. Returns `true` if an
    /// entry was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Box<dyn Directive> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.into(), Box::new(factory))
            .is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Directive>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Usage schema of `name`, taken from a throwaway instance.
    pub fn usage(&self, name: &str) -> Option<UsageSchema> {
        self.create(name).map(|d| d.define())
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::aggregate_stats::AggregateStats;

    #[test]
    fn test_registry_builtins() {
        let registry = DirectiveRegistry::with_builtins();
        assert!(registry.contains("aggregate-stats"));
        assert!(!registry.contains("nope"));
        assert!(registry.create("nope").is_none());
        let usage = registry.usage("aggregate-stats").unwrap();
        assert_eq!(usage.directive(), "aggregate-stats");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["aggregate-stats"]);
    }

    #[test]
    fn test_registry_register_replaces() {
        let mut registry = DirectiveRegistry::empty();
        assert!(registry.is_empty());
        assert!(!registry.register("stats", || Box::new(AggregateStats::default())));
        assert!(registry.register("stats", || Box::new(AggregateStats::default())));
        assert_eq!(registry.len(), 1);
    }
}
