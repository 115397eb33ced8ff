//! Execution context shared by every directive of one recipe run.

use super::row::Value;
use crate::core::config::Environment;
use rustc_hash::FxHashMap;

/// Lifetime of a transient store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Lives for the whole run.
    Global,
    /// Cleared after every batch.
    Local,
}

/// Key/value memory carried between batches of one run.
///
/// Entries are keyed by `(scope, owner, key)` where `owner` is the
/// directive's position in the recipe, so two directives using the same
/// key never see each other's values.
#[derive(Debug, Default)]
pub struct TransientStore {
    entries: FxHashMap<(Scope, usize, String), Value>,
}

impl TransientStore {
    pub fn get(&self, scope: Scope, owner: usize, key: &str) -> Option<&Value> {
        self.entries.get(&(scope, owner, key.to_string()))
    }

    pub fn set(&mut self, scope: Scope, owner: usize, key: &str, value: Value) {
        self.entries.insert((scope, owner, key.to_string()), value);
    }

    pub fn remove(&mut self, scope: Scope, owner: usize, key: &str) -> Option<Value> {
        self.entries.remove(&(scope, owner, key.to_string()))
    }

    /// Drop every entry of `scope`.
    pub fn clear(&mut self, scope: Scope) {
        self.entries.retain(|(s, _, _), _| *s != scope);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The transient store as seen by one directive: a flat key namespace.
#[derive(Debug)]
pub struct ScopedStore<'a> {
    store: &'a mut TransientStore,
    owner: usize,
}

impl ScopedStore<'_> {
    pub fn get(&self, scope: Scope, key: &str) -> Option<&Value> {
        self.store.get(scope, self.owner, key)
    }

    pub fn set(&mut self, scope: Scope, key: &str, value: impl Into<Value>) {
        self.store.set(scope, self.owner, key, value.into());
    }

    pub fn remove(&mut self, scope: Scope, key: &str) -> Option<Value> {
        self.store.remove(scope, self.owner, key)
    }
}

/// Run-scoped context: environment, transient store and final-batch flag.
#[derive(Debug)]
pub struct ExecutorContext {
    environment: Environment,
    store: TransientStore,
    final_batch: bool,
    current: usize,
    batches: usize,
}

impl ExecutorContext {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            store: TransientStore::default(),
            final_batch: false,
            current: 0,
            batches: 0,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Whether the batch being executed is the last one of the run.
    pub fn is_final_batch(&self) -> bool {
        self.final_batch
    }

    /// Number of batches started so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Store view for the directive currently executing.
    pub fn transient_store(&mut self) -> ScopedStore<'_> {
        ScopedStore {
            store: &mut self.store,
            owner: self.current,
        }
    }

    /// Whole store, unscoped.
    pub fn store(&self) -> &TransientStore {
        &self.store
    }

    /// Start a batch. The final flag never goes back to `false`.
    pub(crate) fn begin_batch(&mut self, is_final: bool) {
        self.final_batch |= is_final;
        self.batches += 1;
    }

    pub(crate) fn enter(&mut self, owner: usize) {
        self.current = owner;
    }

    pub(crate) fn end_batch(&mut self) {
        self.store.clear(Scope::Local);
    }
}

impl Default for ExecutorContext {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_final_flag_is_monotonic() {
        let mut ctx = ExecutorContext::new(Environment::Testing);
        assert!(!ctx.is_final_batch());
        ctx.begin_batch(true);
        assert!(ctx.is_final_batch());
        ctx.begin_batch(false);
        assert!(ctx.is_final_batch());
        assert_eq!(ctx.batches(), 2);
        assert_eq!(ctx.environment(), Environment::Testing);
    }

    #[test]
    fn test_context_store_is_namespaced_per_directive() {
        let mut ctx = ExecutorContext::default();
        ctx.enter(0);
        ctx.transient_store().set(Scope::Global, "total", 1i64);
        ctx.enter(1);
        assert!(ctx.transient_store().get(Scope::Global, "total").is_none());
        ctx.transient_store().set(Scope::Global, "total", 2i64);
        ctx.enter(0);
        assert_eq!(
            ctx.transient_store().get(Scope::Global, "total"),
            Some(&Value::Int(1))
        );
        assert_eq!(ctx.store().len(), 2);
    }

    #[test]
    fn test_context_local_scope_cleared_per_batch() {
        let mut ctx = ExecutorContext::default();
        ctx.begin_batch(false);
        let mut store = ctx.transient_store();
        store.set(Scope::Local, "seen", true);
        store.set(Scope::Global, "kept", true);
        ctx.end_batch();
        let store = ctx.transient_store();
        assert!(store.get(Scope::Local, "seen").is_none());
        assert!(store.get(Scope::Global, "kept").is_some());
    }

    #[test]
    fn test_context_remove() {
        let mut ctx = ExecutorContext::default();
        let mut store = ctx.transient_store();
        store.set(Scope::Global, "k", "v");
        assert_eq!(store.remove(Scope::Global, "k"), Some(Value::Text("v".into())));
        assert!(store.remove(Scope::Global, "k").is_none());
        assert!(ctx.store().is_empty());
    }
}
