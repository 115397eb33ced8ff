//! Built-in directives.

pub mod aggregate_stats;

use crate::runtime::registry::DirectiveRegistry;

/// Register every built-in directive.
pub fn register_builtins(registry: &mut DirectiveRegistry) {
    registry.register(aggregate_stats::NAME, || {
        Box::new(aggregate_stats::AggregateStats::default())
    });
}
