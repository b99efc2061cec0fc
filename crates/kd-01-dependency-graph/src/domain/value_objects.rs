//! Value objects for the Dependency Graph

use serde::{Deserialize, Serialize};
use shared_types::{IMPLICIT_REFERENCE_PREFIX, ORDERING_HINT_PREFIX};

/// How a dependency between two configs was declared
///
/// Variants are ordered by precedence: when one dependency is declared
/// several ways, the edge keeps the lowest kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// User-declared reference parameter
    Reference,
    /// Literal id found in template content and rewritten into a reference
    ImplicitReference,
    /// Reference synthesized to force an ordering between resource types
    OrderingHint,
}

impl DependencyKind {
    /// Classify by the name of the parameter that carries the reference.
    pub fn for_parameter(name: &str) -> Self {
        if name.starts_with(IMPLICIT_REFERENCE_PREFIX) {
            DependencyKind::ImplicitReference
        } else if name.starts_with(ORDERING_HINT_PREFIX) {
            DependencyKind::OrderingHint
        } else {
            DependencyKind::Reference
        }
    }
}
