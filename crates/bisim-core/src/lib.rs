#![deny(clippy::print_stdout, clippy::print_stderr)]

//! Cycle-tolerant structural equality for arbitrarily shaped value graphs.
//!
//! Given two possibly self-referential or mutually-referential graphs of
//! [`Value`]s, [`deeply_equal`] decides whether they are structurally equal —
//! without requiring the values to implement their own equality and without
//! recursing forever on cycles. Cycle detection rests on a rollback
//! union-find ([`DisjointSet`]) which in turn rests on a persistent versioned
//! array ([`PersistentArray`]); both are exposed for reuse in other
//! backtracking algorithms.

pub mod compare;
pub mod disjoint_set;
pub mod persistent_array;
pub mod registry;
pub mod render;
pub mod value;

pub use compare::{
    CompareError, Comparison, Mismatch, MismatchKind, Path, PathStep, deeply_equal,
    deeply_equal_with,
};
pub use disjoint_set::{DisjointSet, DisjointSetError};
pub use persistent_array::{ArrayError, PersistentArray};
pub use registry::{ComparatorRegistry, Decomposition, RegistryError, Strategy};
pub use render::{describe, preview, report};
pub use value::{ArenaError, TypeTag, Value, ValueArena, ValueId};

/// Returns the current version of the bisim-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
