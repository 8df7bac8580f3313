//! Ordering of change-units.
//!
//! Units run in lexicographic order of their names, independent of the order
//! the filesystem lists them in. Names must be chosen so that this order is
//! the intended execution order, e.g. fixed-width numeric prefixes
//! (`001_...`, `002_...`).

use std::collections::BTreeSet;

/// Names that are discovered but not yet applied, in ascending order.
pub fn pending<I>(discovered: I, applied: &BTreeSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut pending: Vec<String> = discovered
        .into_iter()
        .filter(|name| !applied.contains(name))
        .collect();
    pending.sort();
    pending.dedup();
    pending
}

/// The rollback target: the greatest applied name.
pub fn last_applied(applied: &BTreeSet<String>) -> Option<String> {
    applied.iter().next_back().cloned()
}
