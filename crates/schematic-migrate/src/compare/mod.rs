//! Structural equality of schema entities.
//!
//! A [`Comparer`] answers one question: has this entity changed? It never
//! decides whether two entities are the same object; that is the job of
//! [`crate::lookup`]. Names are excluded from every member comparer, so a
//! renamed key with identical columns compares equal. Enablement flags are
//! excluded as well.

mod keys;
mod objects;
mod table;

pub use keys::{
    CheckComparer, ColumnComparer, IndexComparer, KeyComparer, RelationalKeyComparer,
    TriggerComparer, TypeComparer,
};
pub use objects::{RoutineComparer, SequenceComparer, SynonymComparer, ViewComparer};
pub use table::TableComparer;

/// Decides whether two entities of the same kind are structurally equal.
pub trait Comparer<T: ?Sized> {
    /// Returns true if `a` and `b` are equal for migration purposes.
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// Returns true if `a` and `b` hold the same elements under `eq`,
/// regardless of order.
pub(crate) fn same_elements<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let found = b
            .iter()
            .enumerate()
            .find(|(i, y)| !used[*i] && eq(x, *y))
            .map(|(i, _)| i);
        found.map(|i| used[i] = true).is_some()
    })
}
