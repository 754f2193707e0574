use schematic_core::{IdentifierDefaults, Routine, Sequence, Synonym, View};

use super::Comparer;

/// Compares views by definition and materialization.
///
/// View indexes are diffed separately by the differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewComparer;

impl Comparer<View> for ViewComparer {
    fn equals(&self, a: &View, b: &View) -> bool {
        a.definition.trim() == b.definition.trim() && a.is_materialized == b.is_materialized
    }
}

/// Compares every numeric and cycle setting of two sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceComparer;

impl Comparer<Sequence> for SequenceComparer {
    fn equals(&self, a: &Sequence, b: &Sequence) -> bool {
        a.start == b.start
            && a.increment == b.increment
            && a.min_value == b.min_value
            && a.max_value == b.max_value
            && a.cycle == b.cycle
            && a.cache_size == b.cache_size
    }
}

/// Compares synonyms by their qualified target.
#[derive(Debug, Clone, Default)]
pub struct SynonymComparer {
    defaults: IdentifierDefaults,
}

impl SynonymComparer {
    /// Creates a comparer that qualifies targets with `defaults`.
    #[must_use]
    pub const fn new(defaults: IdentifierDefaults) -> Self {
        Self { defaults }
    }
}

impl Comparer<Synonym> for SynonymComparer {
    fn equals(&self, a: &Synonym, b: &Synonym) -> bool {
        a.target.same_object(&b.target, &self.defaults)
    }
}

/// Compares routines by definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutineComparer;

impl Comparer<Routine> for RoutineComparer {
    fn equals(&self, a: &Routine, b: &Routine) -> bool {
        a.definition.trim() == b.definition.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematic_core::Identifier;

    #[test]
    fn test_view_comparer() {
        let a = View::new("v_users", "SELECT id FROM users");
        assert!(ViewComparer.equals(&a, &View::new("other", "SELECT id FROM users ")));
        assert!(!ViewComparer.equals(&a, &a.clone().materialized()));
        assert!(!ViewComparer.equals(&a, &View::new("v_users", "SELECT * FROM users")));
    }

    #[test]
    fn test_sequence_comparer() {
        let a = Sequence::new("seq", 1, 1);
        assert!(SequenceComparer.equals(&a, &Sequence::new("other", 1, 1)));
        assert!(!SequenceComparer.equals(&a, &Sequence::new("seq", 1, 2)));
        assert!(!SequenceComparer.equals(&a, &a.clone().cycle()));
        assert!(!SequenceComparer.equals(&a, &a.clone().cache(20)));
        assert!(!SequenceComparer.equals(&a, &a.clone().bounds(Some(0), None)));
    }

    #[test]
    fn test_synonym_comparer_qualifies_target() {
        let comparer = SynonymComparer::new(IdentifierDefaults::new().schema("dbo"));
        let a = Synonym::new("s", "users");
        let b = Synonym::new("s", Identifier::with_schema("dbo", "users"));
        let c = Synonym::new("s", Identifier::with_schema("audit", "users"));
        assert!(comparer.equals(&a, &b));
        assert!(!comparer.equals(&a, &c));
    }

    #[test]
    fn test_routine_comparer() {
        assert!(RoutineComparer.equals(
            &Routine::new("p", "BEGIN SELECT 1; END"),
            &Routine::new("p", "BEGIN SELECT 1; END\n")
        ));
        assert!(!RoutineComparer.equals(
            &Routine::new("p", "BEGIN SELECT 1; END"),
            &Routine::new("p", "BEGIN SELECT 2; END")
        ));
    }
}
