//! Matching entities between an existing and a target schema.
//!
//! Named objects are matched by qualified identifier ([`build_lookup`] and
//! [`partition`]). Constraints whose names are optional are matched by name
//! first and by content second ([`match_constraints`]), so a constraint
//! that only gained or lost its name is still recognized as the same one.

use indexmap::IndexMap;
use schematic_core::{Identifier, IdentifierDefaults};

/// Builds an insertion-ordered map from qualified identifier to entity.
///
/// If two entities share an identifier, the first one wins.
pub fn build_lookup<'a, E, F>(
    entities: &'a [E],
    defaults: &IdentifierDefaults,
    key_fn: F,
) -> IndexMap<Identifier, &'a E>
where
    F: Fn(&E) -> &Identifier,
{
    let mut lookup = IndexMap::with_capacity(entities.len());
    for entity in entities {
        lookup
            .entry(key_fn(entity).qualify(defaults))
            .or_insert(entity);
    }
    lookup
}

/// Entities classified by presence in the existing and target lookups.
#[derive(Debug)]
pub struct Partition<'a, E> {
    /// Present in the target only, in target order.
    pub to_create: Vec<&'a E>,
    /// Present in the existing schema only, in existing order.
    pub to_drop: Vec<&'a E>,
    /// Present in both, as `(existing, target)`, in target order.
    pub shared: Vec<(&'a E, &'a E)>,
}

/// Splits two lookups into created, dropped and shared entities.
#[must_use]
pub fn partition<'a, E>(
    existing: &IndexMap<Identifier, &'a E>,
    target: &IndexMap<Identifier, &'a E>,
) -> Partition<'a, E> {
    let mut to_create = Vec::new();
    let mut shared = Vec::new();
    for (key, &entity) in target {
        match existing.get(key) {
            Some(&current) => shared.push((current, entity)),
            None => to_create.push(entity),
        }
    }

    let to_drop = existing
        .iter()
        .filter(|(key, _)| !target.contains_key(*key))
        .map(|(_, &entity)| entity)
        .collect();

    Partition {
        to_create,
        to_drop,
        shared,
    }
}

/// Constraints classified by [`match_constraints`].
#[derive(Debug)]
pub struct ConstraintMatches<'a, E> {
    /// Pairs judged to be the same constraint, as `(existing, target)`.
    pub matched: Vec<(&'a E, &'a E)>,
    /// Target constraints with no counterpart.
    pub to_create: Vec<&'a E>,
    /// Existing constraints with no counterpart.
    pub to_drop: Vec<&'a E>,
}

/// Pairs existing and target constraints.
///
/// The first pass pairs entries whose names are both present and equal.
/// The second pass pairs the remaining entries by `same_content`. What is
/// left over is created or dropped.
pub fn match_constraints<'a, E, N, C>(
    existing: &'a [E],
    target: &'a [E],
    name_fn: N,
    same_content: C,
) -> ConstraintMatches<'a, E>
where
    N: Fn(&E) -> Option<Identifier>,
    C: Fn(&E, &E) -> bool,
{
    let mut existing_used = vec![false; existing.len()];
    let mut pairs: Vec<Option<usize>> = vec![None; target.len()];

    for (t, entity) in target.iter().enumerate() {
        let Some(name) = name_fn(entity) else {
            continue;
        };
        let found = (0..existing.len())
            .find(|&e| !existing_used[e] && name_fn(&existing[e]).as_ref() == Some(&name));
        if let Some(e) = found {
            existing_used[e] = true;
            pairs[t] = Some(e);
        }
    }

    for (t, entity) in target.iter().enumerate() {
        if pairs[t].is_some() {
            continue;
        }
        let found =
            (0..existing.len()).find(|&e| !existing_used[e] && same_content(&existing[e], entity));
        if let Some(e) = found {
            existing_used[e] = true;
            pairs[t] = Some(e);
        }
    }

    let mut matched = Vec::new();
    let mut to_create = Vec::new();
    for (entity, pair) in target.iter().zip(&pairs) {
        match pair {
            Some(e) => matched.push((&existing[*e], entity)),
            None => to_create.push(entity),
        }
    }
    let to_drop = existing
        .iter()
        .zip(&existing_used)
        .filter(|(_, used)| !**used)
        .map(|(entity, _)| entity)
        .collect();

    ConstraintMatches {
        matched,
        to_create,
        to_drop,
    }
}
