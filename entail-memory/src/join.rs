//! Nested-loop join over in-memory relations.
//!
//! Body atoms are joined left to right with a growing variable binding
//! map. The semi-naive variant threads a flag through the recursion so a
//! match is emitted only when at least one supporting tuple's step stamp
//! falls inside the requested range.

use crate::store::Relation;
use entail_core::{Atom, Id, Rule, Step, Term};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Variable bindings accumulated during a join
pub(crate) type Bindings = HashMap<Arc<str>, Id>;

/// Step restriction applied to a rule evaluation
#[derive(Debug, Clone, Copy)]
pub(crate) enum StepFilter {
    /// Unrestricted: join against all stored facts
    None,
    /// Require at least one supporting fact with a stamp in `[min, max]`
    Range { min: Step, max: Step },
}

/// Evaluate a rule's body join and return the set of instantiated head
/// tuples
///
/// `seed` pre-binds variables for targeted evaluation; an empty map means
/// a free join.
pub(crate) fn evaluate_rule(
    rule: &Rule,
    relations: &HashMap<Arc<str>, Relation>,
    filter: StepFilter,
    seed: &Bindings,
) -> HashSet<Vec<Id>> {
    let mut heads = HashSet::new();
    let mut bindings = seed.clone();
    join_atoms(rule, relations, filter, &mut bindings, 0, false, &mut heads);
    heads
}

fn join_atoms(
    rule: &Rule,
    relations: &HashMap<Arc<str>, Relation>,
    filter: StepFilter,
    bindings: &mut Bindings,
    atom_index: usize,
    delta_seen: bool,
    out: &mut HashSet<Vec<Id>>,
) {
    if atom_index == rule.body.len() {
        let satisfied = match filter {
            StepFilter::None => true,
            StepFilter::Range { .. } => delta_seen,
        };
        if satisfied {
            if let Some(tuple) = instantiate_head(&rule.head, bindings) {
                out.insert(tuple);
            }
        }
        return;
    }

    let atom = &rule.body[atom_index];
    let Some(relation) = relations.get(&atom.predicate) else {
        return;
    };

    for (tuple, meta) in relation.tuples.iter() {
        if let Some(added) = try_match(atom, tuple, bindings) {
            let in_range = match filter {
                StepFilter::None => false,
                StepFilter::Range { min, max } => meta.step >= min && meta.step <= max,
            };
            join_atoms(
                rule,
                relations,
                filter,
                bindings,
                atom_index + 1,
                delta_seen || in_range,
                out,
            );
            for name in added {
                bindings.remove(&name);
            }
        }
    }
}

/// Match one atom against one tuple, extending `bindings`
///
/// Returns the variables newly bound by this match, or `None` on
/// mismatch (with `bindings` rolled back).
fn try_match(atom: &Atom, tuple: &[Id], bindings: &mut Bindings) -> Option<Vec<Arc<str>>> {
    let mut added: Vec<Arc<str>> = Vec::new();
    for (term, value) in atom.terms.iter().zip(tuple.iter()) {
        let ok = match term {
            Term::Constant(id) => id == value,
            Term::Variable(name) => match bindings.get(name) {
                Some(bound) => bound == value,
                None => {
                    bindings.insert(name.clone(), *value);
                    added.push(name.clone());
                    true
                }
            },
        };
        if !ok {
            for name in &added {
                bindings.remove(name);
            }
            return None;
        }
    }
    Some(added)
}

/// Instantiate the head atom from complete body bindings
///
/// Range restriction guarantees every head variable is bound once the
/// body matches; an unbound variable here yields `None` and the match is
/// skipped rather than panicking.
fn instantiate_head(head: &Atom, bindings: &Bindings) -> Option<Vec<Id>> {
    let mut tuple = Vec::with_capacity(head.terms.len());
    for term in &head.terms {
        match term {
            Term::Constant(id) => tuple.push(*id),
            Term::Variable(name) => tuple.push(*bindings.get(name)?),
        }
    }
    Some(tuple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TupleMeta;
    use entail_core::PredicateDecl;

    fn relation(decl: PredicateDecl, tuples: &[(&[Id], Step)]) -> Relation {
        let mut rel = Relation::new(decl);
        for (ids, step) in tuples {
            rel.tuples.insert(
                ids.to_vec(),
                TupleMeta {
                    step: *step,
                    derived: false,
                },
            );
        }
        rel
    }

    fn edge_path_relations() -> HashMap<Arc<str>, Relation> {
        let mut relations = HashMap::new();
        relations.insert(
            Arc::from("edge"),
            relation(
                PredicateDecl::asserted("edge", 2),
                &[(&[1, 2], 0), (&[2, 3], 0)],
            ),
        );
        relations.insert(
            Arc::from("path"),
            relation(
                PredicateDecl::derived("path", 2),
                &[(&[1, 2], 1), (&[2, 3], 1)],
            ),
        );
        relations
    }

    fn path_step() -> Rule {
        Rule::new(
            "path-step",
            Atom::new("path", vec![Term::variable("x"), Term::variable("z")]),
            vec![
                Atom::new("path", vec![Term::variable("x"), Term::variable("y")]),
                Atom::new("edge", vec![Term::variable("y"), Term::variable("z")]),
            ],
        )
    }

    #[test]
    fn test_two_atom_join() {
        let relations = edge_path_relations();
        let heads = evaluate_rule(&path_step(), &relations, StepFilter::None, &Bindings::new());
        // path(1,2) joins edge(2,3) on y=2; path(2,3) finds no edge(3,_)
        let expected: HashSet<Vec<Id>> = [vec![1, 3]].into_iter().collect();
        assert_eq!(heads, expected);
    }

    #[test]
    fn test_step_range_filter() {
        let relations = edge_path_relations();
        // No path tuple has a stamp in [5, 9] and no edge tuple either
        let heads = evaluate_rule(
            &path_step(),
            &relations,
            StepFilter::Range { min: 5, max: 9 },
            &Bindings::new(),
        );
        assert!(heads.is_empty());

        // path stamps (1) fall inside [1, 1]; the join fires
        let heads = evaluate_rule(
            &path_step(),
            &relations,
            StepFilter::Range { min: 1, max: 1 },
            &Bindings::new(),
        );
        assert!(heads.contains(&vec![1, 3]));
    }

    #[test]
    fn test_seed_bindings_restrict_join() {
        let relations = edge_path_relations();
        let mut seed = Bindings::new();
        seed.insert(Arc::from("x"), 2);
        let heads = evaluate_rule(&path_step(), &relations, StepFilter::None, &seed);
        // Only matches starting from path(2, _) survive, and edge(3, _) is empty
        assert!(heads.is_empty());
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let mut relations = HashMap::new();
        relations.insert(
            Arc::from("edge"),
            relation(
                PredicateDecl::asserted("edge", 2),
                &[(&[1, 1], 0), (&[1, 2], 0)],
            ),
        );
        relations.insert(
            Arc::from("loop"),
            relation(PredicateDecl::derived("loop", 1), &[]),
        );
        let rule = Rule::new(
            "self-loop",
            Atom::new("loop", vec![Term::variable("x")]),
            vec![Atom::new(
                "edge",
                vec![Term::variable("x"), Term::variable("x")],
            )],
        );
        let heads = evaluate_rule(&rule, &relations, StepFilter::None, &Bindings::new());
        let expected: HashSet<Vec<Id>> = [vec![1]].into_iter().collect();
        assert_eq!(heads, expected);
    }
}
