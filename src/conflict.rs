//! Pairwise conflict detection between two interfaces.
//!
//! The detector is syntactic: it reports every conflict that is structurally
//! possible and leaves it to the caller to conjoin the conflict-free
//! conditions with the feature models.

use log::debug;

use crate::condition::ConditionOracle;
use crate::interface::Interface;
use crate::signature::{group_by_name, ByName, Signature};

/// A potential conflict on `name`.
///
/// `conflict_free` describes where there is *no* conflict: it is the
/// constraint linking has to add to the feature model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict<C, T> {
    pub name: String,
    pub conflict_free: C,
    pub signatures: Vec<Signature<C, T>>,
}

/// Both sides must never export `name` in the same configuration.
pub fn presence_conflicts<O, T>(oracle: &O, a: &ByName<'_, O::Condition, T>, b: &ByName<'_, O::Condition, T>) -> Vec<Conflict<O::Condition, T>>
where
    O: ConditionOracle,
    T: Clone,
{
    let mut conflicts = Vec::new();
    for (&name, sigs_a) in a {
        let Some(sigs_b) = b.get(name) else {
            continue;
        };
        let cond_a = oracle.or_all(sigs_a.iter().map(|s| s.condition()));
        let cond_b = oracle.or_all(sigs_b.iter().map(|s| s.condition()));
        conflicts.push(Conflict {
            name: name.to_string(),
            conflict_free: oracle.mex(&cond_a, &cond_b),
            signatures: sigs_a.iter().chain(sigs_b).map(|&s| s.clone()).collect(),
        });
    }
    conflicts
}

/// `name` must never resolve to two different types in the same configuration.
pub fn type_conflicts<O, T>(oracle: &O, a: &ByName<'_, O::Condition, T>, b: &ByName<'_, O::Condition, T>) -> Vec<Conflict<O::Condition, T>>
where
    O: ConditionOracle,
    T: Clone + Eq,
{
    let mut conflicts = Vec::new();
    for (&name, sigs_a) in a {
        let Some(sigs_b) = b.get(name) else {
            continue;
        };
        for &sa in sigs_a {
            for &sb in sigs_b {
                if sa.ctype() != sb.ctype() {
                    conflicts.push(Conflict {
                        name: name.to_string(),
                        conflict_free: oracle.mex(sa.condition(), sb.condition()),
                        signatures: vec![sa.clone(), sb.clone()],
                    });
                }
            }
        }
    }
    conflicts
}

/// All potential conflicts between `x` and `y`: exports against exports
/// for presence, and imports against imports and exports for types.
pub fn get_conflicts<O, T>(oracle: &O, x: &Interface<O::Condition, T>, y: &Interface<O::Condition, T>) -> Vec<Conflict<O::Condition, T>>
where
    O: ConditionOracle,
    T: Clone + Eq,
{
    let x_imports = group_by_name(x.imports());
    let x_exports = group_by_name(x.exports());
    let y_imports = group_by_name(y.imports());
    let y_exports = group_by_name(y.exports());

    let mut conflicts = presence_conflicts(oracle, &x_exports, &y_exports);
    conflicts.extend(type_conflicts(oracle, &x_imports, &y_imports));
    conflicts.extend(type_conflicts(oracle, &x_imports, &y_exports));
    conflicts.extend(type_conflicts(oracle, &x_exports, &y_imports));

    debug!("found {} potential conflicts", conflicts.len());
    conflicts
}

/// Conjunction of all conflict-free conditions; `BASE` when there are none.
pub fn inferred_constraint<O, T>(oracle: &O, conflicts: &[Conflict<O::Condition, T>]) -> O::Condition
where
    O: ConditionOracle,
{
    oracle.and_all(conflicts.iter().map(|c| &c.conflict_free))
}
