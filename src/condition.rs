//! Presence conditions and the oracle that decides them.
//!
//! The linking algebra never looks inside a condition. It only combines
//! conditions and asks the [`ConditionOracle`] whether the result is
//! satisfiable or a tautology. [`BddOracle`] answers those questions with
//! the crate's own BDD manager, mapping each configuration option to one BDD
//! variable.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::error::ParseError;
use crate::parser;
use crate::reference::Ref;

/// Boolean algebra over named configuration options, with a decision
/// procedure.
///
/// Only the constants, `and`, `or`, `not`, satisfiability and option
/// extraction are required; the derived operations can be overridden when
/// the backend has a cheaper way to answer them.
pub trait ConditionOracle {
    type Condition: Clone + Eq + Hash + Debug;

    /// Always true.
    fn base(&self) -> Self::Condition;
    /// Always false.
    fn dead(&self) -> Self::Condition;
    /// The condition "option `name` is selected".
    fn option(&self, name: &str) -> Self::Condition;

    fn and(&self, a: &Self::Condition, b: &Self::Condition) -> Self::Condition;
    fn or(&self, a: &Self::Condition, b: &Self::Condition) -> Self::Condition;
    fn not(&self, a: &Self::Condition) -> Self::Condition;

    fn is_satisfiable(&self, a: &Self::Condition) -> bool;

    /// Names of the options `a` refers to.
    fn features(&self, a: &Self::Condition) -> BTreeSet<String>;

    /// `a ∧ ¬b`
    fn and_not(&self, a: &Self::Condition, b: &Self::Condition) -> Self::Condition {
        self.and(a, &self.not(b))
    }

    /// `a ⇒ b`
    fn implies(&self, a: &Self::Condition, b: &Self::Condition) -> Self::Condition {
        self.or(&self.not(a), b)
    }

    /// Mutual exclusion `¬(a ∧ b)`, as a formula.
    fn mex(&self, a: &Self::Condition, b: &Self::Condition) -> Self::Condition {
        self.not(&self.and(a, b))
    }

    fn is_tautology(&self, a: &Self::Condition) -> bool {
        !self.is_satisfiable(&self.not(a))
    }

    /// Satisfiable in some configuration allowed by `model`.
    fn is_satisfiable_under(&self, a: &Self::Condition, model: &Self::Condition) -> bool {
        self.is_satisfiable(&self.and(a, model))
    }

    /// True in every configuration allowed by `model`.
    fn is_tautology_under(&self, a: &Self::Condition, model: &Self::Condition) -> bool {
        self.is_tautology(&self.implies(model, a))
    }

    /// Human readable form, for diagnostics.
    fn render(&self, a: &Self::Condition) -> String {
        format!("{:?}", a)
    }

    fn and_all<'a>(&self, conditions: impl IntoIterator<Item = &'a Self::Condition>) -> Self::Condition
    where
        Self::Condition: 'a,
    {
        conditions
            .into_iter()
            .fold(self.base(), |acc, c| self.and(&acc, c))
    }

    fn or_all<'a>(&self, conditions: impl IntoIterator<Item = &'a Self::Condition>) -> Self::Condition
    where
        Self::Condition: 'a,
    {
        conditions
            .into_iter()
            .fold(self.dead(), |acc, c| self.or(&acc, c))
    }
}

/// Oracle backed by a single shared [`Bdd`] manager.
///
/// Options get BDD variables `1, 2, ...` in the order they are first
/// mentioned. Since BDDs are canonical, two conditions from the same oracle
/// are equal iff they are logically equivalent.
pub struct BddOracle {
    bdd: Bdd,
    names: RefCell<Vec<String>>,
    variables: RefCell<HashMap<String, u32>>,
}

impl BddOracle {
    pub fn new(storage_bits: usize) -> Self {
        Self {
            bdd: Bdd::new(storage_bits),
            names: RefCell::new(Vec::new()),
            variables: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    /// Number of options registered so far.
    pub fn num_options(&self) -> usize {
        self.names.borrow().len()
    }

    fn variable_of(&self, name: &str) -> u32 {
        if let Some(&v) = self.variables.borrow().get(name) {
            return v;
        }
        let mut names = self.names.borrow_mut();
        names.push(name.to_string());
        let v = names.len() as u32;
        debug!("registered option {} as x{}", name, v);
        self.variables.borrow_mut().insert(name.to_string(), v);
        v
    }

    /// Variables nobody registered render as `x{v}`.
    fn name_of(&self, variable: u32) -> String {
        let names = self.names.borrow();
        match (variable as usize).checked_sub(1).and_then(|i| names.get(i)) {
            Some(name) => name.clone(),
            None => format!("x{}", variable),
        }
    }

    /// Parse a textual condition such as `A && !(B || defined(C))`.
    pub fn parse(&self, input: &str) -> Result<Ref, ParseError> {
        parser::parse(self, input)
    }

    /// Number of configurations over all registered options satisfying `f`.
    pub fn count_configurations(&self, f: &Ref) -> BigUint {
        self.bdd.sat_count(*f, self.num_options())
    }

    /// One configuration satisfying `f`, by option name. Options `f` does not
    /// depend on are left out.
    pub fn witness(&self, f: &Ref) -> Option<BTreeMap<String, bool>> {
        let literals = self.bdd.one_sat(*f)?;
        Some(
            literals
                .into_iter()
                .map(|lit| (self.name_of(lit.unsigned_abs()), lit > 0))
                .collect(),
        )
    }
}

impl Default for BddOracle {
    fn default() -> Self {
        BddOracle::new(20)
    }
}

impl Debug for BddOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BddOracle")
            .field("options", &self.names.borrow())
            .field("bdd", self.bdd())
            .finish()
    }
}

impl ConditionOracle for BddOracle {
    type Condition = Ref;

    fn base(&self) -> Ref {
        self.bdd.one
    }

    fn dead(&self) -> Ref {
        self.bdd.zero
    }

    fn option(&self, name: &str) -> Ref {
        let v = self.variable_of(name);
        self.bdd.mk_var(v)
    }

    fn and(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_and(*a, *b)
    }

    fn or(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_or(*a, *b)
    }

    fn not(&self, a: &Ref) -> Ref {
        self.bdd.apply_not(*a)
    }

    fn implies(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_imply(*a, *b)
    }

    fn is_satisfiable(&self, a: &Ref) -> bool {
        !self.bdd.is_zero(*a)
    }

    fn and_all<'a>(&self, conditions: impl IntoIterator<Item = &'a Ref>) -> Ref
    where
        Ref: 'a,
    {
        self.bdd.apply_and_many(conditions.into_iter().copied())
    }

    fn or_all<'a>(&self, conditions: impl IntoIterator<Item = &'a Ref>) -> Ref
    where
        Ref: 'a,
    {
        self.bdd.apply_or_many(conditions.into_iter().copied())
    }

    fn is_tautology(&self, a: &Ref) -> bool {
        self.bdd.is_one(*a)
    }

    fn is_tautology_under(&self, a: &Ref, model: &Ref) -> bool {
        self.bdd.is_implies(*model, *a)
    }

    fn features(&self, a: &Ref) -> BTreeSet<String> {
        self.bdd
            .support(*a)
            .into_iter()
            .map(|v| self.name_of(v))
            .collect()
    }

    /// Sum-of-products rendering, e.g. `A && !B || C`.
    fn render(&self, f: &Ref) -> String {
        if self.bdd.is_one(*f) {
            return "true".to_string();
        }
        if self.bdd.is_zero(*f) {
            return "false".to_string();
        }
        self.bdd
            .paths(*f)
            .map(|path| {
                path.iter()
                    .map(|&lit| {
                        let name = self.name_of(lit.unsigned_abs());
                        if lit < 0 {
                            format!("!{}", name)
                        } else {
                            name
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" && ")
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_options_are_stable() {
        let oracle = BddOracle::default();
        let a1 = oracle.option("A");
        let b = oracle.option("B");
        let a2 = oracle.option("A");
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(oracle.num_options(), 2);
    }

    #[test]
    fn test_derived_operations() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        let a_not_b = oracle.and_not(&a, &b);
        assert!(oracle.is_satisfiable(&a_not_b));
        assert!(!oracle.is_satisfiable(&oracle.and(&a_not_b, &b)));

        assert!(oracle.is_tautology(&oracle.mex(&a, &oracle.not(&a))));
        assert!(!oracle.is_tautology(&oracle.mex(&a, &b)));
        assert!(oracle.is_tautology(&oracle.implies(&oracle.and(&a, &b), &a)));
    }

    #[test]
    fn test_under_model() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        // Under A, the condition A || B always holds, and !A never does.
        assert!(oracle.is_tautology_under(&oracle.or(&a, &b), &a));
        assert!(!oracle.is_satisfiable_under(&oracle.not(&a), &a));
        assert!(oracle.is_satisfiable_under(&b, &a));
    }

    #[test]
    fn test_features() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");
        let c = oracle.option("C");

        let f = oracle.or(&oracle.and(&a, &b), &oracle.and(&a, &oracle.not(&b)));
        // (A && B) || (A && !B) is just A.
        assert_eq!(oracle.features(&f), BTreeSet::from(["A".to_string()]));
        assert_eq!(
            oracle.features(&oracle.or(&b, &c)),
            BTreeSet::from(["B".to_string(), "C".to_string()])
        );
        assert!(oracle.features(&oracle.base()).is_empty());
    }

    #[test]
    fn test_fold_helpers() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        assert_eq!(oracle.and_all([&a, &b]), oracle.and(&a, &b));
        assert_eq!(oracle.or_all([&a, &b]), oracle.or(&a, &b));
        assert_eq!(oracle.and_all(std::iter::empty()), oracle.base());
        assert_eq!(oracle.or_all(std::iter::empty()), oracle.dead());
    }

    #[test]
    fn test_fold_helpers_short_circuit() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        let not_a = oracle.not(&a);
        assert_eq!(oracle.and_all([&a, &not_a, &b]), oracle.dead());
        assert_eq!(oracle.or_all([&a, &not_a, &b]), oracle.base());
    }

    #[test]
    fn test_unregistered_variable_gets_synthetic_name() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let raw = oracle.bdd().mk_var(3);
        let f = oracle.and(&a, &raw);

        assert_eq!(
            oracle.features(&f),
            BTreeSet::from(["A".to_string(), "x3".to_string()])
        );
        assert_eq!(oracle.render(&f), "A && x3");
        let witness = oracle.witness(&f).unwrap();
        assert_eq!(witness.get("x3"), Some(&true));
    }

    #[test]
    fn test_count_and_witness() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");
        oracle.option("C");

        let f = oracle.and_not(&a, &b);
        assert_eq!(oracle.count_configurations(&f), BigUint::from(2u32));

        let witness = oracle.witness(&f).unwrap();
        assert_eq!(witness.get("A"), Some(&true));
        assert_eq!(witness.get("B"), Some(&false));
        assert_eq!(oracle.witness(&oracle.dead()), None);
    }

    #[test]
    fn test_render() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        assert_eq!(oracle.render(&oracle.base()), "true");
        assert_eq!(oracle.render(&oracle.dead()), "false");
        assert_eq!(oracle.render(&oracle.and_not(&a, &b)), "A && !B");
        assert_eq!(oracle.render(&oracle.or(&a, &b)), "A || !A && B");
    }
}
