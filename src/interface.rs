//! Variability-aware module interfaces and the linking algebra.
//!
//! An [`Interface`] describes what a module imports and exports, with every
//! signature guarded by a presence condition, plus a feature model
//! restricting the configurations the module is valid in.
//!
//! All operations are pure: they take `&self` and return a new interface.
//! Linking never fails. Conflicts between the two sides are turned into
//! constraints on the feature model instead, so linking incompatible
//! modules yields an interface whose feature model is unsatisfiable.
//!
//! ```
//! use varlink::condition::{BddOracle, ConditionOracle};
//! use varlink::ctype::CType;
//! use varlink::interface::Interface;
//! use varlink::signature::Signature;
//!
//! let oracle = BddOracle::default();
//! let a = oracle.option("A");
//! let b = oracle.option("B");
//!
//! // Both modules define `foo`, one under A, the other under B.
//! let x = Interface::new(&oracle, vec![], vec![Signature::new("foo", a, CType::Int, vec![])]);
//! let y = Interface::new(&oracle, vec![], vec![Signature::new("foo", b, CType::Int, vec![])]);
//!
//! // Linking restricts the configuration space to !(A && B).
//! let linked = x.link(&oracle, &y);
//! assert_eq!(*linked.feature_model(), oracle.mex(&a, &b));
//! assert!(x.is_compatible_to(&oracle, &y));
//! ```

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use log::{debug, warn};

use crate::condition::ConditionOracle;
use crate::conflict::{get_conflicts, inferred_constraint};
use crate::signature::{group_by_name, Signature};

#[derive(Debug, Clone)]
pub struct Interface<C, T> {
    feature_model: C,
    imported_features: BTreeSet<String>,
    declared_features: BTreeSet<String>,
    imports: Vec<Signature<C, T>>,
    exports: Vec<Signature<C, T>>,
    /// Set only by `pack`. Purely a shortcut, ignored by equality.
    packed: bool,
}

impl<C: PartialEq, T: PartialEq> PartialEq for Interface<C, T> {
    fn eq(&self, other: &Self) -> bool {
        self.feature_model == other.feature_model
            && self.imported_features == other.imported_features
            && self.declared_features == other.declared_features
            && self.imports == other.imports
            && self.exports == other.exports
    }
}

impl<C: Eq, T: Eq> Eq for Interface<C, T> {}

/// A name that can resolve to more than one signature in some configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation<C, T> {
    pub name: String,
    pub signatures: Vec<Signature<C, T>>,
}

impl<C, T: Display> Display for Violation<C, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` is not well-formed, colliding signatures:", self.name)?;
        for s in &self.signatures {
            write!(f, "\n  {}", s)?;
        }
        Ok(())
    }
}

/// Size summary of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceStats {
    pub imports: usize,
    pub exports: usize,
    /// Distinct names across imports and exports.
    pub names: usize,
}

impl<C, T> Interface<C, T> {
    /// Assemble an interface from all of its parts. The result is not packed.
    pub fn from_parts(
        feature_model: C,
        imported_features: BTreeSet<String>,
        declared_features: BTreeSet<String>,
        imports: Vec<Signature<C, T>>,
        exports: Vec<Signature<C, T>>,
    ) -> Self {
        Self {
            feature_model,
            imported_features,
            declared_features,
            imports,
            exports,
            packed: false,
        }
    }

    pub fn feature_model(&self) -> &C {
        &self.feature_model
    }

    pub fn imported_features(&self) -> &BTreeSet<String> {
        &self.imported_features
    }

    pub fn declared_features(&self) -> &BTreeSet<String> {
        &self.declared_features
    }

    pub fn imports(&self) -> &[Signature<C, T>] {
        &self.imports
    }

    pub fn exports(&self) -> &[Signature<C, T>] {
        &self.exports
    }

    /// Mark options as fixed by this module rather than inferred from usage.
    pub fn with_declared_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.declared_features.extend(features.into_iter().map(Into::into));
        self.packed = false;
        self
    }

    /// Replace the feature model by `f(feature_model)`.
    pub fn map_fm(&self, f: impl FnOnce(&C) -> C) -> Self
    where
        C: Clone,
        T: Clone,
    {
        Self {
            feature_model: f(&self.feature_model),
            packed: false,
            ..self.clone()
        }
    }

    pub fn stats(&self) -> InterfaceStats {
        let names: BTreeSet<&str> = self
            .imports
            .iter()
            .chain(&self.exports)
            .map(|s| s.name())
            .collect();
        InterfaceStats {
            imports: self.imports.len(),
            exports: self.exports.len(),
            names: names.len(),
        }
    }
}

impl<C, T> Interface<C, T>
where
    C: Clone + Eq + Hash + Debug,
    T: Clone + Eq + Hash,
{
    /// Interface of a module under the `BASE` feature model. Every option
    /// mentioned by a signature condition counts as imported.
    pub fn new<O>(oracle: &O, imports: Vec<Signature<C, T>>, exports: Vec<Signature<C, T>>) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        let imported_features = imports
            .iter()
            .chain(&exports)
            .flat_map(|s| oracle.features(s.condition()))
            .collect();
        Self::from_parts(oracle.base(), imported_features, BTreeSet::new(), imports, exports)
    }

    /// No signatures, no restrictions. Neutral element of [`Interface::link`].
    pub fn empty<O>(oracle: &O) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        Self::from_parts(oracle.base(), BTreeSet::new(), BTreeSet::new(), Vec::new(), Vec::new())
    }

    /// Normalize with respect to the feature model.
    ///
    /// Dead imports and exports are dropped, duplicate imports are merged,
    /// and imports are removed wherever a matching local export is active.
    /// Duplicate exports are kept so that later linking still sees every
    /// definition.
    pub fn pack<O>(&self, oracle: &O) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        if self.packed {
            return self.clone();
        }

        let fm = &self.feature_model;

        let mut merged: Vec<Option<Signature<C, T>>> = Vec::new();
        let mut index: HashMap<(&str, &T), usize> = HashMap::new();
        for import in &self.imports {
            if !oracle.is_satisfiable_under(import.condition(), fm) {
                continue;
            }
            match index.entry(import.key()) {
                Entry::Occupied(e) => {
                    let slot = &mut merged[*e.get()];
                    *slot = slot.take().map(|prev| prev.merge(oracle, import));
                }
                Entry::Vacant(e) => {
                    e.insert(merged.len());
                    merged.push(Some(import.clone()));
                }
            }
        }

        for export in &self.exports {
            let Some(&i) = index.get(&export.key()) else {
                continue;
            };
            if let Some(import) = merged[i].take() {
                let rest = oracle.and_not(import.condition(), export.condition());
                if oracle.is_satisfiable_under(&rest, fm) {
                    merged[i] = Some(import.with_condition(rest));
                }
            }
        }

        let imports: Vec<_> = merged.into_iter().flatten().collect();
        let exports: Vec<_> = self
            .exports
            .iter()
            .filter(|s| oracle.is_satisfiable_under(s.condition(), fm))
            .cloned()
            .collect();

        debug!(
            "pack: imports {} -> {}, exports {} -> {}",
            self.imports.len(),
            imports.len(),
            self.exports.len(),
            exports.len()
        );

        Self {
            feature_model: fm.clone(),
            imported_features: &self.imported_features - &self.declared_features,
            declared_features: self.declared_features.clone(),
            imports,
            exports,
            packed: true,
        }
    }

    /// Compose two interfaces.
    ///
    /// Every potential conflict between the two sides contributes its
    /// conflict-free condition to the new feature model, so the result only
    /// admits configurations in which the composition is sound.
    pub fn link<O>(&self, oracle: &O, other: &Self) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        let conflicts = get_conflicts(oracle, self, other);
        let inferred = inferred_constraint(oracle, &conflicts);
        debug!("link: {} potential conflicts", conflicts.len());

        let linked = self.link_without_checks(oracle, other);
        Self {
            feature_model: oracle.and(&linked.feature_model, &inferred),
            ..linked
        }
        .pack(oracle)
    }

    /// Concatenate two interfaces without inferring constraints and without
    /// packing. For inspecting intermediate states only; use
    /// [`Interface::link`] for anything that matters.
    pub fn link_without_checks<O>(&self, oracle: &O, other: &Self) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        Self::from_parts(
            oracle.and(&self.feature_model, &other.feature_model),
            &self.imported_features | &other.imported_features,
            &self.declared_features | &other.declared_features,
            self.imports.iter().chain(&other.imports).cloned().collect(),
            self.exports.iter().chain(&other.exports).cloned().collect(),
        )
    }

    /// Link a sequence of interfaces left to right.
    pub fn link_all<'a, O>(oracle: &O, interfaces: impl IntoIterator<Item = &'a Self>) -> Self
    where
        O: ConditionOracle<Condition = C>,
        Self: 'a,
    {
        interfaces
            .into_iter()
            .fold(Self::empty(oracle), |acc, i| acc.link(oracle, i))
    }

    /// Conjoin `f` to every import and export condition. The feature model
    /// is left untouched.
    pub fn and<O>(&self, oracle: &O, f: &C) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        let guard = |s: &Signature<C, T>| s.clone().with_condition(oracle.and(s.condition(), f));
        Self::from_parts(
            self.feature_model.clone(),
            self.imported_features.clone(),
            self.declared_features.clone(),
            self.imports.iter().map(guard).collect(),
            self.exports.iter().map(guard).collect(),
        )
    }

    /// The interface as seen when it is only present under `f`: signatures
    /// are guarded by `f` and the feature model only applies where `f` holds.
    pub fn conditional<O>(&self, oracle: &O, f: &C) -> Self
    where
        O: ConditionOracle<Condition = C>,
    {
        let guarded = self.and(oracle, f);
        Self {
            feature_model: oracle.implies(f, &self.feature_model),
            ..guarded
        }
    }

    /// Names that resolve ambiguously in some configuration of the feature
    /// model, each with all signatures sharing the name.
    pub fn wellformedness_violations<O>(&self, oracle: &O) -> Vec<Violation<C, T>>
    where
        O: ConditionOracle<Condition = C>,
    {
        let fm = &self.feature_model;
        group_by_name(self.exports.iter().chain(&self.imports))
            .into_iter()
            .filter(|(_, sigs)| {
                sigs.iter().enumerate().any(|(i, a)| {
                    sigs[i + 1..].iter().any(|b| {
                        let exclusive = oracle.mex(a.condition(), b.condition());
                        !oracle.is_tautology_under(&exclusive, fm)
                    })
                })
            })
            .map(|(name, sigs)| Violation {
                name: name.to_string(),
                signatures: sigs.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// No name resolves to two signatures in any configuration of the
    /// feature model. Each offending name is logged as a warning.
    pub fn is_wellformed<O>(&self, oracle: &O) -> bool
    where
        O: ConditionOracle<Condition = C>,
        T: Display,
    {
        let violations = self.wellformedness_violations(oracle);
        for v in &violations {
            warn!("{}", v);
        }
        violations.is_empty()
    }

    /// Some configuration is valid and no imports remain after packing.
    pub fn is_complete<O>(&self, oracle: &O) -> bool
    where
        O: ConditionOracle<Condition = C>,
    {
        oracle.is_satisfiable(&self.feature_model) && self.pack(oracle).imports.is_empty()
    }

    /// Every remaining signature is active in every valid configuration,
    /// i.e. the interface describes a single product.
    pub fn is_fully_configured<O>(&self, oracle: &O) -> bool
    where
        O: ConditionOracle<Condition = C>,
    {
        let packed = self.pack(oracle);
        packed
            .imports
            .iter()
            .chain(&packed.exports)
            .all(|s| oracle.is_tautology_under(s.condition(), &packed.feature_model))
    }

    fn linkable_with<O>(&self, oracle: &O, other: &Self) -> Option<Self>
    where
        O: ConditionOracle<Condition = C>,
    {
        if !self.declared_features.is_disjoint(&other.declared_features) {
            debug!(
                "both sides declare {:?}",
                self.declared_features
                    .intersection(&other.declared_features)
                    .collect::<Vec<_>>()
            );
            return None;
        }
        let linked = self.link(oracle, other);
        if oracle.is_satisfiable(&linked.feature_model) {
            Some(linked)
        } else {
            None
        }
    }

    /// Linking leaves some valid configuration, and the two sides do not
    /// both declare the same option.
    pub fn is_compatible_to<O>(&self, oracle: &O, other: &Self) -> bool
    where
        O: ConditionOracle<Condition = C>,
    {
        self.linkable_with(oracle, other).is_some()
    }

    /// Link left to right and stop at the first incompatible step.
    pub fn is_compatible_to_all<O>(oracle: &O, interfaces: &[Self]) -> bool
    where
        O: ConditionOracle<Condition = C>,
    {
        let Some((first, rest)) = interfaces.split_first() else {
            return true;
        };
        let mut acc = first.clone();
        for (i, next) in rest.iter().enumerate() {
            match acc.linkable_with(oracle, next) {
                Some(linked) => acc = linked,
                None => {
                    debug!("interface #{} is incompatible with its predecessors", i + 1);
                    return false;
                }
            }
        }
        true
    }

    /// Every configuration `global` admits is still admitted by this
    /// interface, i.e. `global ⇒ feature_model` is a tautology.
    pub fn compatible_with_global_feature_model<O>(&self, oracle: &O, global: &C) -> bool
    where
        O: ConditionOracle<Condition = C>,
    {
        oracle.is_tautology(&oracle.implies(global, &self.feature_model))
    }

    /// Multi-line human readable rendering.
    pub fn describe<O>(&self, oracle: &O) -> String
    where
        O: ConditionOracle<Condition = C>,
        T: Display,
    {
        let mut out = format!("fm: {}\n", oracle.render(&self.feature_model));
        if !self.imported_features.is_empty() {
            out.push_str(&format!("imported features: {:?}\n", self.imported_features));
        }
        if !self.declared_features.is_empty() {
            out.push_str(&format!("declared features: {:?}\n", self.declared_features));
        }
        for (label, sigs) in [("imports", &self.imports), ("exports", &self.exports)] {
            out.push_str(&format!("{}:\n", label));
            for s in sigs {
                out.push_str(&format!("  {}: {} if {}\n", s.name(), s.ctype(), oracle.render(s.condition())));
            }
        }
        out
    }
}
