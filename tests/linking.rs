//! Algebraic properties of packing and linking.
//!
//! Each test builds small product lines over a handful of options and
//! checks a property of the interface algebra as a whole.

use std::collections::BTreeSet;

use num_bigint::BigUint;
use varlink::condition::{BddOracle, ConditionOracle};
use varlink::conflict::{get_conflicts, inferred_constraint};
use varlink::ctype::CType;
use varlink::interface::Interface;
use varlink::reference::Ref;
use varlink::signature::{Position, Signature};

type Iface = Interface<Ref, CType>;

fn sig(name: &str, condition: Ref, ctype: CType) -> Signature<Ref, CType> {
    Signature::new(name, condition, ctype, vec![Position::new(format!("{}.c", name), 1, 1)])
}

/// A module with overlapping imports, a shadowing export and a dead export.
fn messy(oracle: &BddOracle) -> Iface {
    let a = oracle.option("A");
    let b = oracle.option("B");
    let c = oracle.option("C");
    Iface::new(
        oracle,
        vec![
            sig("malloc", a, CType::Void.ptr()),
            sig("malloc", b, CType::Void.ptr()),
            sig("free", oracle.base(), CType::Void),
            sig("log", c, CType::Int),
            sig("log", oracle.not(&c), CType::Long),
        ],
        vec![
            sig("free", a, CType::Void),
            sig("init", oracle.and(&a, &b), CType::Int),
            sig("init", oracle.and(&a, &b), CType::Int),
            sig("dead", oracle.and(&c, &oracle.not(&c)), CType::Int),
        ],
    )
    .map_fm(|_| oracle.implies(&b, &a))
}

// ─── Packing ───────────────────────────────────────────────────────────────────

#[test]
fn pack_is_idempotent() {
    let oracle = BddOracle::default();
    let x = messy(&oracle);

    let once = x.pack(&oracle);
    assert_eq!(once.pack(&oracle), once);
}

#[test]
fn pack_never_grows() {
    let oracle = BddOracle::default();
    let x = messy(&oracle);
    let p = x.pack(&oracle);

    assert!(p.imports().len() <= x.imports().len());
    assert!(p.exports().len() <= x.exports().len());
    // malloc merged, the dead export gone, the duplicate `init` kept.
    assert_eq!(p.imports().len(), 4);
    assert_eq!(p.exports().len(), 3);
}

#[test]
fn pack_export_shadowing() {
    let oracle = BddOracle::default();
    let a = oracle.option("A");
    let b = oracle.option("B");

    let x = Iface::new(&oracle, vec![sig("n", a, CType::Int)], vec![sig("n", b, CType::Int)]);
    let p = x.pack(&oracle);

    assert_eq!(p.imports().len(), 1);
    let cond = p.imports()[0].condition();
    for (va, vb) in [(true, true), (true, false), (false, true), (false, false)] {
        let lit = |f: &Ref, v: bool| if v { *f } else { oracle.not(f) };
        let assignment = oracle.and(&lit(&a, va), &lit(&b, vb));
        let sat = oracle.is_satisfiable(&oracle.and(cond, &assignment));
        assert_eq!(sat, va && !vb, "A={} B={}", va, vb);
    }
}

// ─── Conflicts ─────────────────────────────────────────────────────────────────

#[test]
fn conflicts_are_symmetric() {
    let oracle = BddOracle::default();
    let a = oracle.option("A");
    let b = oracle.option("B");

    let x = Iface::new(
        &oracle,
        vec![sig("read", a, CType::Int)],
        vec![sig("foo", a, CType::Int), sig("bar", oracle.base(), CType::Int)],
    );
    let y = Iface::new(
        &oracle,
        vec![sig("bar", b, CType::Char)],
        vec![sig("foo", b, CType::Int), sig("read", b, CType::Long)],
    );

    let xy = get_conflicts(&oracle, &x, &y);
    let yx = get_conflicts(&oracle, &y, &x);

    let names = |cs: &[varlink::conflict::Conflict<Ref, CType>]| -> BTreeSet<String> {
        cs.iter().map(|c| c.name.clone()).collect()
    };
    assert_eq!(names(&xy[..]), names(&yx[..]));
    assert_eq!(names(&xy[..]).len(), 3);
    assert_eq!(inferred_constraint(&oracle, &xy), inferred_constraint(&oracle, &yx));
}

// ─── Linking ───────────────────────────────────────────────────────────────────

#[test]
fn link_restriction_is_associative() {
    let oracle = BddOracle::default();
    let x = oracle.option("X");
    let y = oracle.option("Y");
    let z = oracle.option("Z");

    let a = Iface::new(&oracle, vec![], vec![sig("a", x, CType::Int)]).map_fm(|_| x);
    let b = Iface::new(&oracle, vec![sig("a", y, CType::Int)], vec![sig("b", y, CType::Int)])
        .map_fm(|_| oracle.or(&y, &z));
    let c = Iface::new(&oracle, vec![sig("b", z, CType::Int)], vec![sig("c", z, CType::Char)]);

    let left = a.link(&oracle, &b).link(&oracle, &c);
    let right = a.link(&oracle, &b.link(&oracle, &c));

    assert_eq!(
        oracle.is_satisfiable(left.feature_model()),
        oracle.is_satisfiable(right.feature_model())
    );
    assert_eq!(left.feature_model(), right.feature_model());
}

#[test]
fn link_of_disjoint_conditionals_splits_cases() {
    let oracle = BddOracle::default();
    let f = oracle.option("option1");
    let g = oracle.option("option2");
    let base = oracle.base();

    let a = Iface::new(&oracle, vec![sig("bar", base, CType::Int)], vec![sig("foo", base, CType::Int)]);
    let b = Iface::new(&oracle, vec![], vec![sig("baz", base, CType::Int)]);

    let linked = a.conditional(&oracle, &f).link(&oracle, &b.conditional(&oracle, &g));
    let restrict = |i: &Iface, r: &Ref| i.map_fm(|fm| oracle.and(fm, r)).pack(&oracle);

    let same = |x: &Iface, y: &Iface| {
        let key = |i: &Iface| -> Vec<(String, CType, Ref)> {
            let fm = i.feature_model();
            i.imports()
                .iter()
                .chain(i.exports())
                .map(|s| (s.name().to_string(), s.ctype().clone(), oracle.and(s.condition(), fm)))
                .collect()
        };
        x.feature_model() == y.feature_model() && key(x) == key(y)
    };

    // only a
    let only_f = oracle.and_not(&f, &g);
    assert!(same(&restrict(&linked, &only_f), &restrict(&a, &only_f)));

    // only b
    let only_g = oracle.and_not(&g, &f);
    assert!(same(&restrict(&linked, &only_g), &restrict(&b, &only_g)));

    // both: an ordinary link
    let both = oracle.and(&f, &g);
    assert!(same(&restrict(&linked, &both), &restrict(&a.link(&oracle, &b), &both)));

    // neither: nothing left
    let neither = oracle.not(&oracle.or(&f, &g));
    let empty = restrict(&linked, &neither);
    assert!(empty.imports().is_empty());
    assert!(empty.exports().is_empty());
}

#[test]
fn linking_product_line_counts_configurations() {
    let oracle = BddOracle::default();
    let base = oracle.base();
    let gui = oracle.option("GUI");
    let cli = oracle.option("CLI");

    // Both front ends define `run`, so they must not be selected together.
    let main = Iface::new(&oracle, vec![sig("run", base, CType::function(CType::Int, []))], vec![sig("main", base, CType::Int)]);
    let gui_c = Iface::new(&oracle, vec![], vec![sig("run", gui, CType::function(CType::Int, []))]);
    let cli_c = Iface::new(&oracle, vec![], vec![sig("run", cli, CType::function(CType::Int, []))]);

    let all = Iface::link_all(&oracle, [&main, &gui_c, &cli_c]);

    assert!(all.is_wellformed(&oracle));
    assert_eq!(*all.feature_model(), oracle.mex(&gui, &cli));
    assert_eq!(oracle.count_configurations(all.feature_model()), BigUint::from(3u32));
    // `run` is still missing when neither front end is selected.
    assert!(!all.is_complete(&oracle));
    let one_of = all.map_fm(|fm| oracle.and(fm, &oracle.or(&gui, &cli)));
    assert!(one_of.is_complete(&oracle));

    assert!(Iface::is_compatible_to_all(&oracle, &[main, gui_c, cli_c]));
    assert!(all.compatible_with_global_feature_model(&oracle, &oracle.mex(&gui, &cli)));
    assert!(!all.compatible_with_global_feature_model(&oracle, &base));
}

#[test]
fn parsed_conditions_link_like_built_ones() {
    let oracle = BddOracle::default();

    let x = Iface::new(
        &oracle,
        vec![],
        vec![sig("foo", oracle.parse("defined(A) && !B").unwrap(), CType::Int)],
    );
    let y = Iface::new(&oracle, vec![], vec![sig("foo", oracle.parse("B || !A").unwrap(), CType::Int)]);

    // The two definitions never overlap, so nothing is restricted.
    let linked = x.link(&oracle, &y);
    assert!(oracle.is_tautology(linked.feature_model()));
    assert!(linked.is_wellformed(&oracle));
}
