//! # varlink: variability-aware interface linking
//!
//! **`varlink`** composes the interfaces of C-like modules in a software
//! product line. A module does not have one signature per name but a family
//! of them, each guarded by a *presence condition*: a boolean formula over
//! configuration options describing the configurations the declaration
//! exists in.
//!
//! Linking two such interfaces has to find conflicts that only show up in
//! some configurations (the same function defined twice, a symbol imported
//! with one type and exported with another). Instead of rejecting the
//! modules, [`Interface::link`][crate::interface::Interface::link] restricts
//! the combined feature model to the configurations without a conflict, then
//! packs the result so that repeated linking stays small.
//!
//! ## Basic Usage
//!
//! ```rust
//! use varlink::condition::{BddOracle, ConditionOracle};
//! use varlink::ctype::CType;
//! use varlink::interface::Interface;
//! use varlink::signature::Signature;
//!
//! let oracle = BddOracle::default();
//! let net = oracle.option("CONFIG_NET");
//! let base = oracle.base();
//!
//! // main.c calls `send` and defines `main`.
//! let main = Interface::new(
//!     &oracle,
//!     vec![Signature::new("send", base, CType::Int, vec![])],
//!     vec![Signature::new("main", base, CType::Int, vec![])],
//! );
//! // net.c defines `send` only when networking is enabled.
//! let net_c = Interface::new(&oracle, vec![], vec![Signature::new("send", net, CType::Int, vec![])]);
//!
//! let linked = main.link(&oracle, &net_c);
//! assert!(!linked.is_complete(&oracle)); // `send` is missing without CONFIG_NET
//! assert!(linked.map_fm(|_| net).is_complete(&oracle));
//! ```
//!
//! ## Core Components
//!
//! - **[`condition`]**: the [`ConditionOracle`][crate::condition::ConditionOracle] capability and its BDD-backed implementation.
//! - **[`interface`]**: interfaces, packing, linking and the derived predicates.
//! - **[`conflict`]**: pairwise conflict detection.
//! - **[`bdd`]**: the BDD manager the default oracle is built on.

pub mod bdd;
pub mod cache;
pub mod condition;
pub mod conflict;
pub mod ctype;
pub mod error;
pub mod interface;
pub mod parser;
pub mod paths;
pub mod reference;
pub mod signature;
pub mod table;
pub mod utils;
