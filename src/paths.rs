//! Iterator over satisfying paths in a BDD.
//!
//! Each path is a conjunction of DIMACS-style literals; together the paths
//! form a disjoint sum-of-products cover of the function. Used to render
//! presence conditions in diagnostics.
//!
//! ```
//! use varlink::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let x = bdd.mk_var(1);
//! let y = bdd.mk_var(2);
//!
//! // x xor y
//! let f = bdd.apply_ite(x, -y, y);
//! let paths: Vec<_> = bdd.paths(f).collect();
//! assert_eq!(paths, vec![vec![1, -2], vec![-1, 2]]);
//! ```
//!
//! The number of paths can be exponential in the number of variables.

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Returns an iterator over all paths to TRUE, high branches first.
    pub fn paths(&self, f: Ref) -> BddPaths<'_> {
        BddPaths::new(self, f)
    }
}

#[derive(Debug, Clone, Copy)]
enum Branch {
    High,
    Low,
    Done,
}

#[derive(Debug)]
struct StackFrame {
    node: Ref,
    next_branch: Branch,
}

/// Depth-first path enumeration with a single reused path buffer.
pub struct BddPaths<'a> {
    bdd: &'a Bdd,
    stack: Vec<StackFrame>,
    current_path: Vec<i32>,
}

impl<'a> BddPaths<'a> {
    pub fn new(bdd: &'a Bdd, f: Ref) -> Self {
        BddPaths {
            bdd,
            stack: vec![StackFrame {
                node: f,
                next_branch: Branch::High,
            }],
            current_path: Vec::new(),
        }
    }

    fn backtrack(&mut self) {
        self.stack.pop();
        // Pop the literal that led us here (unless we're at root)
        if !self.stack.is_empty() {
            self.current_path.pop();
        }
    }
}

impl Iterator for BddPaths<'_> {
    type Item = Vec<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;

            if self.bdd.is_one(node) {
                let result = self.current_path.clone();
                self.backtrack();
                return Some(result);
            }
            if self.bdd.is_zero(node) {
                self.backtrack();
                continue;
            }

            let var = self.bdd.variable(node.index()) as i32;
            let next_branch = frame.next_branch;
            match next_branch {
                Branch::High => {
                    frame.next_branch = Branch::Low;
                    self.current_path.push(var);
                    let child = self.bdd.high_node(node);
                    self.stack.push(StackFrame {
                        node: child,
                        next_branch: Branch::High,
                    });
                }
                Branch::Low => {
                    frame.next_branch = Branch::Done;
                    self.current_path.push(-var);
                    let child = self.bdd.low_node(node);
                    self.stack.push(StackFrame {
                        node: child,
                        next_branch: Branch::High,
                    });
                }
                Branch::Done => self.backtrack(),
            }
        }
    }
}
