//! Conditionally-active declarations.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::condition::ConditionOracle;

/// Source location, used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A named declaration of type `T`, active exactly when `condition` holds.
///
/// Two signatures with the same name and type are duplicates; when they are
/// merged their conditions are disjoined and their positions concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature<C, T> {
    name: String,
    ctype: T,
    condition: C,
    positions: Vec<Position>,
}

impl<C, T> Signature<C, T> {
    pub fn new(name: impl Into<String>, condition: C, ctype: T, positions: Vec<Position>) -> Self {
        Self {
            name: name.into(),
            ctype,
            condition,
            positions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ctype(&self) -> &T {
        &self.ctype
    }

    pub fn condition(&self) -> &C {
        &self.condition
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Duplicate key: name and type.
    pub fn key(&self) -> (&str, &T) {
        (&self.name, &self.ctype)
    }

    pub fn is_duplicate_of(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        self.name == other.name && self.ctype == other.ctype
    }

    pub fn with_condition(self, condition: C) -> Self {
        Self { condition, ..self }
    }

    /// Merge a duplicate into `self`.
    pub fn merge<O>(self, oracle: &O, other: &Self) -> Self
    where
        O: ConditionOracle<Condition = C>,
        T: PartialEq,
    {
        debug_assert!(self.is_duplicate_of(other));
        let Self {
            name,
            ctype,
            condition,
            mut positions,
        } = self;
        positions.extend(other.positions.iter().cloned());
        Self {
            name,
            ctype,
            condition: oracle.or(&condition, &other.condition),
            positions,
        }
    }
}

impl<C, T: Display> Display for Signature<C, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.ctype)?;
        if !self.positions.is_empty() {
            let positions: Vec<_> = self.positions.iter().map(|p| p.to_string()).collect();
            write!(f, " ({})", positions.join(", "))?;
        }
        Ok(())
    }
}

/// Signatures grouped by name, original order kept within each group.
pub type ByName<'a, C, T> = BTreeMap<&'a str, Vec<&'a Signature<C, T>>>;

pub fn group_by_name<'a, C, T>(signatures: impl IntoIterator<Item = &'a Signature<C, T>>) -> ByName<'a, C, T>
where
    C: 'a,
    T: 'a,
{
    let mut groups: ByName<'a, C, T> = BTreeMap::new();
    for s in signatures {
        groups.entry(s.name()).or_default().push(s);
    }
    groups
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::condition::BddOracle;
    use crate::ctype::CType;

    #[test]
    fn test_duplicates_ignore_condition() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        let s1 = Signature::new("foo", a, CType::Int, vec![]);
        let s2 = Signature::new("foo", b, CType::Int, vec![]);
        let s3 = Signature::new("foo", a, CType::Char, vec![]);
        assert!(s1.is_duplicate_of(&s2));
        assert!(!s1.is_duplicate_of(&s3));
        assert_eq!(s1.key(), ("foo", &CType::Int));
    }

    #[test]
    fn test_merge() {
        let oracle = BddOracle::default();
        let a = oracle.option("A");
        let b = oracle.option("B");

        let s1 = Signature::new("foo", a, CType::Int, vec![Position::new("a.c", 1, 5)]);
        let s2 = Signature::new("foo", b, CType::Int, vec![Position::new("b.c", 7, 1)]);
        let merged = s1.merge(&oracle, &s2);

        assert_eq!(merged.name(), "foo");
        assert_eq!(*merged.condition(), oracle.or(&a, &b));
        assert_eq!(
            merged.positions(),
            &[Position::new("a.c", 1, 5), Position::new("b.c", 7, 1)]
        );
    }

    #[test]
    fn test_group_by_name_keeps_order() {
        let oracle = BddOracle::default();
        let base = oracle.base();

        let sigs = vec![
            Signature::new("foo", base, CType::Int, vec![]),
            Signature::new("bar", base, CType::Int, vec![]),
            Signature::new("foo", base, CType::Char, vec![]),
        ];
        let groups = group_by_name(&sigs);

        assert_eq!(groups.len(), 2);
        let foo: Vec<_> = groups["foo"].iter().map(|s| s.ctype().clone()).collect();
        assert_eq!(foo, vec![CType::Int, CType::Char]);
        assert_eq!(groups["bar"].len(), 1);
    }

    #[test]
    fn test_display() {
        let oracle = BddOracle::default();
        let s = Signature::new("main", oracle.base(), CType::Int, vec![Position::new("m.c", 3, 1)]);
        assert_eq!(s.to_string(), "main: int (m.c:3:1)");
    }
}
