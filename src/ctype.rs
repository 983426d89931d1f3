//! A small C type representation for signatures.
//!
//! The linking algebra only ever compares types for equality, so any
//! `Eq + Hash` type works as a signature type. This one covers what the
//! declaration-typing stage typically produces.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CType {
    Void,
    Char,
    Int,
    Long,
    Float,
    Double,
    Unsigned(Box<CType>),
    Pointer(Box<CType>),
    Array(Box<CType>),
    /// Return type and parameter types.
    Function(Box<CType>, Vec<CType>),
    Struct(String),
    Union(String),
    /// A type the typing stage could not resolve, kept by spelling.
    Unknown(String),
}

impl CType {
    pub fn ptr(self) -> Self {
        CType::Pointer(Box::new(self))
    }

    pub fn array(self) -> Self {
        CType::Array(Box::new(self))
    }

    pub fn unsigned(self) -> Self {
        CType::Unsigned(Box::new(self))
    }

    pub fn function(ret: CType, params: impl IntoIterator<Item = CType>) -> Self {
        CType::Function(Box::new(ret), params.into_iter().collect())
    }

    pub fn is_function(&self) -> bool {
        matches!(self, CType::Function(..))
    }
}

impl Display for CType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Char => write!(f, "char"),
            CType::Int => write!(f, "int"),
            CType::Long => write!(f, "long"),
            CType::Float => write!(f, "float"),
            CType::Double => write!(f, "double"),
            CType::Unsigned(t) => write!(f, "unsigned {}", t),
            CType::Pointer(t) => write!(f, "{}*", t),
            CType::Array(t) => write!(f, "{}[]", t),
            CType::Function(ret, params) => {
                write!(f, "{}(", ret)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")
            }
            CType::Struct(name) => write!(f, "struct {}", name),
            CType::Union(name) => write!(f, "union {}", name),
            CType::Unknown(spelling) => write!(f, "{}", spelling),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CType::Char.ptr().to_string(), "char*");
        assert_eq!(CType::Int.unsigned().array().to_string(), "unsigned int[]");
        assert_eq!(
            CType::function(CType::Int, [CType::Char.ptr(), CType::Long]).to_string(),
            "int(char*, long)"
        );
        assert_eq!(CType::Struct("stat".into()).to_string(), "struct stat");
    }

    #[test]
    fn test_structural_equality() {
        let a = CType::function(CType::Void, [CType::Int]);
        let b = CType::function(CType::Void, [CType::Int]);
        let c = CType::function(CType::Void, [CType::Long]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_function());
        assert!(!CType::Int.is_function());
    }
}
