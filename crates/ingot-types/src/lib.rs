//! Type representation for the Ingot type system.
//!
//! Defines the core `Ty` enum, type variables (`TyVar`), struct types in
//! their named and partial (row) flavors, and polymorphic type schemes
//! (`Scheme`). These form the foundation of Hindley-Milner type inference.

use std::fmt;

/// A type variable, identified by a `u32` index.
///
/// Type variables are allocated monotonically by the inference context and
/// resolved through an explicit substitution map. Indices are never recycled
/// within a single compilation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// An Ingot type.
///
/// Represents all possible types in the Ingot type system:
/// - `Var`: an inference variable (to be resolved by substitution)
/// - `Con`: a named type constructor (`u32`, `bool`, `Ptr<T>`, ...)
/// - `Fun`: a function type (params -> return)
/// - `Tuple`: a tuple type (`(u32, bool)`)
/// - `Array`: an array type with a statically known length (`[u32; 4]`)
/// - `Struct`: a struct type, either named or a partially known row
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    /// A type variable (unresolved during inference).
    Var(TyVar),
    /// A named type constructor applied to zero or more parameters.
    Con(String, Vec<Ty>),
    /// A function type: `fn(param_types) -> return_type`.
    Fun(Vec<Ty>, Box<Ty>),
    /// A tuple type: `(u32, bool, char)`.
    Tuple(Vec<Ty>),
    /// An array type with its syntactic length: `[u32; 4]`.
    ///
    /// The length is part of the type and is never inferred.
    Array(Box<Ty>, usize),
    /// A struct type, named or partial.
    Struct(StructTy),
}

/// A struct type in one of two flavors.
///
/// `Named` is the type of a value whose declaration is known. `Partial` is a
/// row of attributes observed so far plus an open tail variable; it is what
/// attribute access produces while the bearer's declaration is still
/// undetermined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructTy {
    /// A fully resolved struct type, identified by declaration name.
    Named(String),
    /// A partially known struct shape (an open row).
    Partial(Row),
}

/// Which namespace a row's bindings resolve against.
///
/// Rows built by projecting a struct *name* (`Point.origin`) carry `Static`
/// and resolve against the declaration's static functions. All other rows
/// carry `Instance` and resolve against attributes and methods. The two
/// namespaces never unify with each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowScope {
    Instance,
    Static,
}

/// An open row: an ordered attribute list plus a tail variable.
///
/// The tail stands for the attributes not yet observed. A row is "closed"
/// once its tail has been bound to a named struct; until then it stays open
/// and can keep absorbing attributes. Invariant: the tail variable never
/// appears inside the row's own bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Attribute bindings in order of first appearance.
    pub fields: Vec<(String, Ty)>,
    /// The open tail.
    pub tail: TyVar,
    /// Namespace the bindings resolve against.
    pub scope: RowScope,
}

impl Row {
    pub fn new(fields: Vec<(String, Ty)>, tail: TyVar, scope: RowScope) -> Self {
        Row { fields, tail, scope }
    }

    /// Look up a binding by attribute name.
    pub fn get(&self, name: &str) -> Option<&Ty> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Ty {
    /// Create a `u32` type.
    pub fn u32() -> Ty {
        Ty::Con("u32".into(), Vec::new())
    }

    /// Create a `u8` type.
    pub fn u8() -> Ty {
        Ty::Con("u8".into(), Vec::new())
    }

    /// Create a `bool` type.
    pub fn bool() -> Ty {
        Ty::Con("bool".into(), Vec::new())
    }

    /// Create a `char` type.
    pub fn char() -> Ty {
        Ty::Con("char".into(), Vec::new())
    }

    /// Create a `string` type.
    pub fn string() -> Ty {
        Ty::Con("string".into(), Vec::new())
    }

    /// Create the `unit` type.
    pub fn unit() -> Ty {
        Ty::Con("unit".into(), Vec::new())
    }

    /// Create a `Ptr<T>` type.
    pub fn ptr(inner: Ty) -> Ty {
        Ty::Con("Ptr".into(), vec![inner])
    }

    /// Create a function type.
    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fun(params, Box::new(ret))
    }

    /// Create an array type with a syntactic length.
    pub fn array(elem: Ty, len: usize) -> Ty {
        Ty::Array(Box::new(elem), len)
    }

    /// Create a named struct type.
    pub fn named(name: impl Into<String>) -> Ty {
        Ty::Struct(StructTy::Named(name.into()))
    }

    /// Create a partial struct type from a row.
    pub fn partial(row: Row) -> Ty {
        Ty::Struct(StructTy::Partial(row))
    }

    /// Collect every type variable in this type, in order of first
    /// appearance. Duplicates are kept; callers dedup when needed.
    pub fn free_vars(&self, out: &mut Vec<TyVar>) {
        match self {
            Ty::Var(v) => out.push(*v),
            Ty::Con(_, params) => {
                for p in params {
                    p.free_vars(out);
                }
            }
            Ty::Fun(params, ret) => {
                for p in params {
                    p.free_vars(out);
                }
                ret.free_vars(out);
            }
            Ty::Tuple(elems) => {
                for e in elems {
                    e.free_vars(out);
                }
            }
            Ty::Array(elem, _) => elem.free_vars(out),
            Ty::Struct(StructTy::Named(_)) => {}
            Ty::Struct(StructTy::Partial(row)) => {
                for (_, v) in &row.fields {
                    v.free_vars(out);
                }
                out.push(row.tail);
            }
        }
    }

    /// Whether `var` occurs anywhere in this type (including row tails).
    pub fn occurs(&self, var: TyVar) -> bool {
        match self {
            Ty::Var(v) => *v == var,
            Ty::Con(_, params) => params.iter().any(|p| p.occurs(var)),
            Ty::Fun(params, ret) => {
                params.iter().any(|p| p.occurs(var)) || ret.occurs(var)
            }
            Ty::Tuple(elems) => elems.iter().any(|e| e.occurs(var)),
            Ty::Array(elem, _) => elem.occurs(var),
            Ty::Struct(StructTy::Named(_)) => false,
            Ty::Struct(StructTy::Partial(row)) => {
                row.tail == var || row.fields.iter().any(|(_, v)| v.occurs(var))
            }
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "{}", v),
            Ty::Con(name, params) => {
                write!(f, "{}", name)?;
                if !params.is_empty() {
                    write!(f, "<")?;
                    for (i, p) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", p)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Ty::Fun(params, ret) => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            Ty::Array(elem, len) => write!(f, "[{}; {}]", elem, len),
            Ty::Struct(StructTy::Named(name)) => write!(f, "{}", name),
            Ty::Struct(StructTy::Partial(row)) => {
                write!(f, "{{")?;
                for (i, (k, v)) in row.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                if !row.fields.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "..}}")
            }
        }
    }
}

/// A polymorphic type scheme: a type with universally quantified variables.
///
/// The type of `identity` is `forall a. fn(a) -> a`, represented as
/// `Scheme { vars: [a], ty: Fun([Var(a)], Var(a)) }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scheme {
    /// The quantified (generic) type variables.
    pub vars: Vec<TyVar>,
    /// The underlying type (may reference vars).
    pub ty: Ty,
}

impl Scheme {
    /// Create a monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }

    /// Collect the scheme's free variables: those of the body minus the
    /// quantified ones.
    pub fn free_vars(&self, out: &mut Vec<TyVar>) {
        let mut body = Vec::new();
        self.ty.free_vars(&mut body);
        out.extend(body.into_iter().filter(|v| !self.vars.contains(v)));
    }
}
