//! Type error values.
//!
//! Every inference failure is one of these variants. The `Display` output is
//! the user-visible contract: callers surface `format!("{}", err)` directly,
//! so the strings here are exact and stable.

use std::fmt;

use ingot_types::{Ty, TyVar};

/// A type error encountered during inference.
///
/// Inference is fail-fast: the first error aborts the whole pass and is
/// reported as-is. No error is recovered locally.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeError {
    /// Two types that should be equal are not.
    Mismatch { expected: Ty, got: Ty },
    /// A type variable appears in its own solution (occurs check).
    RecursiveType { var: TyVar, ty: Ty },
    /// A variable is used but not bound in scope.
    UnboundVariable { name: String },
    /// A struct literal omits a declared attribute.
    MissingAttribute { attr: String, struct_name: String },
    /// A struct literal provides an attribute the declaration lacks.
    ExtraneousAttribute { attr: String, struct_name: String },
    /// An attribute access names no attribute of the struct.
    UnknownAttribute { attr: String, struct_name: String },
    /// A struct literal names a struct that was never declared.
    UndeclaredStruct { name: String },
    /// No registered struct declaration is consistent with a partial row.
    NoMatchingStruct { ty: Ty },
    /// `return` used with no enclosing function body.
    ReturnOutsideFunction,
    /// An impl block targets a type that was never declared.
    ImplForUnknownType { name: String },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch { expected, got } => {
                write!(f, "type mismatch: expected {}, got {}", expected, got)
            }
            TypeError::RecursiveType { .. } => write!(f, "recursive type"),
            TypeError::UnboundVariable { name } => {
                write!(f, "unbound variable: \"{}\"", name)
            }
            TypeError::MissingAttribute { attr, struct_name } => {
                write!(
                    f,
                    "missing attribute \"{}\" for struct \"{}\"",
                    attr, struct_name
                )
            }
            TypeError::ExtraneousAttribute { attr, struct_name } => {
                write!(
                    f,
                    "extraneous attribute \"{}\" for struct \"{}\"",
                    attr, struct_name
                )
            }
            TypeError::UnknownAttribute { attr, struct_name } => {
                write!(
                    f,
                    "attribute \"{}\" does not exist on struct \"{}\"",
                    attr, struct_name
                )
            }
            TypeError::UndeclaredStruct { name } => {
                write!(f, "undeclared struct \"{}\"", name)
            }
            TypeError::NoMatchingStruct { ty } => {
                write!(f, "no struct declaration matches type {}", ty)
            }
            TypeError::ReturnOutsideFunction => {
                write!(f, "'return' used outside of a function")
            }
            TypeError::ImplForUnknownType { name } => {
                write!(f, "cannot implement for unknown type \"{}\"", name)
            }
        }
    }
}

impl std::error::Error for TypeError {}
