//! Built-in typing: literal types and operator schemes.
//!
//! Operators are typed by instantiating a scheme and unifying it against
//! the observed `fn` type built from the operand slots. Equality is
//! polymorphic; arithmetic, shifts, and comparisons are monomorphic over
//! `u32`; logical operators work on `bool`; `Deref` and `Ref` relate a
//! pointer to its pointee.

use ingot_ast::{BinOp, Lit, UnOp};
use ingot_types::{Scheme, Ty, TyVar};

/// The type of a literal constant.
pub fn lit_ty(lit: &Lit) -> Ty {
    match lit {
        Lit::U8(_) => Ty::u8(),
        Lit::U32(_) => Ty::u32(),
        Lit::Bool(_) => Ty::bool(),
        Lit::Char(_) => Ty::char(),
        Lit::Str(_) => Ty::string(),
        Lit::Unit => Ty::unit(),
    }
}

/// The typing scheme of a binary operator, as a two-argument function.
///
/// Scheme-local quantifiers use low indices; instantiation replaces them
/// with fresh variables, so they never collide with allocated slots.
pub fn bin_op_scheme(op: BinOp) -> Scheme {
    let a = TyVar(0);
    match op {
        BinOp::Add
        | BinOp::Sub
        | BinOp::Mul
        | BinOp::Div
        | BinOp::Rem
        | BinOp::Shl
        | BinOp::Shr => Scheme::mono(Ty::fun(vec![Ty::u32(), Ty::u32()], Ty::u32())),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            Scheme::mono(Ty::fun(vec![Ty::u32(), Ty::u32()], Ty::bool()))
        }
        BinOp::Eq | BinOp::Ne => Scheme {
            vars: vec![a],
            ty: Ty::fun(vec![Ty::Var(a), Ty::Var(a)], Ty::bool()),
        },
        BinOp::And | BinOp::Or => {
            Scheme::mono(Ty::fun(vec![Ty::bool(), Ty::bool()], Ty::bool()))
        }
    }
}

/// The typing scheme of a unary operator, as a one-argument function.
pub fn un_op_scheme(op: UnOp) -> Scheme {
    let a = TyVar(0);
    match op {
        UnOp::Not => Scheme::mono(Ty::fun(vec![Ty::bool()], Ty::bool())),
        UnOp::Neg => Scheme::mono(Ty::fun(vec![Ty::u32()], Ty::u32())),
        UnOp::Deref => Scheme {
            vars: vec![a],
            ty: Ty::fun(vec![Ty::ptr(Ty::Var(a))], Ty::Var(a)),
        },
        UnOp::Ref => Scheme {
            vars: vec![a],
            ty: Ty::fun(vec![Ty::Var(a)], Ty::ptr(Ty::Var(a))),
        },
    }
}
