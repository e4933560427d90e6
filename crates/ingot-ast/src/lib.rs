//! Core AST for the Ingot compiler front-end.
//!
//! This is the tree the desugaring pre-pass hands to the type inference
//! engine. By the time a program reaches this form, identifiers have been
//! uniquified, every `let x = fn args -> body` has been rewritten into the
//! recursive-binding form (`LetRec`), struct declarations have been
//! registered with the inference context, and every node has been assigned
//! a fresh type-variable slot (`tau`).
//!
//! Types are materialized after inference by applying the final substitution
//! to each node's slot; the tree itself is never mutated.

use ingot_types::{Ty, TyVar};

/// A literal constant.
#[derive(Clone, Debug, PartialEq)]
pub enum Lit {
    U8(u8),
    U32(u32),
    Bool(bool),
    Char(char),
    Str(String),
    Unit,
}

/// A unary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// Logical negation: `!e`.
    Not,
    /// Arithmetic negation: `-e`.
    Neg,
    /// Pointer dereference: `*e`.
    Deref,
    /// Address-of: `&e`.
    Ref,
}

/// A binary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// A binder: an identifier paired with its type-variable slot.
///
/// Binders appear wherever a name is introduced (let bindings, function
/// names, parameters, globals). The slot is what the final substitution is
/// applied to when the binding's type is materialized.
#[derive(Clone, Debug, PartialEq)]
pub struct NameRef {
    pub name: String,
    pub tau: TyVar,
}

impl NameRef {
    pub fn new(name: impl Into<String>, tau: TyVar) -> Self {
        NameRef {
            name: name.into(),
            tau,
        }
    }
}

/// A function parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: NameRef,
    /// Whether the parameter was declared `mut`. Only meaningful for the
    /// `self` parameter of an impl method, where it is recorded on the
    /// struct's method table.
    pub mutable: bool,
}

impl Param {
    pub fn new(name: NameRef) -> Self {
        Param {
            name,
            mutable: false,
        }
    }

    pub fn mutable(name: NameRef) -> Self {
        Param {
            name,
            mutable: true,
        }
    }
}

/// The initializer of an array expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayInit {
    /// `[a, b, c]` -- one expression per element.
    List(Vec<Expr>),
    /// `[e; N]` -- a repeated element with a syntactic count.
    Repeat(Box<Expr>, usize),
}

/// An expression node: a kind plus the node's type-variable slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub tau: TyVar,
}

impl Expr {
    pub fn new(kind: ExprKind, tau: TyVar) -> Self {
        Expr { kind, tau }
    }

    /// Literal constant.
    pub fn lit(lit: Lit, tau: TyVar) -> Self {
        Expr::new(ExprKind::Lit(lit), tau)
    }

    /// Variable occurrence. Each occurrence owns its slot, so a polymorphic
    /// binding can be used at different types.
    pub fn var(name: impl Into<String>, tau: TyVar) -> Self {
        Expr::new(ExprKind::Var(name.into()), tau)
    }

    /// Attribute access: `base.attr`.
    pub fn attr(base: Expr, attr: impl Into<String>, tau: TyVar) -> Self {
        Expr::new(
            ExprKind::Attr {
                base: Box::new(base),
                attr: attr.into(),
            },
            tau,
        )
    }

    /// Function application.
    pub fn call(callee: Expr, args: Vec<Expr>, tau: TyVar) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            tau,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A literal constant.
    Lit(Lit),
    /// A variable occurrence.
    Var(String),
    /// An assignment: `lhs = rhs`. The expression itself has type `unit`.
    Assign { lhs: Box<Expr>, rhs: Box<Expr> },
    /// A unary operator application.
    Unary { op: UnOp, operand: Box<Expr> },
    /// A binary operator application.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A block: statements followed by an optional tail expression. The
    /// block's type is the tail's type, or `unit` without one.
    Block {
        stmts: Vec<Expr>,
        tail: Option<Box<Expr>>,
    },
    /// A non-recursive let binding: `let x = value; body`. The bound value
    /// generalizes at this boundary.
    LetIn {
        binder: NameRef,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// A recursive function binding, produced by desugaring
    /// `let f = fn args -> fn_body`. `f` and the arguments are monomorphic
    /// inside `fn_body`; `f` generalizes before `body` is entered.
    LetRec {
        binder: NameRef,
        params: Vec<Param>,
        fn_body: Box<Expr>,
        body: Box<Expr>,
    },
    /// An anonymous function.
    Func { params: Vec<Param>, body: Box<Expr> },
    /// Function application.
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// A conditional. Without an `else` branch the whole expression (and
    /// therefore the `then` branch) has type `unit`.
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// A while loop; always has type `unit`.
    While { cond: Box<Expr>, body: Box<Expr> },
    /// A return from the innermost enclosing function. `None` returns unit.
    Return(Option<Box<Expr>>),
    /// A type assertion: `value as asserted`. The operand is checked
    /// against `original` (its pre-assertion type slot, filled in during
    /// desugaring); the assertion itself has the asserted type.
    Assert {
        value: Box<Expr>,
        original: Ty,
        asserted: Ty,
    },
    /// A tuple constructor.
    Tuple(Vec<Expr>),
    /// A struct literal: `Name { field: value, ... }`.
    StructInit {
        name: String,
        fields: Vec<(String, Expr)>,
    },
    /// An array literal.
    Array(ArrayInit),
    /// Attribute access: `base.attr`. Resolves against named structs,
    /// partial rows, or -- when the bearer is still unknown -- the
    /// structural matching pass.
    Attr { base: Box<Expr>, attr: String },
}

/// A function declaration: named, with parameters and a body.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncDecl {
    pub name: NameRef,
    pub params: Vec<Param>,
    pub body: Expr,
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    /// A top-level function.
    Func(FuncDecl),
    /// An extern function: a name sealed to a declared signature.
    ExternFunc { name: NameRef, ty: Ty },
    /// A global binding.
    Global { name: NameRef, init: Expr },
    /// A struct declaration. The struct itself was installed in the
    /// inference context during desugaring; registration is a no-op here.
    Struct { name: String },
    /// An impl block attaching methods and static functions to a struct.
    Impl {
        type_name: String,
        funcs: Vec<FuncDecl>,
    },
}
