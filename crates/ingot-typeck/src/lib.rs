//! Ingot type checker: Hindley-Milner type inference with extensions.
//!
//! This crate assigns types to every node of a desugared Ingot program.
//! It implements:
//!
//! - Hindley-Milner inference with let-polymorphism and explicit,
//!   composable substitutions
//! - Unification with occurs check over constructors, functions, tuples,
//!   fixed-length arrays, and struct types
//! - Partial struct types (open rows) with structural matching against
//!   the registered struct declarations
//! - Impl blocks: methods and static functions attached to structs
//! - A function-return stack typing `return` in nested function bodies
//!
//! # Architecture
//!
//! - [`subst`]: substitution maps, composition, generalization
//! - [`unify`]: unification engine, row merge, row sealing
//! - [`env`]: type environment (name -> scheme)
//! - [`ctx`]: fresh-variable allocator, struct table, return stack
//! - [`matching`]: structural matching of rows against declarations
//! - [`infer`]: expression judgments and declaration registration
//! - [`builtins`]: literal types and operator schemes
//! - [`error`]: error values with the user-visible message contract
//!
//! The caller hands [`infer::infer`] a slice of Core AST declarations and
//! a [`ctx::Context`] holding the registered structs; inference returns
//! the final environment and substitution, and the caller applies the
//! substitution to each node's type slot to materialize concrete types.

pub mod builtins;
pub mod ctx;
pub mod env;
pub mod error;
pub mod infer;
pub mod matching;
pub mod subst;
pub mod unify;


pub use crate::ctx::{Attr, Context, MethodSpec, StaticFn, StructDef};
pub use crate::env::TypeEnv;
pub use crate::error::TypeError;
pub use crate::infer::infer;
pub use crate::matching::{match_row, MatchOutcome};
pub use crate::subst::{generalize, Subst};
pub use crate::unify::unify;
