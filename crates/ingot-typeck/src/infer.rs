//! The inference core: expression judgments and declaration registration.
//!
//! Inference is a depth-first walk producing substitutions. Every
//! expression node owns a type-variable slot; inferring a node unifies the
//! slot with the type derived from its children, and the substitutions of
//! children are composed child-over-parent and applied to the environment
//! seen by later siblings. The walker's contract:
//!
//! - `infer_expr(ctx, env, e, s)` requires `env` to be rewritten by `s` and
//!   returns a substitution extending `s` under which `subst.apply(slot(e))`
//!   is the type of `e`.
//! - `infer_expr_expecting` additionally constrains the node's slot with an
//!   expected type. The expectation is unified in *before* the node is
//!   descended into, so mismatches inside the node surface against the
//!   expected type (the expected side of every unification is the
//!   declared/required type).

use ingot_ast::{ArrayInit, BinOp, Decl, Expr, ExprKind, FuncDecl, NameRef, Param, UnOp};
use ingot_types::{Row, RowScope, Scheme, StructTy, Ty};

use crate::builtins;
use crate::ctx::{Attr, Context, MethodSpec, StaticFn};
use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::matching::{match_row, MatchOutcome};
use crate::subst::{generalize, Subst};
use crate::unify::unify;

/// Infer a whole program.
///
/// Clears the function-return stack (a failed earlier pass does not pop),
/// then folds declaration registration left to right, threading the
/// environment and the composed substitution. Returns the final
/// environment and substitution; callers apply the substitution to node
/// slots to materialize concrete types.
pub fn infer(program: &[Decl], ctx: &mut Context) -> Result<(TypeEnv, Subst), TypeError> {
    ctx.reset_returns();
    let mut env = TypeEnv::new();
    let mut subst = Subst::empty();
    for decl in program {
        let (next_env, next_subst) = register_decl(ctx, env, subst, decl)?;
        env = next_env;
        subst = next_subst;
    }
    Ok((env, subst))
}

/// The type slot of an expression node.
fn slot(e: &Expr) -> Ty {
    Ty::Var(e.tau)
}

// ── Declaration registration ───────────────────────────────────────────

/// Register one top-level declaration, returning the extended environment
/// and the composed substitution.
fn register_decl(
    ctx: &mut Context,
    env: TypeEnv,
    s: Subst,
    decl: &Decl,
) -> Result<(TypeEnv, Subst), TypeError> {
    match decl {
        Decl::Func(func) => {
            let s = infer_function(ctx, &env, &s, func, None)?;
            let mut env = env.apply(&s);
            let fn_ty = s.apply(&Ty::Var(func.name.tau));
            let mut gen_env = env.clone();
            gen_env.remove(&func.name.name);
            let scheme = generalize(&gen_env, &fn_ty);
            env.insert(func.name.name.clone(), scheme);
            Ok((env, s))
        }
        Decl::ExternFunc { name, ty } => {
            // Seal: the declared signature is the binding's type, with no
            // generalization, and the name's slot is pinned to it.
            let s2 = unify(ty, &s.apply(&Ty::Var(name.tau)), ctx)?;
            let s = s2.compose(&s);
            let mut env = env.apply(&s);
            env.insert(name.name.clone(), Scheme::mono(s.apply(ty)));
            Ok((env, s))
        }
        Decl::Global { name, init } => {
            let s = infer_expr_expecting(ctx, &env, init, &Ty::Var(name.tau), &s)?;
            let mut env = env.apply(&s);
            env.insert(
                name.name.clone(),
                Scheme::mono(s.apply(&Ty::Var(name.tau))),
            );
            Ok((env, s))
        }
        // Structs were installed in the context during desugaring.
        Decl::Struct { .. } => Ok((env, s)),
        Decl::Impl { type_name, funcs } => register_impl(ctx, env, s, type_name, funcs),
    }
}

/// Run function inference for a named function: bind the name and every
/// parameter monomorphically, pin the name's slot to
/// `fn(params) -> body` *before* descending (recursive calls are
/// monomorphic and see the shared slots), then infer the body under a
/// pushed return frame.
///
/// `self_binding` carries an extra in-scope binding that is excluded from
/// the function's parameter list -- the `self` of an impl method.
fn infer_function(
    ctx: &mut Context,
    env: &TypeEnv,
    s: &Subst,
    func: &FuncDecl,
    self_binding: Option<(&str, Ty)>,
) -> Result<Subst, TypeError> {
    let mut inner = env.clone();
    inner.insert(
        func.name.name.clone(),
        Scheme::mono(Ty::Var(func.name.tau)),
    );
    if let Some((self_name, self_ty)) = &self_binding {
        inner.insert(self_name.to_string(), Scheme::mono(self_ty.clone()));
    }
    for param in &func.params {
        inner.insert(
            param.name.name.clone(),
            Scheme::mono(Ty::Var(param.name.tau)),
        );
    }

    let fn_ty = Ty::Fun(
        func.params.iter().map(|p| Ty::Var(p.name.tau)).collect(),
        Box::new(slot(&func.body)),
    );
    let s2 = unify(&s.apply(&Ty::Var(func.name.tau)), &s.apply(&fn_ty), ctx)?;
    let s = s2.compose(s);
    let inner = inner.apply(&s);

    ctx.push_return(slot(&func.body));
    let s = infer_expr(ctx, &inner, &func.body, &s)?;
    ctx.pop_return();
    Ok(s)
}

/// Register an impl block: install each function on the struct as a method
/// (leading `self` parameter) or a static, run ordinary function inference
/// under the mangled name, and keep the mangled name out of the global
/// environment -- impl functions are reachable only through the struct.
fn register_impl(
    ctx: &mut Context,
    env: TypeEnv,
    s: Subst,
    type_name: &str,
    funcs: &[FuncDecl],
) -> Result<(TypeEnv, Subst), TypeError> {
    if ctx.lookup_struct(type_name).is_none() {
        return Err(TypeError::ImplForUnknownType {
            name: type_name.to_string(),
        });
    }

    let mut env = env;
    let mut s = s;
    for func in funcs {
        let mangled = format!("{}_{}", type_name, func.name.name);
        let is_method = func
            .params
            .first()
            .is_some_and(|p| p.name.name == "self");

        if is_method {
            let self_param = &func.params[0];
            let s2 = unify(
                &Ty::named(type_name),
                &s.apply(&Ty::Var(self_param.name.tau)),
                ctx,
            )?;
            s = s2.compose(&s);

            // The method's attribute type excludes `self`. It is installed
            // before body inference so `self.method(..)` recursion
            // resolves; the slots go concrete through the substitution.
            let method_ty = Ty::Fun(
                func.params[1..]
                    .iter()
                    .map(|p| Ty::Var(p.name.tau))
                    .collect(),
                Box::new(slot(&func.body)),
            );
            ctx.install_method(
                type_name,
                Attr {
                    name: func.name.name.clone(),
                    ty: method_ty,
                    method: Some(MethodSpec {
                        mangled: mangled.clone(),
                        self_mut: self_param.mutable,
                    }),
                },
            );

            let inner_decl = FuncDecl {
                name: NameRef::new(mangled, func.name.tau),
                params: func.params[1..].to_vec(),
                body: func.body.clone(),
            };
            s = infer_function(
                ctx,
                &env,
                &s,
                &inner_decl,
                Some(("self", Ty::named(type_name))),
            )?;
        } else {
            let static_ty = Ty::Fun(
                func.params.iter().map(|p| Ty::Var(p.name.tau)).collect(),
                Box::new(slot(&func.body)),
            );
            ctx.install_static(
                type_name,
                StaticFn {
                    name: func.name.name.clone(),
                    mangled: mangled.clone(),
                    ty: static_ty,
                },
            );

            let inner_decl = FuncDecl {
                name: NameRef::new(mangled, func.name.tau),
                params: func.params.clone(),
                body: func.body.clone(),
            };
            s = infer_function(ctx, &env, &s, &inner_decl, None)?;
        }
        env = env.apply(&s);
    }
    Ok((env, s))
}

// ── Expression judgments ───────────────────────────────────────────────

/// Infer an expression. See the module docs for the walker's contract.
fn infer_expr(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    match &e.kind {
        ExprKind::Lit(lit) => {
            let s2 = unify(&s.apply(&slot(e)), &builtins::lit_ty(lit), ctx)?;
            Ok(s2.compose(s))
        }
        ExprKind::Var(name) => infer_var(ctx, env, name, e, s),
        ExprKind::Assign { lhs, rhs } => infer_assign(ctx, env, e, lhs, rhs, s),
        ExprKind::Unary { op, operand } => infer_unary(ctx, env, e, *op, operand, s),
        ExprKind::Binary { op, lhs, rhs } => infer_binary(ctx, env, e, *op, lhs, rhs, s),
        ExprKind::Block { stmts, tail } => infer_block(ctx, env, e, stmts, tail.as_deref(), s),
        ExprKind::LetIn {
            binder,
            value,
            body,
        } => infer_let_in(ctx, env, e, binder, value, body, s),
        ExprKind::LetRec {
            binder,
            params,
            fn_body,
            body,
        } => infer_let_rec(ctx, env, e, binder, params, fn_body, body, s),
        ExprKind::Func { params, body } => infer_func(ctx, env, e, params, body, s),
        ExprKind::Call { callee, args } => infer_call(ctx, env, e, callee, args, s),
        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => infer_if(ctx, env, e, cond, then_branch, else_branch.as_deref(), s),
        ExprKind::While { cond, body } => infer_while(ctx, env, e, cond, body, s),
        ExprKind::Return(value) => infer_return(ctx, env, value.as_deref(), s),
        ExprKind::Assert {
            value,
            original,
            asserted,
        } => {
            let s = infer_expr_expecting(ctx, env, value, original, s)?;
            let s2 = unify(&s.apply(asserted), &s.apply(&slot(e)), ctx)?;
            Ok(s2.compose(&s))
        }
        ExprKind::Tuple(elems) => infer_tuple(ctx, env, e, elems, s),
        ExprKind::StructInit { name, fields } => {
            infer_struct_init(ctx, env, e, name, fields, s)
        }
        ExprKind::Array(init) => infer_array(ctx, env, e, init, s),
        ExprKind::Attr { base, attr } => infer_attr(ctx, env, e, base, attr, s),
    }
}

/// Infer an expression whose type is already constrained from the outside.
///
/// The expectation is unified against the node's slot first, then the node
/// is inferred under the extended substitution.
fn infer_expr_expecting(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    want: &Ty,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s2 = unify(&s.apply(want), &s.apply(&slot(e)), ctx)?;
    let s = s2.compose(s);
    infer_expr(ctx, &env.apply(&s2), e, &s)
}

/// A variable occurrence: instantiate its scheme. A name that is not bound
/// but names a registered struct denotes the struct itself and types as a
/// static-namespace row over its static functions -- the vehicle for
/// `Type.func` notation.
fn infer_var(
    ctx: &mut Context,
    env: &TypeEnv,
    name: &str,
    e: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    if let Some(scheme) = env.lookup(name) {
        let scheme = scheme.clone();
        let instance = ctx.instantiate(&scheme);
        let s2 = unify(&instance, &s.apply(&slot(e)), ctx)?;
        return Ok(s2.compose(s));
    }
    if let Some(def) = ctx.lookup_struct(name) {
        let fields: Vec<(String, Ty)> = def
            .statics
            .iter()
            .map(|sf| (sf.name.clone(), sf.ty.clone()))
            .collect();
        let tail = ctx.fresh_tau();
        let projection = Ty::partial(Row::new(fields, tail, RowScope::Static));
        let s2 = unify(&projection, &s.apply(&slot(e)), ctx)?;
        return Ok(s2.compose(s));
    }
    Err(TypeError::UnboundVariable {
        name: name.to_string(),
    })
}

/// An assignment: the right-hand side is inferred first, the left-hand
/// side is then checked expecting the right's post-substitution type, and
/// a final unify ties the two slots together. The assignment itself has
/// type `unit`.
fn infer_assign(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    lhs: &Expr,
    rhs: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s = infer_expr(ctx, env, rhs, s)?;
    let env = env.apply(&s);
    let want = s.apply(&slot(rhs));
    let s = infer_expr_expecting(ctx, &env, lhs, &want, &s)?;
    let s2 = unify(&s.apply(&slot(lhs)), &s.apply(&slot(rhs)), ctx)?;
    let s = s2.compose(&s);
    let s2 = unify(&Ty::unit(), &s.apply(&slot(e)), ctx)?;
    Ok(s2.compose(&s))
}

fn infer_unary(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    op: UnOp,
    operand: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s = infer_expr(ctx, env, operand, s)?;
    let observed = Ty::Fun(vec![slot(operand)], Box::new(slot(e)));
    let scheme_ty = ctx.instantiate(&builtins::un_op_scheme(op));
    let s2 = unify(&scheme_ty, &s.apply(&observed), ctx)?;
    Ok(s2.compose(&s))
}

/// A binary operator: infer the operands left to right, then unify a fresh
/// instance of the operator's scheme against the observed operator type.
/// The scheme is the expected side, so `u32 * bool` reports
/// `expected u32, got bool`.
fn infer_binary(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s = infer_expr(ctx, env, lhs, s)?;
    let env = env.apply(&s);
    let s = infer_expr(ctx, &env, rhs, &s)?;
    let observed = Ty::Fun(vec![slot(lhs), slot(rhs)], Box::new(slot(e)));
    let scheme_ty = ctx.instantiate(&builtins::bin_op_scheme(op));
    let s2 = unify(&scheme_ty, &s.apply(&observed), ctx)?;
    Ok(s2.compose(&s))
}

/// A block: fold inference across the statements, threading substitution
/// and environment, then check the tail expression against the block's
/// slot. A block without a tail has type `unit`.
fn infer_block(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    stmts: &[Expr],
    tail: Option<&Expr>,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let mut s = s.clone();
    let mut env = env.clone();
    for stmt in stmts {
        let s2 = infer_expr(ctx, &env, stmt, &s)?;
        env = env.apply(&s2);
        s = s2;
    }
    match tail {
        Some(tail) => infer_expr_expecting(ctx, &env, tail, &slot(e), &s),
        None => {
            let s2 = unify(&Ty::unit(), &s.apply(&slot(e)), ctx)?;
            Ok(s2.compose(&s))
        }
    }
}

/// `let x = value; body` -- the generalization boundary. The value's type
/// is closed over the variables not free in the environment, the body is
/// checked under the extended environment, and a final unify ties the
/// binder's slot to the value's monotype.
fn infer_let_in(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    binder: &NameRef,
    value: &Expr,
    body: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s = infer_expr(ctx, env, value, s)?;
    let env = env.apply(&s);
    let value_ty = s.apply(&slot(value));

    let mut gen_env = env.clone();
    gen_env.remove(&binder.name);
    let scheme = generalize(&gen_env, &value_ty);

    let mut body_env = env;
    body_env.insert(binder.name.clone(), scheme);
    let s = infer_expr_expecting(ctx, &body_env, body, &slot(e), &s)?;

    let s2 = unify(&s.apply(&Ty::Var(binder.tau)), &s.apply(&slot(value)), ctx)?;
    Ok(s2.compose(&s))
}

/// The recursive-binding form `let f = fn params -> fn_body; body`.
/// Inside `fn_body`, `f` and the parameters are monomorphic placeholders;
/// the binder generalizes before `body` is entered, rebinding `f`
/// polymorphically.
#[allow(clippy::too_many_arguments)]
fn infer_let_rec(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    binder: &NameRef,
    params: &[Param],
    fn_body: &Expr,
    body: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let func = FuncDecl {
        name: binder.clone(),
        params: params.to_vec(),
        body: fn_body.clone(),
    };
    let s = infer_function(ctx, env, s, &func, None)?;

    let fn_ty = s.apply(&Ty::Var(binder.tau));
    let mut gen_env = env.apply(&s);
    gen_env.remove(&binder.name);
    let scheme = generalize(&gen_env, &fn_ty);

    let mut body_env = env.apply(&s);
    body_env.insert(binder.name.clone(), scheme);
    infer_expr_expecting(ctx, &body_env, body, &slot(e), &s)
}

/// An anonymous function. Parameters are monomorphic inside the body; the
/// node's slot is unified with the resulting `fn` type after the body.
fn infer_func(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    params: &[Param],
    body: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let mut inner = env.clone();
    for param in params {
        inner.insert(
            param.name.name.clone(),
            Scheme::mono(Ty::Var(param.name.tau)),
        );
    }
    ctx.push_return(slot(body));
    let s = infer_expr(ctx, &inner, body, s)?;
    ctx.pop_return();

    let fn_ty = Ty::Fun(
        params.iter().map(|p| Ty::Var(p.name.tau)).collect(),
        Box::new(slot(body)),
    );
    let s2 = unify(&s.apply(&slot(e)), &s.apply(&fn_ty), ctx)?;
    Ok(s2.compose(&s))
}

/// An application: form the expected `fn` type out of the argument slots
/// and the node's own slot, check the callee against it, then check the
/// arguments left to right under the threaded substitution.
fn infer_call(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    callee: &Expr,
    args: &[Expr],
    s: &Subst,
) -> Result<Subst, TypeError> {
    let expected_fn = Ty::Fun(args.iter().map(slot).collect(), Box::new(slot(e)));
    let mut s = infer_expr_expecting(ctx, env, callee, &expected_fn, s)?;
    let mut env = env.apply(&s);
    for arg in args {
        let s2 = infer_expr(ctx, &env, arg, &s)?;
        env = env.apply(&s2);
        s = s2;
    }
    Ok(s)
}

/// A conditional. Both branches are checked against the node's slot; a
/// missing else branch forces the whole expression to `unit`.
fn infer_if(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    cond: &Expr,
    then_branch: &Expr,
    else_branch: Option<&Expr>,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s = infer_expr_expecting(ctx, env, cond, &Ty::bool(), s)?;
    let env = env.apply(&s);
    let s = infer_expr_expecting(ctx, &env, then_branch, &slot(e), &s)?;
    match else_branch {
        Some(else_branch) => {
            let env = env.apply(&s);
            infer_expr_expecting(ctx, &env, else_branch, &slot(e), &s)
        }
        None => {
            let s2 = unify(&Ty::unit(), &s.apply(&slot(e)), ctx)?;
            Ok(s2.compose(&s))
        }
    }
}

fn infer_while(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    cond: &Expr,
    body: &Expr,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let s = infer_expr_expecting(ctx, env, cond, &Ty::bool(), s)?;
    let env = env.apply(&s);
    let s = infer_expr(ctx, &env, body, &s)?;
    let s2 = unify(&Ty::unit(), &s.apply(&slot(e)), ctx)?;
    Ok(s2.compose(&s))
}

/// A return expression: the operand (synthetic unit when absent) is
/// checked against the innermost enclosing function's return type.
fn infer_return(
    ctx: &mut Context,
    env: &TypeEnv,
    value: Option<&Expr>,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let want = match ctx.current_return() {
        Some(ty) => ty.clone(),
        None => return Err(TypeError::ReturnOutsideFunction),
    };
    match value {
        Some(value) => infer_expr_expecting(ctx, env, value, &want, s),
        None => {
            let s2 = unify(&s.apply(&want), &Ty::unit(), ctx)?;
            Ok(s2.compose(s))
        }
    }
}

/// A tuple: fold the elements, then bind the node's slot to the tuple of
/// element slots.
fn infer_tuple(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    elems: &[Expr],
    s: &Subst,
) -> Result<Subst, TypeError> {
    let mut s = s.clone();
    let mut env = env.clone();
    for elem in elems {
        let s2 = infer_expr(ctx, &env, elem, &s)?;
        env = env.apply(&s2);
        s = s2;
    }
    let tuple_ty = Ty::Tuple(elems.iter().map(slot).collect());
    let s2 = unify(&s.apply(&slot(e)), &s.apply(&tuple_ty), ctx)?;
    Ok(s2.compose(&s))
}

/// A struct literal. The declared data attributes are checked in
/// declaration order -- each must be provided and its value must check
/// against the declared type -- and every provided field must name a
/// declared data attribute (method slots cannot be initialized).
fn infer_struct_init(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    name: &str,
    fields: &[(String, Expr)],
    s: &Subst,
) -> Result<Subst, TypeError> {
    let def = match ctx.lookup_struct(name) {
        Some(def) => def.clone(),
        None => {
            return Err(TypeError::UndeclaredStruct {
                name: name.to_string(),
            })
        }
    };

    let mut s = s.clone();
    let mut env = env.clone();
    for attr in def.attrs.iter().filter(|a| a.method.is_none()) {
        let provided = fields.iter().find(|(k, _)| *k == attr.name);
        let (_, value) = provided.ok_or_else(|| TypeError::MissingAttribute {
            attr: attr.name.clone(),
            struct_name: name.to_string(),
        })?;
        let s2 = infer_expr_expecting(ctx, &env, value, &attr.ty, &s)?;
        env = env.apply(&s2);
        s = s2;
    }

    for (key, _) in fields {
        let declared = def.attr(key).map_or(false, |a| a.method.is_none());
        if !declared {
            return Err(TypeError::ExtraneousAttribute {
                attr: key.clone(),
                struct_name: name.to_string(),
            });
        }
    }

    let s2 = unify(&s.apply(&slot(e)), &Ty::named(name), ctx)?;
    Ok(s2.compose(&s))
}

/// An array literal: every initializer (or the repeat operand) is checked
/// against one fresh element variable, and the node's slot becomes
/// `[elem; len]` with the syntactic length.
fn infer_array(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    init: &ArrayInit,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let elem = ctx.fresh_var();
    let mut s = s.clone();
    let len;
    match init {
        ArrayInit::List(elems) => {
            len = elems.len();
            let mut env = env.clone();
            for value in elems {
                let s2 = infer_expr_expecting(ctx, &env, value, &elem, &s)?;
                env = env.apply(&s2);
                s = s2;
            }
        }
        ArrayInit::Repeat(value, count) => {
            len = *count;
            s = infer_expr_expecting(ctx, env, value, &elem, &s)?;
        }
    }
    let array_ty = Ty::Array(Box::new(elem), len);
    let s2 = unify(&s.apply(&slot(e)), &s.apply(&array_ty), ctx)?;
    Ok(s2.compose(&s))
}

// ── Attribute access ───────────────────────────────────────────────────

/// Attribute access, the most intricate judgment. After the bearer is
/// inferred, resolution proceeds on its substituted type:
///
/// - a named struct resolves the attribute directly (data or method);
/// - a partial row that already binds the attribute unifies the binding
///   with the node's slot;
/// - otherwise the row is extended with the attribute and the struct
///   table is consulted: one consistent declaration seals the bearer,
///   several keep it partial, none fails (unless the bearer was a bare
///   variable, which becomes an anonymous record).
///
/// Each extension step re-checks: resolution runs again when the bearer's
/// type changed under the new substitution, because sealing can expose a
/// more precise resolution path. The re-check is guarded by structural
/// change of the bearer's type, which bounds it to one extra traversal.
fn infer_attr(
    ctx: &mut Context,
    env: &TypeEnv,
    e: &Expr,
    base: &Expr,
    attr: &str,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let mut s = infer_expr(ctx, env, base, s)?;

    loop {
        let base_ty = s.apply(&slot(base));
        match &base_ty {
            Ty::Struct(StructTy::Named(name)) => {
                return resolve_named_attr(ctx, e, name, attr, &s);
            }
            Ty::Struct(StructTy::Partial(row)) if row.contains(attr) => {
                let bound = row.get(attr).expect("attribute present").clone();
                let s2 = unify(&s.apply(&bound), &s.apply(&slot(e)), ctx)?;
                return Ok(s2.compose(&s));
            }
            _ => {
                let s2 = extend_and_match(ctx, e, base, &base_ty, attr, &s)?;
                let next = s2.apply(&slot(base));
                let changed = next != base_ty;
                s = s2;
                if !changed {
                    // Nothing new was learned; the extension itself bound
                    // the attribute, so the next probe terminates.
                    return Ok(s);
                }
            }
        }
    }
}

/// Resolve an attribute against a named struct declaration: data
/// attributes and installed methods resolve through the instance
/// namespace; static functions do not.
fn resolve_named_attr(
    ctx: &mut Context,
    e: &Expr,
    struct_name: &str,
    attr: &str,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let def = match ctx.lookup_struct(struct_name) {
        Some(def) => def.clone(),
        None => {
            return Err(TypeError::UndeclaredStruct {
                name: struct_name.to_string(),
            })
        }
    };
    let found = def.attr(attr).ok_or_else(|| TypeError::UnknownAttribute {
        attr: attr.to_string(),
        struct_name: struct_name.to_string(),
    })?;
    let s2 = unify(&s.apply(&found.ty), &s.apply(&slot(e)), ctx)?;
    Ok(s2.compose(s))
}

/// Extend the bearer's row with the accessed attribute and consult struct
/// matching on the result.
fn extend_and_match(
    ctx: &mut Context,
    e: &Expr,
    base: &Expr,
    base_ty: &Ty,
    attr: &str,
    s: &Subst,
) -> Result<Subst, TypeError> {
    let was_var = matches!(base_ty, Ty::Var(_));
    let scope = match base_ty {
        Ty::Struct(StructTy::Partial(row)) => row.scope,
        _ => RowScope::Instance,
    };

    let access_ty = s.apply(&slot(e));
    let tail = ctx.fresh_tau();
    let extension = Ty::partial(Row::new(
        vec![(attr.to_string(), access_ty)],
        tail,
        scope,
    ));
    let s2 = unify(base_ty, &extension, ctx)?;
    let s = s2.compose(s);

    let extended = s.apply(&slot(base));
    let row = match &extended {
        Ty::Struct(StructTy::Partial(row)) => row.clone(),
        // The extension can only produce a partial type; anything else
        // means the bearer was never row-shaped and unify already failed.
        other => {
            return Err(TypeError::NoMatchingStruct { ty: other.clone() });
        }
    };

    match match_row(&row, ctx) {
        MatchOutcome::OneMatch(name) => {
            let s2 = unify(&Ty::named(name), &extended, ctx)?;
            Ok(s2.compose(&s))
        }
        MatchOutcome::MultipleMatches(_) => Ok(s),
        MatchOutcome::NoMatch => {
            if was_var {
                // An unconstrained bearer becomes an anonymous record.
                Ok(s)
            } else {
                Err(TypeError::NoMatchingStruct {
                    ty: Ty::partial(row),
                })
            }
        }
    }
}
