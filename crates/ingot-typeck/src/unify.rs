//! Unification: computing the most general unifier of two types.
//!
//! `unify` takes raw monotypes -- callers apply their current substitution
//! to both sides first -- and returns the substitution that makes them
//! equal, or the error that proves none exists. The first argument is the
//! "expected" side: it is the one reported as expected in mismatch errors,
//! so call sites put the declared/required type first.
//!
//! Beyond ordinary structural unification this module implements the row
//! operations for partial struct types: merging two open rows, and sealing
//! a row against a named struct declaration.

use ingot_types::{Row, RowScope, StructTy, Ty, TyVar};

use crate::ctx::Context;
use crate::error::TypeError;
use crate::subst::Subst;

/// Unify two types, producing their most general unifier.
pub fn unify(expected: &Ty, found: &Ty, ctx: &mut Context) -> Result<Subst, TypeError> {
    match (expected, found) {
        (Ty::Var(a), Ty::Var(b)) if a == b => Ok(Subst::empty()),
        (Ty::Var(v), other) | (other, Ty::Var(v)) => bind(*v, other),

        (Ty::Con(n1, p1), Ty::Con(n2, p2)) => {
            if n1 != n2 || p1.len() != p2.len() {
                return Err(mismatch(expected, found));
            }
            unify_pairwise(p1, p2, ctx)
        }

        (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
            if p1.len() != p2.len() {
                return Err(mismatch(expected, found));
            }
            let s = unify_pairwise(p1, p2, ctx)?;
            let s2 = unify(&s.apply(r1), &s.apply(r2), ctx)?;
            Ok(s2.compose(&s))
        }

        (Ty::Tuple(e1), Ty::Tuple(e2)) => {
            if e1.len() != e2.len() {
                return Err(mismatch(expected, found));
            }
            unify_pairwise(e1, e2, ctx)
        }

        (Ty::Array(e1, n1), Ty::Array(e2, n2)) => {
            if n1 != n2 {
                return Err(mismatch(expected, found));
            }
            unify(e1, e2, ctx)
        }

        (Ty::Struct(s1), Ty::Struct(s2)) => match (s1, s2) {
            (StructTy::Named(a), StructTy::Named(b)) => {
                if a == b {
                    Ok(Subst::empty())
                } else {
                    Err(mismatch(expected, found))
                }
            }
            (StructTy::Named(name), StructTy::Partial(row))
            | (StructTy::Partial(row), StructTy::Named(name)) => {
                seal_row(name, row, expected, found, ctx)
            }
            (StructTy::Partial(r1), StructTy::Partial(r2)) => {
                merge_rows(r1, r2, expected, found, ctx)
            }
        },

        _ => Err(mismatch(expected, found)),
    }
}

fn mismatch(expected: &Ty, found: &Ty) -> TypeError {
    TypeError::Mismatch {
        expected: expected.clone(),
        got: found.clone(),
    }
}

/// Bind a variable to a type, subject to the occurs check.
fn bind(var: TyVar, ty: &Ty) -> Result<Subst, TypeError> {
    if let Ty::Var(w) = ty {
        if *w == var {
            return Ok(Subst::empty());
        }
    }
    if ty.occurs(var) {
        return Err(TypeError::RecursiveType {
            var,
            ty: ty.clone(),
        });
    }
    Ok(Subst::singleton(var, ty.clone()))
}

/// Unify two equal-length slices pairwise, threading the substitution left
/// to right.
fn unify_pairwise(expected: &[Ty], found: &[Ty], ctx: &mut Context) -> Result<Subst, TypeError> {
    let mut s = Subst::empty();
    for (a, b) in expected.iter().zip(found.iter()) {
        let s2 = unify(&s.apply(a), &s.apply(b), ctx)?;
        s = s2.compose(&s);
    }
    Ok(s)
}

/// Unify a partial row against a named struct declaration.
///
/// Every binding of the row must name an attribute of the declaration
/// (data attributes and method slots alike) and unify with its declared
/// type. The row's tail is then bound to the named struct, which closes
/// the row: subsequent substitution application collapses the whole
/// partial type to `Named`.
///
/// Static rows never seal -- a struct name projected for its static
/// functions is not a value of that struct type.
fn seal_row(
    name: &str,
    row: &Row,
    expected: &Ty,
    found: &Ty,
    ctx: &mut Context,
) -> Result<Subst, TypeError> {
    if row.scope == RowScope::Static {
        return Err(mismatch(expected, found));
    }
    let def = match ctx.lookup_struct(name) {
        Some(def) => def.clone(),
        None => {
            return Err(TypeError::UndeclaredStruct {
                name: name.to_string(),
            })
        }
    };

    let mut s = Subst::empty();
    for (attr_name, bound_ty) in &row.fields {
        let attr = def.attr(attr_name).ok_or_else(|| TypeError::UnknownAttribute {
            attr: attr_name.clone(),
            struct_name: name.to_string(),
        })?;
        let s2 = unify(&s.apply(&attr.ty), &s.apply(bound_ty), ctx)?;
        s = s2.compose(&s);
    }

    let s2 = unify(&s.apply(&Ty::Var(row.tail)), &Ty::named(name), ctx)?;
    Ok(s2.compose(&s))
}

/// Merge two open rows.
///
/// Shared keys unify pairwise. Each row then absorbs the other's exclusive
/// keys by having its tail bound to a row of those exclusives, with one
/// fresh variable as the common tail -- after which applying the resulting
/// substitution turns both inputs into the same merged row.
fn merge_rows(
    r1: &Row,
    r2: &Row,
    expected: &Ty,
    found: &Ty,
    ctx: &mut Context,
) -> Result<Subst, TypeError> {
    if r1.scope != r2.scope {
        return Err(mismatch(expected, found));
    }

    let mut s = Subst::empty();
    for (key, v1) in &r1.fields {
        if let Some(v2) = r2.get(key) {
            let s2 = unify(&s.apply(v1), &s.apply(v2), ctx)?;
            s = s2.compose(&s);
        }
    }

    let excl1: Vec<(String, Ty)> = r1
        .fields
        .iter()
        .filter(|(k, _)| !r2.contains(k))
        .map(|(k, v)| (k.clone(), s.apply(v)))
        .collect();
    let excl2: Vec<(String, Ty)> = r2
        .fields
        .iter()
        .filter(|(k, _)| !r1.contains(k))
        .map(|(k, v)| (k.clone(), s.apply(v)))
        .collect();

    if r1.tail == r2.tail {
        // Same open tail on both sides: the rows can only agree if neither
        // has keys the other lacks (the extended occurs check).
        if excl1.is_empty() && excl2.is_empty() {
            return Ok(s);
        }
        return Err(TypeError::RecursiveType {
            var: r1.tail,
            ty: found.clone(),
        });
    }

    let shared_tail = ctx.fresh_tau();

    let absorb1 = if excl2.is_empty() {
        Ty::Var(shared_tail)
    } else {
        Ty::partial(Row::new(excl2, shared_tail, r1.scope))
    };
    if absorb1.occurs(r1.tail) {
        return Err(TypeError::RecursiveType {
            var: r1.tail,
            ty: absorb1,
        });
    }
    let s2 = unify(&s.apply(&Ty::Var(r1.tail)), &absorb1, ctx)?;
    let s = s2.compose(&s);

    let absorb2 = if excl1.is_empty() {
        Ty::Var(shared_tail)
    } else {
        Ty::partial(Row::new(
            excl1.into_iter().map(|(k, v)| (k, s.apply(&v))).collect(),
            shared_tail,
            r2.scope,
        ))
    };
    if absorb2.occurs(r2.tail) {
        return Err(TypeError::RecursiveType {
            var: r2.tail,
            ty: absorb2,
        });
    }
    let s3 = unify(&s.apply(&Ty::Var(r2.tail)), &absorb2, ctx)?;
    Ok(s3.compose(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::StructDef;

    fn instance_row(fields: Vec<(&str, Ty)>, tail: TyVar) -> Row {
        Row::new(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            tail,
            RowScope::Instance,
        )
    }

    #[test]
    fn unify_identical_cons() {
        let mut ctx = Context::new();
        assert_eq!(unify(&Ty::u32(), &Ty::u32(), &mut ctx), Ok(Subst::empty()));
        assert_eq!(
            unify(&Ty::unit(), &Ty::unit(), &mut ctx),
            Ok(Subst::empty())
        );
    }

    #[test]
    fn unify_con_mismatch() {
        let mut ctx = Context::new();
        let err = unify(&Ty::u32(), &Ty::bool(), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected u32, got bool");
    }

    #[test]
    fn unify_var_binds_either_side() {
        let mut ctx = Context::new();
        let v = ctx.fresh_tau();
        let s = unify(&Ty::Var(v), &Ty::u32(), &mut ctx).unwrap();
        assert_eq!(s.apply(&Ty::Var(v)), Ty::u32());
        let s = unify(&Ty::u32(), &Ty::Var(v), &mut ctx).unwrap();
        assert_eq!(s.apply(&Ty::Var(v)), Ty::u32());
    }

    #[test]
    fn unify_same_var_is_empty() {
        let mut ctx = Context::new();
        let v = ctx.fresh_tau();
        assert_eq!(
            unify(&Ty::Var(v), &Ty::Var(v), &mut ctx),
            Ok(Subst::empty())
        );
    }

    #[test]
    fn occurs_check_fails() {
        let mut ctx = Context::new();
        let v = ctx.fresh_tau();
        let fun = Ty::fun(vec![Ty::Var(v)], Ty::u32());
        let err = unify(&Ty::Var(v), &fun, &mut ctx).unwrap_err();
        assert!(matches!(err, TypeError::RecursiveType { .. }));
        assert_eq!(err.to_string(), "recursive type");
    }

    #[test]
    fn occurs_check_sees_row_tail() {
        let mut ctx = Context::new();
        let v = ctx.fresh_tau();
        let row = instance_row(vec![("x", Ty::u32())], v);
        let err = unify(&Ty::Var(v), &Ty::partial(row), &mut ctx).unwrap_err();
        assert!(matches!(err, TypeError::RecursiveType { .. }));
    }

    #[test]
    fn unify_functions_thread_substitutions() {
        let mut ctx = Context::new();
        let a = ctx.fresh_tau();
        let b = ctx.fresh_tau();
        // fn(a, a) -> b  ~  fn(u32, u32) -> bool
        let f1 = Ty::fun(vec![Ty::Var(a), Ty::Var(a)], Ty::Var(b));
        let f2 = Ty::fun(vec![Ty::u32(), Ty::u32()], Ty::bool());
        let s = unify(&f1, &f2, &mut ctx).unwrap();
        assert_eq!(s.apply(&Ty::Var(a)), Ty::u32());
        assert_eq!(s.apply(&Ty::Var(b)), Ty::bool());
    }

    #[test]
    fn unify_function_conflicting_params_fails() {
        let mut ctx = Context::new();
        let a = ctx.fresh_tau();
        let f1 = Ty::fun(vec![Ty::Var(a), Ty::Var(a)], Ty::unit());
        let f2 = Ty::fun(vec![Ty::u32(), Ty::bool()], Ty::unit());
        let err = unify(&f1, &f2, &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected u32, got bool");
    }

    #[test]
    fn unify_function_arity_mismatch() {
        let mut ctx = Context::new();
        let f1 = Ty::fun(vec![Ty::u32()], Ty::unit());
        let f2 = Ty::fun(vec![Ty::u32(), Ty::u32()], Ty::unit());
        assert!(unify(&f1, &f2, &mut ctx).is_err());
    }

    #[test]
    fn unify_arrays_require_equal_length() {
        let mut ctx = Context::new();
        let a = Ty::array(Ty::u32(), 3);
        let b = Ty::array(Ty::u32(), 4);
        let err = unify(&a, &b, &mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: expected [u32; 3], got [u32; 4]"
        );
        assert!(unify(&a, &Ty::array(Ty::u32(), 3), &mut ctx).is_ok());
    }

    #[test]
    fn unify_named_structs() {
        let mut ctx = Context::new();
        assert!(unify(&Ty::named("A"), &Ty::named("A"), &mut ctx).is_ok());
        let err = unify(&Ty::named("A"), &Ty::named("B"), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected A, got B");
    }

    #[test]
    fn seal_row_against_declaration() {
        let mut ctx = Context::new();
        ctx.register_struct(StructDef::new(
            "Point",
            vec![("x".into(), Ty::u32()), ("y".into(), Ty::u32())],
        ));
        let elem = ctx.fresh_tau();
        let tail = ctx.fresh_tau();
        let row = instance_row(vec![("x", Ty::Var(elem))], tail);
        let partial = Ty::partial(row);

        let s = unify(&Ty::named("Point"), &partial, &mut ctx).unwrap();
        assert_eq!(s.apply(&Ty::Var(elem)), Ty::u32());
        // Sealing closes the row: applying the substitution collapses the
        // partial to the named struct.
        assert_eq!(s.apply(&partial), Ty::named("Point"));
    }

    #[test]
    fn seal_row_unknown_attribute() {
        let mut ctx = Context::new();
        ctx.register_struct(StructDef::new("Point", vec![("x".into(), Ty::u32())]));
        let tail = ctx.fresh_tau();
        let row = instance_row(vec![("z", Ty::u32())], tail);
        let err = unify(&Ty::named("Point"), &Ty::partial(row), &mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "attribute \"z\" does not exist on struct \"Point\""
        );
    }

    #[test]
    fn seal_row_attribute_type_conflict() {
        let mut ctx = Context::new();
        ctx.register_struct(StructDef::new("Point", vec![("x".into(), Ty::u32())]));
        let tail = ctx.fresh_tau();
        let row = instance_row(vec![("x", Ty::bool())], tail);
        let err = unify(&Ty::named("Point"), &Ty::partial(row), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected u32, got bool");
    }

    #[test]
    fn static_row_never_seals() {
        let mut ctx = Context::new();
        ctx.register_struct(StructDef::new("Point", vec![("x".into(), Ty::u32())]));
        let tail = ctx.fresh_tau();
        let row = Row::new(Vec::new(), tail, RowScope::Static);
        assert!(unify(&Ty::named("Point"), &Ty::partial(row), &mut ctx).is_err());
    }

    #[test]
    fn seal_against_undeclared_struct() {
        let mut ctx = Context::new();
        let tail = ctx.fresh_tau();
        let row = instance_row(vec![], tail);
        let err = unify(&Ty::named("Ghost"), &Ty::partial(row), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "undeclared struct \"Ghost\"");
    }

    #[test]
    fn merge_rows_shares_keys_and_tails() {
        let mut ctx = Context::new();
        let a = ctx.fresh_tau();
        let t1 = ctx.fresh_tau();
        let t2 = ctx.fresh_tau();
        let r1 = instance_row(vec![("x", Ty::Var(a)), ("y", Ty::bool())], t1);
        let r2 = instance_row(vec![("x", Ty::u32()), ("z", Ty::char())], t2);
        let p1 = Ty::partial(r1);
        let p2 = Ty::partial(r2);

        let s = unify(&p1, &p2, &mut ctx).unwrap();
        // Shared key unified.
        assert_eq!(s.apply(&Ty::Var(a)), Ty::u32());
        // Both sides collapse to the same merged row (same key set, same tail).
        let m1 = s.apply(&p1);
        let m2 = s.apply(&p2);
        for merged in [&m1, &m2] {
            match merged {
                Ty::Struct(StructTy::Partial(row)) => {
                    let mut keys: Vec<&str> =
                        row.fields.iter().map(|(k, _)| k.as_str()).collect();
                    keys.sort_unstable();
                    assert_eq!(keys, vec!["x", "y", "z"]);
                }
                other => panic!("expected partial struct, got {other}"),
            }
        }
        let tail_of = |ty: &Ty| match ty {
            Ty::Struct(StructTy::Partial(row)) => row.tail,
            _ => unreachable!(),
        };
        assert_eq!(tail_of(&m1), tail_of(&m2));
    }

    #[test]
    fn merge_rows_conflicting_shared_key() {
        let mut ctx = Context::new();
        let t1 = ctx.fresh_tau();
        let t2 = ctx.fresh_tau();
        let r1 = instance_row(vec![("x", Ty::u32())], t1);
        let r2 = instance_row(vec![("x", Ty::bool())], t2);
        let err = unify(&Ty::partial(r1), &Ty::partial(r2), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected u32, got bool");
    }

    #[test]
    fn merge_rows_same_tail_with_exclusives_fails() {
        let mut ctx = Context::new();
        let t = ctx.fresh_tau();
        let r1 = instance_row(vec![("x", Ty::u32())], t);
        let r2 = instance_row(vec![("y", Ty::bool())], t);
        let err = unify(&Ty::partial(r1), &Ty::partial(r2), &mut ctx).unwrap_err();
        assert!(matches!(err, TypeError::RecursiveType { .. }));
    }

    #[test]
    fn merge_rows_scope_mismatch() {
        let mut ctx = Context::new();
        let t1 = ctx.fresh_tau();
        let t2 = ctx.fresh_tau();
        let r1 = instance_row(vec![("x", Ty::u32())], t1);
        let r2 = Row::new(vec![("x".into(), Ty::u32())], t2, RowScope::Static);
        assert!(unify(&Ty::partial(r1), &Ty::partial(r2), &mut ctx).is_err());
    }
}
