//! Structural struct matching.
//!
//! Given a partial row -- the attributes observed on some value whose
//! declaration is not yet known -- this pass scans the registered struct
//! declarations and reports how many are consistent with it. Attribute
//! access uses the outcome to collapse a partial type to a named struct
//! (exactly one candidate), keep it open (several), or reject it (none).

use ingot_types::{Row, RowScope};

use crate::ctx::Context;
use crate::subst::Subst;
use crate::unify::unify;

/// The outcome of matching a row against the struct table.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    /// No declaration is consistent with the row.
    NoMatch,
    /// Exactly one declaration is consistent.
    OneMatch(String),
    /// Several declarations are consistent, in registration order.
    MultipleMatches(Vec<String>),
}

/// Match a row against every registered struct declaration.
///
/// A declaration is consistent when each row binding names one of its
/// attributes (data or method) and the binding's type unifies with the
/// declared attribute type. The trial unifications are speculative: their
/// substitutions are threaded within one candidate for consistency but
/// discarded afterwards.
///
/// Static rows resolve against static-function namespaces, not attribute
/// namespaces, so they never match a declaration.
pub fn match_row(row: &Row, ctx: &mut Context) -> MatchOutcome {
    if row.scope == RowScope::Static {
        return MatchOutcome::NoMatch;
    }

    let defs: Vec<_> = ctx.structs().to_vec();
    let mut hits = Vec::new();

    'candidates: for def in &defs {
        let mut s = Subst::empty();
        for (attr_name, bound_ty) in &row.fields {
            let attr = match def.attr(attr_name) {
                Some(attr) => attr,
                None => continue 'candidates,
            };
            match unify(&s.apply(&attr.ty), &s.apply(bound_ty), ctx) {
                Ok(s2) => s = s2.compose(&s),
                Err(_) => continue 'candidates,
            }
        }
        hits.push(def.name.clone());
    }

    match hits.len() {
        0 => MatchOutcome::NoMatch,
        1 => MatchOutcome::OneMatch(hits.remove(0)),
        _ => MatchOutcome::MultipleMatches(hits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::StructDef;
    use ingot_types::{Ty, TyVar};

    fn setup() -> Context {
        let mut ctx = Context::new();
        ctx.register_struct(StructDef::new("A", vec![("x".into(), Ty::u32())]));
        ctx.register_struct(StructDef::new(
            "B",
            vec![("x".into(), Ty::u32()), ("y".into(), Ty::bool())],
        ));
        ctx
    }

    fn row(fields: Vec<(&str, Ty)>, tail: TyVar) -> Row {
        Row::new(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            tail,
            RowScope::Instance,
        )
    }

    #[test]
    fn ambiguous_row_matches_both() {
        let mut ctx = setup();
        let tail = ctx.fresh_tau();
        let open = ctx.fresh_var();
        let r = row(vec![("x", open)], tail);
        assert_eq!(
            match_row(&r, &mut ctx),
            MatchOutcome::MultipleMatches(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn extra_attribute_narrows_to_one() {
        let mut ctx = setup();
        let tail = ctx.fresh_tau();
        let open = ctx.fresh_var();
        let r = row(vec![("x", Ty::u32()), ("y", open)], tail);
        assert_eq!(match_row(&r, &mut ctx), MatchOutcome::OneMatch("B".into()));
    }

    #[test]
    fn incompatible_binding_rules_out_candidate() {
        let mut ctx = setup();
        let tail = ctx.fresh_tau();
        // x: bool rules out both A and B, whose x is u32.
        let r = row(vec![("x", Ty::bool())], tail);
        assert_eq!(match_row(&r, &mut ctx), MatchOutcome::NoMatch);
    }

    #[test]
    fn unknown_attribute_rules_out_everything() {
        let mut ctx = setup();
        let tail = ctx.fresh_tau();
        let r = row(vec![("zz", Ty::u32())], tail);
        assert_eq!(match_row(&r, &mut ctx), MatchOutcome::NoMatch);
    }

    #[test]
    fn bindings_are_checked_together() {
        let mut ctx = Context::new();
        // C's two attributes share a type only when both are u32.
        ctx.register_struct(StructDef::new(
            "C",
            vec![("a".into(), Ty::u32()), ("b".into(), Ty::bool())],
        ));
        let tail = ctx.fresh_tau();
        let shared = ctx.fresh_var();
        // One shared variable bound to both attributes cannot satisfy
        // u32 and bool at once.
        let r = row(vec![("a", shared.clone()), ("b", shared)], tail);
        assert_eq!(match_row(&r, &mut ctx), MatchOutcome::NoMatch);
    }

    #[test]
    fn static_rows_never_match() {
        let mut ctx = setup();
        let tail = ctx.fresh_tau();
        let r = Row::new(vec![("x".into(), Ty::u32())], tail, RowScope::Static);
        assert_eq!(match_row(&r, &mut ctx), MatchOutcome::NoMatch);
    }
}
