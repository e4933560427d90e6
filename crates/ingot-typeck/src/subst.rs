//! Substitutions: finite maps from type variables to types.
//!
//! A substitution records the assignments discovered by unification.
//! Application chases variable chains to their fixed point, so applying a
//! substitution twice gives the same result as applying it once.
//! Composition is left-biased: `s2.compose(&s1)` maps every variable `v` to
//! `s2(s1(v))`, which is the substitution that first applies `s1` and then
//! `s2`.

use rustc_hash::FxHashMap;

use ingot_types::{Row, Scheme, StructTy, Ty, TyVar};

use crate::env::TypeEnv;

/// A substitution mapping type variables to types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subst(FxHashMap<TyVar, Ty>);

impl Subst {
    /// The empty substitution.
    pub fn empty() -> Self {
        Subst(FxHashMap::default())
    }

    /// A substitution with a single mapping.
    pub fn singleton(var: TyVar, ty: Ty) -> Self {
        let mut map = FxHashMap::default();
        map.insert(var, ty);
        Subst(map)
    }

    /// Insert a mapping, replacing any existing one for `var`.
    pub fn insert(&mut self, var: TyVar, ty: Ty) {
        self.0.insert(var, ty);
    }

    pub fn get(&self, var: TyVar) -> Option<&Ty> {
        self.0.get(&var)
    }

    pub fn contains(&self, var: TyVar) -> bool {
        self.0.contains_key(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TyVar, &Ty)> {
        self.0.iter()
    }

    /// Apply this substitution to a type.
    ///
    /// Variables are chased through the map until an unmapped variable or a
    /// constructor is reached, so the result is a fixed point of the
    /// substitution. Termination relies on the occurs check keeping the map
    /// acyclic; a variable mapped to itself is treated as unmapped.
    pub fn apply(&self, ty: &Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.0.get(v) {
                Some(Ty::Var(w)) if w == v => ty.clone(),
                Some(mapped) => self.apply(mapped),
                None => ty.clone(),
            },
            Ty::Con(name, params) => Ty::Con(
                name.clone(),
                params.iter().map(|p| self.apply(p)).collect(),
            ),
            Ty::Fun(params, ret) => Ty::Fun(
                params.iter().map(|p| self.apply(p)).collect(),
                Box::new(self.apply(ret)),
            ),
            Ty::Tuple(elems) => {
                Ty::Tuple(elems.iter().map(|e| self.apply(e)).collect())
            }
            Ty::Array(elem, len) => Ty::Array(Box::new(self.apply(elem)), *len),
            Ty::Struct(StructTy::Named(_)) => ty.clone(),
            Ty::Struct(StructTy::Partial(row)) => self.apply_row(row),
        }
    }

    /// Apply this substitution to an open row.
    ///
    /// Bindings are rewritten pointwise. The tail is rewritten too: a tail
    /// bound to another row merges flat (our bindings win on shared keys,
    /// which unification has already equated); a tail bound to a named
    /// struct seals the whole row to that struct; a tail bound to a
    /// variable re-tails the row.
    fn apply_row(&self, row: &Row) -> Ty {
        let mut fields: Vec<(String, Ty)> = row
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), self.apply(v)))
            .collect();

        match self.apply(&Ty::Var(row.tail)) {
            Ty::Var(tail) => {
                Ty::partial(Row::new(fields, tail, row.scope))
            }
            Ty::Struct(StructTy::Named(name)) => Ty::named(name),
            Ty::Struct(StructTy::Partial(rest)) => {
                for (k, v) in rest.fields {
                    if !fields.iter().any(|(k0, _)| *k0 == k) {
                        fields.push((k, v));
                    }
                }
                Ty::partial(Row::new(fields, rest.tail, row.scope))
            }
            // A tail bound to anything else never arises from unification;
            // leave the row open rather than lose its bindings.
            _ => Ty::partial(Row::new(fields, row.tail, row.scope)),
        }
    }

    /// Apply this substitution to a scheme, leaving the quantifiers intact.
    ///
    /// Quantified variables are shielded from the map so a scheme can never
    /// have its generic variables captured.
    pub fn apply_scheme(&self, scheme: &Scheme) -> Scheme {
        if scheme.vars.is_empty() {
            return Scheme::mono(self.apply(&scheme.ty));
        }
        let shielded = Subst(
            self.0
                .iter()
                .filter(|(v, _)| !scheme.vars.contains(v))
                .map(|(v, t)| (*v, t.clone()))
                .collect(),
        );
        Scheme {
            vars: scheme.vars.clone(),
            ty: shielded.apply(&scheme.ty),
        }
    }

    /// Compose this substitution with one produced earlier:
    /// `s2.compose(&s1)` applies `s1` first, then `s2`.
    ///
    /// Every binding of `earlier` is rewritten through `self`, and bindings
    /// of `self` for variables `earlier` does not mention are carried over.
    /// Bindings that collapse to the identity are dropped.
    pub fn compose(&self, earlier: &Subst) -> Subst {
        let mut map = FxHashMap::default();
        for (var, ty) in earlier.iter() {
            let rewritten = self.apply(ty);
            if rewritten != Ty::Var(*var) {
                map.insert(*var, rewritten);
            }
        }
        for (var, ty) in self.iter() {
            if !earlier.contains(*var) && !map.contains_key(var) {
                map.insert(*var, ty.clone());
            }
        }
        Subst(map)
    }

    /// Rewrite the whole map so every binding is fully applied. At the
    /// fixed point `compose(s, s) == s` and `apply` needs no chasing.
    pub fn normalize(&self) -> Subst {
        Subst(
            self.0
                .iter()
                .map(|(v, t)| (*v, self.apply(t)))
                .filter(|(v, t)| *t != Ty::Var(*v))
                .collect(),
        )
    }
}

/// Close a type over the variables that are free in it but not in the
/// environment. The quantifier order follows first appearance in the type,
/// so generalization is deterministic.
pub fn generalize(env: &TypeEnv, ty: &Ty) -> Scheme {
    let mut ty_vars = Vec::new();
    ty.free_vars(&mut ty_vars);

    let mut env_vars = Vec::new();
    env.free_vars(&mut env_vars);

    let mut vars = Vec::new();
    for v in ty_vars {
        if !env_vars.contains(&v) && !vars.contains(&v) {
            vars.push(v);
        }
    }

    Scheme {
        vars,
        ty: ty.clone(),
    }
}
