//! Type environment: identifier name -> type scheme.
//!
//! The environment is a plain map because the inference walker threads
//! cloned environments through substitution application rather than pushing
//! and popping scopes: entering a binder clones and extends, and the clone
//! is dropped on the way out. Shadowing replaces the previous binding.

use rustc_hash::FxHashMap;

use ingot_types::{Scheme, TyVar};

use crate::subst::Subst;

/// A type environment mapping names to type schemes.
#[derive(Clone, Debug, Default)]
pub struct TypeEnv {
    bindings: FxHashMap<String, Scheme>,
}

impl TypeEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        TypeEnv {
            bindings: FxHashMap::default(),
        }
    }

    /// Bind a name to a scheme, replacing any previous binding.
    pub fn insert(&mut self, name: String, scheme: Scheme) {
        self.bindings.insert(name, scheme);
    }

    /// Remove a binding, if present.
    pub fn remove(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    /// Look up a name.
    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scheme)> {
        self.bindings.iter()
    }

    /// Apply a substitution to every scheme body, quantifiers intact.
    pub fn apply(&self, subst: &Subst) -> TypeEnv {
        TypeEnv {
            bindings: self
                .bindings
                .iter()
                .map(|(name, scheme)| (name.clone(), subst.apply_scheme(scheme)))
                .collect(),
        }
    }

    /// Collect the variables free in any binding's scheme.
    pub fn free_vars(&self, out: &mut Vec<TyVar>) {
        for scheme in self.bindings.values() {
            scheme.free_vars(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingot_types::{Scheme, Ty};

    #[test]
    fn insert_and_lookup() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::u32()));
        assert!(env.lookup("x").is_some());
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn shadowing_replaces() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::u32()));
        env.insert("x".into(), Scheme::mono(Ty::bool()));
        assert_eq!(env.lookup("x").unwrap().ty, Ty::bool());
    }

    #[test]
    fn apply_rewrites_scheme_bodies() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::Var(TyVar(0))));
        let s = Subst::singleton(TyVar(0), Ty::u32());
        let applied = env.apply(&s);
        assert_eq!(applied.lookup("x").unwrap().ty, Ty::u32());
    }

    #[test]
    fn free_vars_exclude_quantified() {
        let mut env = TypeEnv::new();
        env.insert(
            "id".into(),
            Scheme {
                vars: vec![TyVar(0)],
                ty: Ty::fun(vec![Ty::Var(TyVar(0))], Ty::Var(TyVar(0))),
            },
        );
        env.insert("x".into(), Scheme::mono(Ty::Var(TyVar(3))));
        let mut vars = Vec::new();
        env.free_vars(&mut vars);
        assert_eq!(vars, vec![TyVar(3)]);
    }
}
