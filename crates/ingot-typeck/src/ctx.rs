//! The inference context.
//!
//! Owns the fresh type-variable allocator, the global struct table, and the
//! function-return stack. One context lives for one compilation: the
//! desugaring pre-pass allocates node slots and registers struct
//! declarations through it, then hands it to `infer` together with the
//! Core AST.

use rustc_hash::FxHashMap;

use ingot_types::{Scheme, Ty, TyVar};

use crate::subst::Subst;

/// How an attribute is backed when it is a method slot.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSpec {
    /// Codegen-unique name, `"{Type}_{method}"`.
    pub mangled: String,
    /// Whether the method was declared with `mut self`.
    pub self_mut: bool,
}

/// One attribute of a struct declaration. Plain data attributes have
/// `method: None`; impl methods are installed as attributes with
/// `method: Some(..)` and a function type that excludes `self`.
#[derive(Clone, Debug, PartialEq)]
pub struct Attr {
    pub name: String,
    pub ty: Ty,
    pub method: Option<MethodSpec>,
}

impl Attr {
    /// A plain data attribute.
    pub fn field(name: impl Into<String>, ty: Ty) -> Self {
        Attr {
            name: name.into(),
            ty,
            method: None,
        }
    }
}

/// A static function attached to a struct, reachable as `Type.name`.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticFn {
    pub name: String,
    pub mangled: String,
    pub ty: Ty,
}

/// A registered struct declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub statics: Vec<StaticFn>,
}

impl StructDef {
    /// A struct with the given data attributes and no impls yet.
    pub fn new(name: impl Into<String>, fields: Vec<(String, Ty)>) -> Self {
        StructDef {
            name: name.into(),
            attrs: fields
                .into_iter()
                .map(|(name, ty)| Attr { name, ty, method: None })
                .collect(),
            statics: Vec::new(),
        }
    }

    /// Look up an attribute (data or method) by name.
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Look up a static function by its unmangled name.
    pub fn static_fn(&self, name: &str) -> Option<&StaticFn> {
        self.statics.iter().find(|s| s.name == name)
    }
}

/// The inference context.
pub struct Context {
    /// Next fresh type-variable index; monotonic, never recycled.
    next_var: u32,
    /// Registered struct declarations, in registration order. The order is
    /// observable: struct matching reports candidates in it.
    structs: Vec<StructDef>,
    /// Name -> index into `structs`.
    struct_index: FxHashMap<String, usize>,
    /// Return types of the lexically enclosing function bodies. Pushed on
    /// entry to a body, popped on normal exit; an error exit does not pop,
    /// so `infer` resets the stack when it starts.
    return_stack: Vec<Ty>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            next_var: 0,
            structs: Vec::new(),
            struct_index: FxHashMap::default(),
            return_stack: Vec::new(),
        }
    }

    // ── Fresh variables ─────────────────────────────────────────────────

    /// Allocate a fresh type-variable index. Used both for node slots
    /// (during desugaring) and for inference-internal variables.
    pub fn fresh_tau(&mut self) -> TyVar {
        let var = TyVar(self.next_var);
        self.next_var += 1;
        var
    }

    /// Allocate a fresh type variable.
    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.fresh_tau())
    }

    // ── Struct table ────────────────────────────────────────────────────

    /// Register a struct declaration. The table is append-only; the only
    /// later mutation is installation of impl methods and statics.
    pub fn register_struct(&mut self, def: StructDef) {
        self.struct_index
            .insert(def.name.clone(), self.structs.len());
        self.structs.push(def);
    }

    pub fn lookup_struct(&self, name: &str) -> Option<&StructDef> {
        self.struct_index.get(name).map(|&i| &self.structs[i])
    }

    /// All registered structs, in registration order.
    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    /// Install a method attribute on a registered struct.
    pub fn install_method(&mut self, type_name: &str, attr: Attr) {
        if let Some(&i) = self.struct_index.get(type_name) {
            self.structs[i].attrs.push(attr);
        }
    }

    /// Install a static function on a registered struct.
    pub fn install_static(&mut self, type_name: &str, static_fn: StaticFn) {
        if let Some(&i) = self.struct_index.get(type_name) {
            self.structs[i].statics.push(static_fn);
        }
    }

    // ── Return stack ────────────────────────────────────────────────────

    pub fn push_return(&mut self, ty: Ty) {
        self.return_stack.push(ty);
    }

    pub fn pop_return(&mut self) {
        self.return_stack.pop();
    }

    /// The innermost enclosing function's return type, if any.
    pub fn current_return(&self) -> Option<&Ty> {
        self.return_stack.last()
    }

    /// Clear the stack. `infer` calls this at entry so a failed previous
    /// pass cannot leak unpopped frames into this one.
    pub fn reset_returns(&mut self) {
        self.return_stack.clear();
    }

    pub fn return_depth(&self) -> usize {
        self.return_stack.len()
    }

    // ── Instantiation ───────────────────────────────────────────────────

    /// Instantiate a scheme: replace each quantified variable with a fresh
    /// one.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let mut subst = Subst::empty();
        for v in &scheme.vars {
            let fresh = self.fresh_var();
            subst.insert(*v, fresh);
        }
        subst.apply(&scheme.ty)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
