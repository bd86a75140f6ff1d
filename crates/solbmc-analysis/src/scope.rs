//! Stage: the variable scope resolver (spec §4.5).
//!
//! Grounded verbatim on `VariableScopeResolver.cpp`: a stack of local name
//! sets, searched innermost-first, falling through to a fixed rewrite
//! table for the chain-global identifiers when no local binds the name.

use crate::error::UnsupportedFeature;

/// A stack of lexical scopes, each holding the names declared directly in
/// it. Entering a block, a function body, or a parameter list pushes a new
/// scope; leaving it pops.
#[derive(Debug, Default)]
pub struct VariableScopeResolver {
    scopes: Vec<Vec<String>>,
}

impl VariableScopeResolver {
    pub fn new() -> Self {
        Self { scopes: vec![Vec::new()] }
    }

    /// Pushes a fresh, empty scope.
    pub fn enter(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Pops the innermost scope. Panics if called without a matching
    /// `enter` (the caller, not this type, owns block nesting discipline).
    pub fn exit(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Records that `name` is bound by the innermost scope.
    pub fn record(&mut self, name: impl Into<String>) {
        self.scopes.last_mut().expect("at least one scope always present").push(name.into());
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.iter().any(|n| n == name))
    }

    /// Resolves `name` to its lowered C-like form.
    ///
    /// Precedence, matching the reference resolver exactly: a local
    /// binding shadows everything; failing that, `this` becomes `self`;
    /// `super` is rejected outright; `block`/`msg`/`tx` become `state`;
    /// `now` becomes `state->blocknum`; anything else is a storage field
    /// access, `self->d_<name>`.
    pub fn resolve(&self, name: &str) -> Result<String, UnsupportedFeature> {
        if self.is_local(name) {
            return Ok(name.to_string());
        }
        match name {
            "this" => Ok("self".to_string()),
            "super" => Err(UnsupportedFeature::BareSuper),
            "block" | "msg" | "tx" => Ok("state".to_string()),
            "now" => Ok("state->blocknum".to_string()),
            other => Ok(format!("self->d_{other}")),
        }
    }

    /// The struct-context variant of [`Self::resolve`]'s fallback rule:
    /// used when naming a storage field in a record definition, where
    /// there is no `self->` pointer to dereference.
    pub fn field_name(name: &str) -> String {
        format!("d_{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_with_no_locals_in_scope() {
        let r = VariableScopeResolver::new();
        assert_eq!(r.resolve("this").unwrap(), "self");
        assert_eq!(r.resolve("now").unwrap(), "state->blocknum");
        assert_eq!(r.resolve("msg").unwrap(), "state");
        assert_eq!(r.resolve("block").unwrap(), "state");
        assert_eq!(r.resolve("tx").unwrap(), "state");
        assert_eq!(r.resolve("x").unwrap(), "self->d_x");
        assert!(r.resolve("super").is_err());
    }

    #[test]
    fn local_binding_shadows_the_rewrite_table() {
        let mut r = VariableScopeResolver::new();
        r.enter();
        r.record("msg"); // pathological but legal: a local named `msg`
        assert_eq!(r.resolve("msg").unwrap(), "msg");
        r.exit();
        assert_eq!(r.resolve("msg").unwrap(), "state");
    }

    #[test]
    fn scope_exit_restores_outer_binding() {
        let mut r = VariableScopeResolver::new();
        r.record("x");
        assert_eq!(r.resolve("x").unwrap(), "x");
        r.enter();
        assert_eq!(r.resolve("x").unwrap(), "x");
        r.exit();
        assert_eq!(r.resolve("x").unwrap(), "x");
    }
}
