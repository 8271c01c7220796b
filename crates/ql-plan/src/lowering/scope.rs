//! Lexical scopes: the stack of schemas a variable reference can see

use crate::ir::schema::{find_binding, Binding};
use ql_ast::Symbol;

/// A chain of binding frames, innermost first.
///
/// Depth 0 is the frame of the clause being lowered; each enclosing query
/// level adds one.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'s> {
    frame: &'s [Binding],
    outer: Option<&'s Scope<'s>>,
}

impl<'s> Scope<'s> {
    /// Scope with no bindings at all
    pub(crate) fn empty() -> Scope<'static> {
        Scope {
            frame: &[],
            outer: None,
        }
    }

    /// A new innermost frame on top of this scope
    pub(crate) fn nested<'t>(&'t self, frame: &'t [Binding]) -> Scope<'t> {
        Scope {
            frame,
            outer: Some(self),
        }
    }

    /// `(depth, offset)` of the nearest binding `symbol` refers to
    pub(crate) fn resolve(&self, symbol: &Symbol) -> Option<(usize, usize)> {
        let mut depth = 0;
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(offset) = find_binding(scope.frame, symbol) {
                return Some((depth, offset));
            }
            depth += 1;
            current = scope.outer;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(names: &[&str]) -> Vec<Binding> {
        names.iter().map(|n| Binding::new(*n)).collect()
    }

    #[test]
    fn test_inner_frame_shadows_outer() {
        let outer_frame = frame(&["x", "y"]);
        let inner_frame = frame(&["y"]);
        let root = Scope::empty();
        let outer = root.nested(&outer_frame);
        let inner = outer.nested(&inner_frame);

        assert_eq!(inner.resolve(&Symbol::regular("y")), Some((0, 0)));
        assert_eq!(inner.resolve(&Symbol::regular("X")), Some((1, 0)));
        assert_eq!(inner.resolve(&Symbol::regular("z")), None);
    }

    #[test]
    fn test_delimited_lookup_is_exact() {
        let f = frame(&["Name"]);
        let root = Scope::empty();
        let scope = root.nested(&f);
        assert_eq!(scope.resolve(&Symbol::delimited("Name")), Some((0, 0)));
        assert_eq!(scope.resolve(&Symbol::delimited("name")), None);
    }
}
