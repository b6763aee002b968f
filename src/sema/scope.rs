// src/sema/scope.rs

use rustc_hash::FxHashMap;

use crate::sema::VariableDecl;

/// Handle to one frame in a [`VariableScopes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Frame {
    variables: FxHashMap<String, VariableDecl>,
    parent: Option<ScopeId>,
}

/// Lexically nested variable frames, arena-allocated so that comprehension
/// scopes stay alive for the whole resolver walk.
///
/// The root frame is empty; lookups that fall off the chain are resolved
/// against the environment by the caller.
#[derive(Debug)]
pub struct VariableScopes {
    frames: Vec<Frame>,
}

impl Default for VariableScopes {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableScopes {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Create a child frame of `parent`.
    pub fn make_nested(&mut self, parent: ScopeId) -> ScopeId {
        self.frames.push(Frame {
            variables: FxHashMap::default(),
            parent: Some(parent),
        });
        ScopeId(self.frames.len() - 1)
    }

    /// Bind `decl` in `scope` unless that same frame already binds the name.
    pub fn insert_if_absent(&mut self, scope: ScopeId, decl: VariableDecl) {
        let frame = &mut self.frames[scope.0];
        frame.variables.entry(decl.name.clone()).or_insert(decl);
    }

    /// Innermost binding for `name`, walking parent links from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&VariableDecl> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(decl) = frame.variables.get(name) {
                return Some(decl);
            }
            current = frame.parent;
        }
        None
    }
}
