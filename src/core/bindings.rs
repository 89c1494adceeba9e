use std::collections::HashMap;

/// What an identifier is believed to refer to at a given point of a file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Origin {
    /// An import alias; the payload is the fully qualified dotted path.
    ImportedModule(String),
    /// The result of a recognised chain-returning API call, tagged with the
    /// module whose surface that result belongs to.
    ResolvedCall(String),
    #[default]
    Unknown,
}

impl Origin {
    /// Follow an attribute access (`base.attr`) without invoking anything.
    pub fn attribute(&self, attr: &str) -> Origin {
        match self {
            Origin::ImportedModule(path) => Origin::ImportedModule(format!("{path}.{attr}")),
            Origin::ResolvedCall(owner) => Origin::ResolvedCall(owner.clone()),
            Origin::Unknown => Origin::Unknown,
        }
    }

    pub fn owner_hint(&self) -> Option<&str> {
        match self {
            Origin::ResolvedCall(owner) => Some(owner),
            _ => None,
        }
    }
}

/// Scope stack of identifier bindings for a single file.
///
/// The module scope is created with the tracker and is never popped. Inner
/// scopes shadow outer ones; popping a scope makes the outer binding visible
/// again.
#[derive(Debug)]
pub struct BindingTracker {
    scopes: Vec<HashMap<String, Origin>>,
    star_modules: Vec<String>,
}

impl BindingTracker {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            star_modules: Vec::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// `import a.b as x` binds `x` to `a.b`; `from a.b import c as x` binds
    /// `x` to the concrete name `a.b.c`.
    pub fn bind_import(&mut self, identifier: &str, module_path: &str) {
        self.bind(identifier, Origin::ImportedModule(module_path.to_string()));
    }

    pub fn bind_assignment(&mut self, identifier: &str, rhs_origin: Origin) {
        self.bind(identifier, rhs_origin);
    }

    /// `from a.b import *`: names cannot be bound individually, so the
    /// module is remembered for bare-name calls that nothing else binds.
    pub fn bind_star_import(&mut self, module_path: &str) {
        if !self.star_modules.iter().any(|m| m == module_path) {
            self.star_modules.push(module_path.to_string());
        }
    }

    pub fn star_modules(&self) -> &[String] {
        &self.star_modules
    }

    pub fn lookup(&self, identifier: &str) -> Origin {
        self.find(identifier).cloned().unwrap_or_default()
    }

    pub fn is_bound(&self, identifier: &str) -> bool {
        self.find(identifier).is_some()
    }

    fn find(&self, identifier: &str) -> Option<&Origin> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(identifier))
    }

    fn bind(&mut self, identifier: &str, origin: Origin) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(identifier.to_string(), origin);
        }
    }
}

impl Default for BindingTracker {
    fn default() -> Self {
        Self::new()
    }
}
