use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::Node as TSNode;

use super::bindings::{BindingTracker, Origin};
use super::catalog::{ArgCount, Catalog, CatalogEntry};
use super::redactor::Redactor;
use super::report::Match;
use crate::parsers::common::{extract_text, LineIndex};

/// Order in which the two same-name tie-breaks are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreakPolicy {
    /// Owner of the receiver's believed origin first, then arity.
    #[default]
    OwnerFirst,
    /// Arity first; the owner only separates several arity fits.
    ArityFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'c> {
    Resolved(&'c CatalogEntry),
    /// Several candidates survive every tie-break; no match is emitted.
    Ambiguous,
    /// The name is not part of the tracked surface.
    Untracked,
}

/// Catalog-side half of call resolution: picks at most one entry for a
/// member name given what its receiver is believed to be.
#[derive(Debug, Clone, Copy)]
pub struct CallResolver<'c> {
    catalog: &'c Catalog,
    policy: TieBreakPolicy,
}

impl<'c> CallResolver<'c> {
    pub fn new(catalog: &'c Catalog, policy: TieBreakPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn resolve(&self, member: &str, base: &Origin, args: ArgCount) -> Resolution<'c> {
        let candidates = self.catalog.lookup(member);
        if candidates.is_empty() {
            return Resolution::Untracked;
        }

        match base {
            Origin::ImportedModule(path) => self.resolve_imported(path, candidates, args),
            other => self.tie_break(candidates.iter().collect(), other.owner_hint(), args),
        }
    }

    /// An import pins the owner. Without an exact hit only entries of the same
    /// top-level package stay in play; calls into other libraries never fall
    /// back to a bare-name match.
    fn resolve_imported(
        &self,
        path: &str,
        candidates: &'c [CatalogEntry],
        args: ArgCount,
    ) -> Resolution<'c> {
        if let Some(entry) = candidates.iter().find(|e| e.owner_module == path) {
            return Resolution::Resolved(entry);
        }

        let package = path.split('.').next().unwrap_or(path);
        let related: Vec<&CatalogEntry> = candidates
            .iter()
            .filter(|e| same_package(&e.owner_module, package))
            .collect();

        if related.is_empty() {
            Resolution::Untracked
        } else {
            self.tie_break(related, None, args)
        }
    }

    fn tie_break(
        &self,
        candidates: Vec<&'c CatalogEntry>,
        owner: Option<&str>,
        args: ArgCount,
    ) -> Resolution<'c> {
        if let [only] = candidates.as_slice() {
            return Resolution::Resolved(*only);
        }

        let owned_by = |pool: &[&'c CatalogEntry]| {
            owner.and_then(|owner| pool.iter().copied().find(|e| e.owner_module == owner))
        };
        let fitting: Vec<&CatalogEntry> = candidates
            .iter()
            .copied()
            .filter(|e| e.arity.accepts(args))
            .collect();

        let chosen = match self.policy {
            TieBreakPolicy::OwnerFirst => owned_by(candidates.as_slice()).or(match fitting.as_slice() {
                [only] => Some(*only),
                _ => None,
            }),
            TieBreakPolicy::ArityFirst => match fitting.as_slice() {
                [only] => Some(*only),
                [] => owned_by(candidates.as_slice()),
                several => owned_by(several),
            },
        };

        chosen.map_or(Resolution::Ambiguous, Resolution::Resolved)
    }
}

fn same_package(module: &str, package: &str) -> bool {
    module == package
        || module
            .strip_prefix(package)
            .map_or(false, |rest| rest.starts_with('.'))
}

/// A call expression decomposed into receiver origin and invoked member.
#[derive(Debug, Clone)]
pub struct CallSite<'tree> {
    pub node: TSNode<'tree>,
    /// Identifier of the invoked name; its position is reported.
    pub member_node: TSNode<'tree>,
    pub member: String,
    pub base: Origin,
    pub args: ArgCount,
}

impl CallSite<'_> {
    pub fn line(&self) -> usize {
        self.member_node.start_position().row + 1
    }

    pub fn column(&self) -> usize {
        self.member_node.start_position().column
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub file: PathBuf,
    pub matches: Vec<Match>,
    pub ambiguous_call_sites: usize,
}

/// Walks one file's tree and emits a [`Match`] for every call the catalog
/// attributes to exactly one owner. Shared read-only by all scan workers.
pub struct CallSiteExtractor<'c> {
    resolver: CallResolver<'c>,
    redactor: Redactor,
}

impl<'c> CallSiteExtractor<'c> {
    pub fn new(catalog: &'c Catalog, policy: TieBreakPolicy, redactor: Redactor) -> Self {
        Self {
            resolver: CallResolver::new(catalog, policy),
            redactor,
        }
    }

    pub fn extract_from_ast(&self, root: &TSNode, source: &[u8], file_path: &Path) -> FileAnalysis {
        let mut walker = Walker {
            resolver: &self.resolver,
            redactor: &self.redactor,
            root: *root,
            source,
            lines: LineIndex::new(source),
            file: file_path,
            tracker: BindingTracker::new(),
            matches: Vec::new(),
            ambiguous: 0,
        };
        walker.eval(*root);

        FileAnalysis {
            file: file_path.to_path_buf(),
            matches: walker.matches,
            ambiguous_call_sites: walker.ambiguous,
        }
    }
}

struct Walker<'w, 'tree> {
    resolver: &'w CallResolver<'w>,
    redactor: &'w Redactor,
    root: TSNode<'tree>,
    source: &'w [u8],
    lines: LineIndex,
    file: &'w Path,
    tracker: BindingTracker,
    matches: Vec<Match>,
    ambiguous: usize,
}

impl<'w, 'tree> Walker<'w, 'tree> {
    fn text(&self, node: &TSNode<'tree>) -> &'w str {
        extract_text(node, self.source)
    }

    /// Single depth-first pass. Statements return `Unknown`; expressions
    /// return the origin their value is believed to have.
    fn eval(&mut self, node: TSNode<'tree>) -> Origin {
        match node.kind() {
            "identifier" => self.tracker.lookup(self.text(&node)),
            "attribute" => {
                let base = match node.child_by_field_name("object") {
                    Some(object) => self.eval(object),
                    None => Origin::Unknown,
                };
                match node.child_by_field_name("attribute") {
                    Some(attr) => base.attribute(self.text(&attr)),
                    None => Origin::Unknown,
                }
            }
            "call" => self.eval_call(node),
            "parenthesized_expression" => self.eval_children(node),
            "assignment" => self.eval_assignment(node),
            "named_expression" => {
                let origin = match node.child_by_field_name("value") {
                    Some(value) => self.eval(value),
                    None => Origin::Unknown,
                };
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind_target(name, origin.clone());
                }
                origin
            }
            "augmented_assignment" => {
                if let Some(right) = node.child_by_field_name("right") {
                    self.eval(right);
                }
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_target(left, Origin::Unknown);
                }
                Origin::Unknown
            }
            "as_pattern" => {
                let origin = match node.named_child(0) {
                    Some(value) => self.eval(value),
                    None => Origin::Unknown,
                };
                if let Some(alias) = node.child_by_field_name("alias") {
                    self.bind_target(alias, origin.clone());
                }
                origin
            }
            "with_item" => {
                let origin = match node.child_by_field_name("value") {
                    Some(value) => self.eval(value),
                    None => Origin::Unknown,
                };
                if let Some(alias) = node.child_by_field_name("alias") {
                    self.bind_target(alias, origin);
                }
                Origin::Unknown
            }
            "import_statement" => {
                self.visit_import(node);
                Origin::Unknown
            }
            "import_from_statement" => {
                self.visit_import_from(node);
                Origin::Unknown
            }
            "function_definition" => {
                self.visit_function(node);
                Origin::Unknown
            }
            "class_definition" => {
                self.visit_class(node);
                Origin::Unknown
            }
            "lambda" => {
                self.tracker.push_scope();
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.bind_parameters(params);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.eval(body);
                }
                self.tracker.pop_scope();
                Origin::Unknown
            }
            "block" => {
                self.tracker.push_scope();
                self.eval_children(node);
                self.tracker.pop_scope();
                Origin::Unknown
            }
            "for_statement" | "for_in_clause" => {
                if let Some(right) = node.child_by_field_name("right") {
                    self.eval(right);
                }
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_target(left, Origin::Unknown);
                }
                let mut cursor = node.walk();
                let rest: Vec<TSNode<'tree>> = node
                    .named_children(&mut cursor)
                    .filter(|child| {
                        Some(*child) != node.child_by_field_name("left")
                            && Some(*child) != node.child_by_field_name("right")
                    })
                    .collect();
                for child in rest {
                    self.eval(child);
                }
                Origin::Unknown
            }
            "list_comprehension"
            | "set_comprehension"
            | "dictionary_comprehension"
            | "generator_expression" => {
                self.eval_comprehension(node);
                Origin::Unknown
            }
            "comment" | "future_import_statement" | "global_statement" | "nonlocal_statement" => {
                Origin::Unknown
            }
            _ => {
                self.eval_children(node);
                Origin::Unknown
            }
        }
    }

    /// Evaluates every named child; yields the origin of the last
    /// non-comment one (the value of a parenthesised expression).
    fn eval_children(&mut self, node: TSNode<'tree>) -> Origin {
        let mut cursor = node.walk();
        let children: Vec<TSNode<'tree>> = node.named_children(&mut cursor).collect();
        let mut origin = Origin::Unknown;
        for child in children {
            let value = self.eval(child);
            if child.kind() != "comment" {
                origin = value;
            }
        }
        origin
    }

    /// Clauses run before the element expression, in their own scope.
    fn eval_comprehension(&mut self, node: TSNode<'tree>) {
        let mut cursor = node.walk();
        let (clauses, body): (Vec<TSNode<'tree>>, Vec<TSNode<'tree>>) = node
            .named_children(&mut cursor)
            .partition(|child| matches!(child.kind(), "for_in_clause" | "if_clause"));

        self.tracker.push_scope();
        for child in clauses.into_iter().chain(body) {
            self.eval(child);
        }
        self.tracker.pop_scope();
    }

    fn eval_assignment(&mut self, node: TSNode<'tree>) -> Origin {
        let origin = match node.child_by_field_name("right") {
            Some(right) => self.eval(right),
            None => return Origin::Unknown,
        };
        if let Some(left) = node.child_by_field_name("left") {
            self.bind_target(left, origin.clone());
        }
        origin
    }

    /// A lone name takes the origin; names inside a destructuring pattern
    /// become `Unknown`; attribute and subscript targets are only walked.
    fn bind_target(&mut self, target: TSNode<'tree>, origin: Origin) {
        match target.kind() {
            "identifier" => {
                let name = self.text(&target);
                self.tracker.bind_assignment(name, origin);
            }
            "as_pattern_target" => match target.named_child(0) {
                Some(inner) => self.bind_target(inner, origin),
                None => {
                    let name = self.text(&target);
                    self.tracker.bind_assignment(name, origin);
                }
            },
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "list_splat_pattern" | "parenthesized_expression" => {
                let mut cursor = target.walk();
                let parts: Vec<TSNode<'tree>> = target.named_children(&mut cursor).collect();
                for part in parts {
                    self.bind_target(part, Origin::Unknown);
                }
            }
            _ => {
                self.eval(target);
            }
        }
    }

    fn visit_import(&mut self, node: TSNode<'tree>) {
        let mut cursor = node.walk();
        let names: Vec<TSNode<'tree>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            match name.kind() {
                "dotted_name" => {
                    // `import a.b` binds only `a`
                    let path = self.text(&name);
                    let root = path.split('.').next().unwrap_or(path);
                    self.tracker.bind_import(root, root);
                }
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    let (path, alias) = (self.text(&target), self.text(&alias));
                    self.tracker.bind_import(alias, path);
                }
                _ => {}
            }
        }
    }

    fn visit_import_from(&mut self, node: TSNode<'tree>) {
        let module = node.child_by_field_name("module_name");
        let module_path = module
            .filter(|m| m.kind() == "dotted_name")
            .map(|m| self.text(&m));

        let mut cursor = node.walk();
        if node
            .children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import")
        {
            if let Some(module_path) = module_path {
                self.tracker.bind_star_import(module_path);
            }
            return;
        }

        let mut cursor = node.walk();
        let names: Vec<TSNode<'tree>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let (imported, local) = match name.kind() {
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    (self.text(&target), self.text(&alias))
                }
                _ => {
                    let text = self.text(&name);
                    (text, text)
                }
            };

            match module_path {
                Some(module_path) => {
                    let qualified = format!("{module_path}.{imported}");
                    self.tracker.bind_import(local, &qualified);
                }
                // relative import: project code, shadows any API name
                None => self.tracker.bind_assignment(local, Origin::Unknown),
            }
        }
    }

    fn visit_function(&mut self, node: TSNode<'tree>) {
        if let Some(params) = node.child_by_field_name("parameters") {
            // defaults and annotations are evaluated in the enclosing scope
            self.eval_children(params);
        }
        if let Some(name) = node.child_by_field_name("name") {
            let name = self.text(&name);
            self.tracker.bind_assignment(name, Origin::Unknown);
        }

        self.tracker.push_scope();
        if let Some(params) = node.child_by_field_name("parameters") {
            self.bind_parameters(params);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.eval(body);
        }
        self.tracker.pop_scope();
    }

    fn visit_class(&mut self, node: TSNode<'tree>) {
        if let Some(bases) = node.child_by_field_name("superclasses") {
            self.eval(bases);
        }
        if let Some(name) = node.child_by_field_name("name") {
            let name = self.text(&name);
            self.tracker.bind_assignment(name, Origin::Unknown);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.eval(body);
        }
    }

    fn bind_parameters(&mut self, params: TSNode<'tree>) {
        let mut cursor = params.walk();
        let params: Vec<TSNode<'tree>> = params.named_children(&mut cursor).collect();
        for param in params {
            let name = match param.kind() {
                "default_parameter" | "typed_default_parameter" => {
                    param.child_by_field_name("name")
                }
                _ => first_identifier(param),
            };
            if let Some(name) = name {
                let name = self.text(&name);
                self.tracker.bind_assignment(name, Origin::Unknown);
            }
        }
    }

    fn eval_call(&mut self, node: TSNode<'tree>) -> Origin {
        let Some(function) = node.child_by_field_name("function") else {
            self.eval_children(node);
            return Origin::Unknown;
        };
        let arguments = node.child_by_field_name("arguments");

        // receiver chain first, so inner calls are resolved before this one
        let callee = match function.kind() {
            "identifier" => self.decompose_name(function),
            "attribute" => {
                let base = match function.child_by_field_name("object") {
                    Some(object) => self.eval(object),
                    None => Origin::Unknown,
                };
                function
                    .child_by_field_name("attribute")
                    .map(|attr| (attr, self.text(&attr).to_string(), base))
            }
            _ => {
                self.eval(function);
                None
            }
        };

        if let Some(arguments) = arguments {
            self.eval(arguments);
        }

        let Some((member_node, member, base)) = callee else {
            return Origin::Unknown;
        };
        let site = CallSite {
            node,
            member_node,
            member,
            base,
            args: arguments.map(|a| arg_count(&a)).unwrap_or_default(),
        };
        self.emit(site)
    }

    /// A bare-name call. Imported names resolve through their qualified path;
    /// any other local binding (def, parameter, assigned value) is project
    /// code; unbound names go to the catalog by name, preferring a
    /// star-imported owner.
    fn decompose_name(&self, function: TSNode<'tree>) -> Option<(TSNode<'tree>, String, Origin)> {
        let name = self.text(&function);
        match self.tracker.lookup(name) {
            Origin::ImportedModule(path) => match path.rsplit_once('.') {
                Some((owner, imported)) => Some((
                    function,
                    imported.to_string(),
                    Origin::ImportedModule(owner.to_string()),
                )),
                None => None,
            },
            _ if self.tracker.is_bound(name) => None,
            _ => {
                let catalog = self.resolver.catalog();
                let star = self
                    .tracker
                    .star_modules()
                    .iter()
                    .find(|module| catalog.contains(name, module))
                    .map_or(Origin::Unknown, |module| Origin::ImportedModule(module.clone()));
                Some((function, name.to_string(), star))
            }
        }
    }

    fn emit(&mut self, site: CallSite<'tree>) -> Origin {
        match self.resolver.resolve(&site.member, &site.base, site.args) {
            Resolution::Resolved(entry) => {
                let redaction =
                    self.redactor
                        .redact_call(&site.node, &self.root, self.source, &self.lines);
                self.matches.push(Match {
                    function: entry.name.clone(),
                    module: entry.owner_module.clone(),
                    file: self.file.to_path_buf(),
                    line: site.line(),
                    column: site.column(),
                    context: redaction.context,
                    args: redaction.args,
                });
                entry
                    .returns
                    .as_ref()
                    .map_or(Origin::Unknown, |module| Origin::ResolvedCall(module.clone()))
            }
            Resolution::Ambiguous => {
                debug!(
                    file = %self.file.display(),
                    line = site.line(),
                    member = %site.member,
                    "ambiguous call site skipped"
                );
                self.ambiguous += 1;
                Origin::Unknown
            }
            Resolution::Untracked => Origin::Unknown,
        }
    }
}

/// Positional and keyword arguments; star arguments make the count open.
pub fn arg_count(arguments: &TSNode) -> ArgCount {
    if arguments.kind() == "generator_expression" {
        return ArgCount::exact(1);
    }
    let mut count = ArgCount::default();
    let mut cursor = arguments.walk();
    for arg in arguments.named_children(&mut cursor) {
        match arg.kind() {
            "comment" => {}
            "list_splat" | "dictionary_splat" => count.open = true,
            _ => count.known += 1,
        }
    }
    count
}

fn first_identifier<'tree>(node: TSNode<'tree>) -> Option<TSNode<'tree>> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<TSNode<'tree>> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(first_identifier)
}
