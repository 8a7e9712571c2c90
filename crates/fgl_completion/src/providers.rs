//! Candidate providers.
//!
//! Rules name providers by id (`"variables"`, `"functions"`, ...). The
//! registry maps each id to a closure registered up front, so resolving a
//! rule never looks anything up by reflection.

use crate::{CompletionItem, CompletionItemKind, CompletionSet};
use fgl_ast::{AstNode, NodeKind, ScopeSummary};
use fgl_core::text::TextPos;
use rustc_hash::FxHashMap;

bitflags::bitflags! {
    /// Kinds of named members a completion request asks for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberKinds: u8 {
        const VARIABLES = 1 << 0;
        const FUNCTIONS = 1 << 1;
        const CONSTANTS = 1 << 2;
        const TYPES     = 1 << 3;
        const CURSORS   = 1 << 4;
        /// Gates the keyword and punctuation candidates of a rule.
        const KEYWORDS  = 1 << 5;
    }
}

impl Default for MemberKinds {
    fn default() -> Self {
        MemberKinds::all()
    }
}

impl MemberKinds {
    const NAMES: &'static [(&'static str, MemberKinds)] = &[
        ("variables", MemberKinds::VARIABLES),
        ("functions", MemberKinds::FUNCTIONS),
        ("constants", MemberKinds::CONSTANTS),
        ("types", MemberKinds::TYPES),
        ("cursors", MemberKinds::CURSORS),
        ("keywords", MemberKinds::KEYWORDS),
    ];

    /// Look up a single kind by its lowercase name.
    pub fn from_kind_name(name: &str) -> Option<MemberKinds> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, kinds)| kinds)
    }

    /// Combine a list of names. Returns the first unknown name on failure.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<MemberKinds, &'a str> {
        names.into_iter().try_fold(MemberKinds::empty(), |acc, name| {
            MemberKinds::from_kind_name(name).map(|kind| acc | kind).ok_or(name)
        })
    }

    /// Names of the kinds set in `self`.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(_, kind)| self.contains(*kind))
            .map(|&(name, _)| name)
            .collect()
    }
}

/// What a provider can see: the parsed module (when there is one) and the
/// cursor offset.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    pub module: Option<&'a AstNode>,
    pub position: TextPos,
}

impl<'a> ProviderContext<'a> {
    pub fn new(module: Option<&'a AstNode>, position: TextPos) -> Self {
        Self { module, position }
    }

    /// The MAIN or function block around the cursor. An unterminated block
    /// also owns everything after it up to the next routine.
    pub fn enclosing_routine(&self) -> Option<&'a AstNode> {
        let module = self.module?;
        module
            .children()
            .filter(|child| matches!(child.kind, NodeKind::Main(_) | NodeKind::Function(_)))
            .filter(|child| child.start_index() <= self.position)
            .last()
            .filter(|routine| self.position <= routine.end_index() || !routine.is_complete())
    }

    /// Scopes visible at the cursor, innermost first: the enclosing routine,
    /// then the module, then the globals.
    pub fn scopes(&self) -> Vec<&'a ScopeSummary> {
        let mut scopes = Vec::new();
        match self.enclosing_routine().map(|routine| &routine.kind) {
            Some(NodeKind::Main(main)) => scopes.push(&main.scope),
            Some(NodeKind::Function(function)) => scopes.push(&function.scope),
            _ => {}
        }
        if let Some(NodeKind::Module(module)) = self.module.map(|m| &m.kind) {
            scopes.push(&module.scope);
            scopes.push(&module.globals);
        }
        scopes
    }
}

pub type ProviderFn = Box<dyn Fn(&ProviderContext<'_>, &mut CompletionSet) + Send + Sync>;

struct RegisteredProvider {
    kinds: MemberKinds,
    provide: ProviderFn,
}

/// Provider ids mapped to their closures.
pub struct ProviderRegistry {
    providers: FxHashMap<String, RegisteredProvider>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            providers: FxHashMap::default(),
        }
    }

    /// A registry with the built-in scope providers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("variables", MemberKinds::VARIABLES, Box::new(provide_variables));
        registry.register("functions", MemberKinds::FUNCTIONS, Box::new(provide_functions));
        registry.register("constants", MemberKinds::CONSTANTS, Box::new(provide_constants));
        registry.register("types", MemberKinds::TYPES, Box::new(provide_types));
        registry.register("cursors", MemberKinds::CURSORS, Box::new(provide_cursors));
        registry
    }

    /// Register (or replace) a provider contributing members of `kinds`.
    pub fn register(&mut self, id: &str, kinds: MemberKinds, provide: ProviderFn) {
        self.providers
            .insert(id.to_string(), RegisteredProvider { kinds, provide });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// The kinds a provider contributes, if it is registered.
    pub fn kinds(&self, id: &str) -> Option<MemberKinds> {
        self.providers.get(id).map(|p| p.kinds)
    }

    /// Run a provider. Returns false if `id` is not registered.
    pub fn provide(&self, id: &str, ctx: &ProviderContext<'_>, out: &mut CompletionSet) -> bool {
        match self.providers.get(id) {
            Some(provider) => {
                (provider.provide)(ctx, out);
                true
            }
            None => false,
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ============================================================================
// Built-in providers
// ============================================================================

fn provide_variables(ctx: &ProviderContext<'_>, out: &mut CompletionSet) {
    if let Some(NodeKind::Function(function)) = ctx.enclosing_routine().map(|r| &r.kind) {
        for parameter in &function.parameters {
            out.insert(CompletionItem::new(parameter, CompletionItemKind::Variable).with_detail("parameter"));
        }
    }
    for scope in ctx.scopes() {
        for variable in &scope.variables {
            out.insert(
                CompletionItem::new(&variable.name, CompletionItemKind::Variable)
                    .with_detail(variable.type_ref.to_string()),
            );
        }
    }
}

fn provide_functions(ctx: &ProviderContext<'_>, out: &mut CompletionSet) {
    let Some(NodeKind::Module(module)) = ctx.module.map(|m| &m.kind) else {
        return;
    };
    for function in &module.functions {
        let detail = format!("function {}({})", function.name, function.parameters.join(", "));
        out.insert(CompletionItem::new(&function.name, CompletionItemKind::Function).with_detail(detail));
    }
}

fn provide_constants(ctx: &ProviderContext<'_>, out: &mut CompletionSet) {
    for scope in ctx.scopes() {
        for constant in &scope.constants {
            let mut item = CompletionItem::new(&constant.name, CompletionItemKind::Constant);
            if let Some(value) = &constant.value {
                item = item.with_detail(value.to_string());
            }
            out.insert(item);
        }
    }
}

fn provide_types(ctx: &ProviderContext<'_>, out: &mut CompletionSet) {
    for scope in ctx.scopes() {
        for type_def in &scope.types {
            out.insert(
                CompletionItem::new(&type_def.name, CompletionItemKind::Type)
                    .with_detail(type_def.type_ref.to_string()),
            );
        }
    }
}

fn provide_cursors(ctx: &ProviderContext<'_>, out: &mut CompletionSet) {
    for scope in ctx.scopes() {
        for cursor in &scope.cursors {
            let detail = match cursor.kind {
                fgl_ast::CursorKind::Prepared => "prepared statement",
                fgl_ast::CursorKind::Declared => "cursor",
            };
            out.insert(CompletionItem::new(&cursor.name, CompletionItemKind::Cursor).with_detail(detail));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgl_parser::{parse_module, ParseOptions};

    const SOURCE: &str = "DEFINE m_total INTEGER\nCONSTANT c_max = 10\nFUNCTION f(p)\n  DEFINE l_name STRING\n  \nEND FUNCTION\nMAIN\n  DEFINE i INTEGER\n  DECLARE c1 CURSOR FROM \"select 1\"\nEND MAIN\n";

    fn labels(set: &CompletionSet) -> Vec<&str> {
        set.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn test_member_kind_names() {
        let kinds = MemberKinds::from_names(["variables", "Cursors"]).unwrap();
        assert_eq!(kinds, MemberKinds::VARIABLES | MemberKinds::CURSORS);
        assert_eq!(kinds.names(), vec!["variables", "cursors"]);
        assert_eq!(MemberKinds::from_names(["variables", "widgets"]), Err("widgets"));
    }

    #[test]
    fn test_variables_follow_enclosing_routine() {
        let result = parse_module(SOURCE, &ParseOptions::default());
        let registry = ProviderRegistry::with_builtins();

        let in_function = SOURCE.find("  \nEND FUNCTION").unwrap() as TextPos + 2;
        let ctx = ProviderContext::new(Some(&result.module), in_function);
        let mut set = CompletionSet::new();
        assert!(registry.provide("variables", &ctx, &mut set));
        assert_eq!(labels(&set), vec!["p", "l_name", "m_total"]);

        let in_main = SOURCE.find("DECLARE").unwrap() as TextPos;
        let ctx = ProviderContext::new(Some(&result.module), in_main);
        let mut set = CompletionSet::new();
        registry.provide("variables", &ctx, &mut set);
        registry.provide("cursors", &ctx, &mut set);
        registry.provide("constants", &ctx, &mut set);
        assert_eq!(labels(&set), vec!["i", "m_total", "c1", "c_max"]);
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::with_builtins();
        let ctx = ProviderContext::new(None, 0);
        let mut set = CompletionSet::new();
        assert!(!registry.provide("widgets", &ctx, &mut set));
        assert!(registry.provide("functions", &ctx, &mut set));
        assert!(set.is_empty());
    }
}
