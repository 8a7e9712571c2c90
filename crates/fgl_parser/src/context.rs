//! Parse context threaded through nested block productions.
//!
//! A `ParseContext` is never mutated in place. Each block derives a new
//! context for its body with the `with_*` builders, so whatever a block adds
//! (end keywords, exit targets, binders) disappears again when its body is
//! done, on every exit path.

use crate::registry::StatementProduction;
use fgl_ast::{
    ConstantDef, CursorDef, FunctionSignature, ScopeSummary, TokenKind, TypeDef, VariableDef,
};
use fgl_core::text::TextSpan;
use rustc_hash::FxHashSet;
use std::cell::{Cell, RefCell};

/// Receives cursor and prepared-statement names declared by nested
/// `PREPARE` and `DECLARE` statements. Binders are tried innermost first;
/// the first one to return true owns the name.
pub trait PrepareBinder {
    fn bind_cursor(&self, cursor: CursorDef) -> bool;
}

/// Receives the arity of every `RETURN` inside a function body.
pub trait ReturnBinder {
    fn bind_return(&self, arity: usize);
}

/// Receives declarations from `DEFINE`, `CONSTANT` and `TYPE`. Each method
/// returns false when the name is already declared in the scope.
pub trait VariableAdder {
    fn add_variable(&self, variable: VariableDef) -> bool;
    fn add_constant(&self, constant: ConstantDef) -> bool;
    fn add_type(&self, type_def: TypeDef) -> bool;
}

/// Declarations collected for one scope (module, globals, MAIN or function).
#[derive(Debug, Default)]
pub struct DeclarationScope {
    variables: RefCell<Vec<VariableDef>>,
    constants: RefCell<Vec<ConstantDef>>,
    types: RefCell<Vec<TypeDef>>,
    cursors: RefCell<Vec<CursorDef>>,
    /// Lowercased names of variables, constants and types.
    names: RefCell<FxHashSet<String>>,
    return_arities: RefCell<Vec<usize>>,
}

impl DeclarationScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&self, name: &str) -> bool {
        self.names.borrow_mut().insert(name.to_ascii_lowercase())
    }

    pub fn return_arities(&self) -> Vec<usize> {
        self.return_arities.borrow().clone()
    }

    pub fn into_summary(self) -> ScopeSummary {
        ScopeSummary {
            variables: self.variables.into_inner(),
            constants: self.constants.into_inner(),
            types: self.types.into_inner(),
            cursors: self.cursors.into_inner(),
        }
    }
}

impl PrepareBinder for DeclarationScope {
    fn bind_cursor(&self, cursor: CursorDef) -> bool {
        let mut cursors = self.cursors.borrow_mut();
        // Re-preparing a statement under the same name replaces it.
        match cursors
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&cursor.name))
        {
            Some(existing) => *existing = cursor,
            None => cursors.push(cursor),
        }
        true
    }
}

/// Pushed by FOREACH around its body. Claims declarations that reuse the
/// name of the cursor being iterated and declines all others, which then
/// reach the enclosing routine or module.
#[derive(Debug)]
pub struct LoopCursorBinder {
    cursor: String,
    redeclarations: RefCell<Vec<CursorDef>>,
}

impl LoopCursorBinder {
    pub fn new(cursor: impl Into<String>) -> Self {
        Self {
            cursor: cursor.into(),
            redeclarations: RefCell::new(Vec::new()),
        }
    }

    pub fn into_redeclarations(self) -> Vec<CursorDef> {
        self.redeclarations.into_inner()
    }
}

impl PrepareBinder for LoopCursorBinder {
    fn bind_cursor(&self, cursor: CursorDef) -> bool {
        if !cursor.name.eq_ignore_ascii_case(&self.cursor) {
            return false;
        }
        self.redeclarations.borrow_mut().push(cursor);
        true
    }
}

impl ReturnBinder for DeclarationScope {
    fn bind_return(&self, arity: usize) {
        self.return_arities.borrow_mut().push(arity);
    }
}

impl VariableAdder for DeclarationScope {
    fn add_variable(&self, variable: VariableDef) -> bool {
        let added = self.claim_name(&variable.name);
        if added {
            self.variables.borrow_mut().push(variable);
        }
        added
    }

    fn add_constant(&self, constant: ConstantDef) -> bool {
        let added = self.claim_name(&constant.name);
        if added {
            self.constants.borrow_mut().push(constant);
        }
        added
    }

    fn add_type(&self, type_def: TypeDef) -> bool {
        let added = self.claim_name(&type_def.name);
        if added {
            self.types.borrow_mut().push(type_def);
        }
        added
    }
}

/// State collected while parsing a whole module.
#[derive(Debug, Default)]
pub struct ModuleScope {
    pub scope: DeclarationScope,
    pub globals: DeclarationScope,
    functions: RefCell<Vec<FunctionSignature>>,
    imports: RefCell<Vec<String>>,
    main_span: Cell<Option<TextSpan>>,
}

impl ModuleScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&self, signature: FunctionSignature) {
        self.functions.borrow_mut().push(signature);
    }

    pub fn add_import(&self, path: String) {
        self.imports.borrow_mut().push(path);
    }

    /// Record the MAIN block. Returns false if the module already has one.
    pub fn set_main(&self, span: TextSpan) -> bool {
        if self.main_span.get().is_some() {
            return false;
        }
        self.main_span.set(Some(span));
        true
    }

    pub fn into_parts(self) -> (ScopeSummary, ScopeSummary, Vec<FunctionSignature>, Vec<String>) {
        (
            self.scope.into_summary(),
            self.globals.into_summary(),
            self.functions.into_inner(),
            self.imports.into_inner(),
        )
    }
}

/// Keywords that end a function or MAIN body when its terminator is missing.
const ROUTINE_STOP_TOKENS: &[TokenKind] = &[
    TokenKind::FunctionKeyword,
    TokenKind::MainKeyword,
    TokenKind::PublicKeyword,
    TokenKind::PrivateKeyword,
    TokenKind::GlobalsKeyword,
];

#[derive(Clone)]
pub struct ParseContext<'c> {
    pub containing_module: &'c ModuleScope,
    /// Innermost binder last.
    pub prepare_binders: Vec<&'c dyn PrepareBinder>,
    pub return_binder: Option<&'c dyn ReturnBinder>,
    pub variable_adder: Option<&'c dyn VariableAdder>,
    /// Block keywords that `EXIT`/`CONTINUE` may target here.
    pub valid_exit_keywords: FxHashSet<TokenKind>,
    /// Keywords `k` such that `END k` closes an enclosing block.
    pub end_keywords: FxHashSet<TokenKind>,
    /// Tokens that end the current body without being consumed
    /// (`ELSE`, `WHEN`, menu clause keywords, ...).
    pub stop_tokens: FxHashSet<TokenKind>,
    /// Extra statements contributed by the enclosing block.
    pub context_statements: Vec<&'static StatementProduction>,
}

impl<'c> ParseContext<'c> {
    /// The context for module-level declarations.
    pub fn root(module: &'c ModuleScope) -> Self {
        Self {
            containing_module: module,
            prepare_binders: vec![&module.scope as &dyn PrepareBinder],
            return_binder: None,
            variable_adder: Some(&module.scope as &dyn VariableAdder),
            valid_exit_keywords: FxHashSet::default(),
            end_keywords: FxHashSet::default(),
            stop_tokens: FxHashSet::default(),
            context_statements: Vec::new(),
        }
    }

    pub fn with_end_keyword(&self, keyword: TokenKind) -> Self {
        let mut ctx = self.clone();
        ctx.end_keywords.insert(keyword);
        ctx
    }

    pub fn with_valid_exit(&self, keyword: TokenKind) -> Self {
        let mut ctx = self.clone();
        ctx.valid_exit_keywords.insert(keyword);
        ctx
    }

    pub fn with_stop_tokens(&self, tokens: &[TokenKind]) -> Self {
        let mut ctx = self.clone();
        ctx.stop_tokens.extend(tokens.iter().copied());
        ctx
    }

    pub fn with_context_statements(&self, productions: &'static [StatementProduction]) -> Self {
        let mut ctx = self.clone();
        ctx.context_statements.extend(productions.iter());
        ctx
    }

    pub fn with_prepare_binder<'s>(&self, binder: &'s dyn PrepareBinder) -> ParseContext<'s>
    where
        'c: 's,
    {
        let mut ctx: ParseContext<'s> = self.clone();
        ctx.prepare_binders.push(binder);
        ctx
    }

    pub fn with_return_binder<'s>(&self, binder: &'s dyn ReturnBinder) -> ParseContext<'s>
    where
        'c: 's,
    {
        let mut ctx: ParseContext<'s> = self.clone();
        ctx.return_binder = Some(binder);
        ctx
    }

    pub fn with_variable_adder<'s>(&self, adder: &'s dyn VariableAdder) -> ParseContext<'s>
    where
        'c: 's,
    {
        let mut ctx: ParseContext<'s> = self.clone();
        ctx.variable_adder = Some(adder);
        ctx
    }

    /// The context for a function or MAIN body: a fresh exit set, the
    /// routine's own scope for declarations and cursors, and returns bound
    /// to the scope only when `binds_returns` is set.
    pub fn for_routine<'s>(
        &self,
        scope: &'s DeclarationScope,
        end_keyword: TokenKind,
        binds_returns: bool,
    ) -> ParseContext<'s>
    where
        'c: 's,
    {
        let mut ctx: ParseContext<'s> = self.clone();
        ctx.valid_exit_keywords.clear();
        ctx.context_statements.clear();
        ctx.stop_tokens = ROUTINE_STOP_TOKENS.iter().copied().collect();
        ctx.end_keywords.insert(end_keyword);
        ctx.prepare_binders.push(scope);
        ctx.variable_adder = Some(scope as &dyn VariableAdder);
        ctx.return_binder = if binds_returns {
            Some(scope as &dyn ReturnBinder)
        } else {
            None
        };
        ctx
    }

    /// Offer a cursor to the binders, innermost first.
    pub fn bind_cursor(&self, cursor: CursorDef) -> bool {
        self.prepare_binders
            .iter()
            .rev()
            .any(|binder| binder.bind_cursor(cursor.clone()))
    }

    pub fn is_end_keyword(&self, kind: TokenKind) -> bool {
        self.end_keywords.contains(&kind)
    }

    pub fn is_stop_token(&self, kind: TokenKind) -> bool {
        self.stop_tokens.contains(&kind)
    }
}
