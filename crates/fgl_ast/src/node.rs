//! AST node definitions for 4GL modules.
//!
//! Every statement, block and clause is an [`AstNode`]. A node records three
//! offsets: where it starts, where its header ends (the "decorator" end, e.g.
//! after `FOR i = 1 TO 10`), and where it ends. Child nodes are kept in a
//! map ordered by their start offset, so iteration is always in source order.

use crate::expression::{Expression, NameExpression};
use crate::token_kind::TokenKind;
use crate::types::AccessModifier;
use fgl_core::text::{TextPos, TextSpan};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Offsets and completeness shared by all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Offset of the first character of the node.
    pub start_index: TextPos,
    /// Offset just past the last consumed token of the node.
    pub end_index: TextPos,
    /// Offset where the node's header ends and its body begins.
    pub decorator_end: TextPos,
    /// False when the parser had to recover while building this node.
    pub is_complete: bool,
}

impl NodeData {
    pub fn new(start: TextPos) -> Self {
        Self {
            start_index: start,
            end_index: start,
            decorator_end: start,
            is_complete: false,
        }
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.start_index, self.end_index)
    }
}

/// Child nodes keyed by their start offset.
pub type NodeChildren = BTreeMap<TextPos, AstNode>;

/// A syntax tree node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstNode {
    #[serde(flatten)]
    pub data: NodeData,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(serialize_with = "serialize_children", skip_serializing_if = "BTreeMap::is_empty")]
    pub children: NodeChildren,
}

fn serialize_children<S: Serializer>(children: &NodeChildren, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(children.values())
}

impl AstNode {
    /// Create a node starting at `start`. All three offsets begin at `start`;
    /// the producing parser advances them as it consumes tokens.
    pub fn new(kind: NodeKind, start: TextPos) -> Self {
        Self {
            data: NodeData::new(start),
            kind,
            children: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn start_index(&self) -> TextPos {
        self.data.start_index
    }

    #[inline]
    pub fn end_index(&self) -> TextPos {
        self.data.end_index
    }

    #[inline]
    pub fn decorator_end(&self) -> TextPos {
        self.data.decorator_end
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.data.is_complete
    }

    pub fn span(&self) -> TextSpan {
        self.data.span()
    }

    /// Insert a child keyed by its start offset.
    pub fn add_child(&mut self, child: AstNode) {
        self.children.insert(child.start_index(), child);
    }

    /// Children in source order.
    pub fn children(&self) -> impl Iterator<Item = &AstNode> {
        self.children.values()
    }

    /// Short lowercase name of this node's kind.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The deepest node whose extent contains `pos`.
    pub fn node_at(&self, pos: TextPos) -> Option<&AstNode> {
        if pos < self.start_index() || pos > self.end_index() {
            return None;
        }
        // The only candidate child is the last one starting at or before pos.
        let child = self
            .children
            .range(..=pos)
            .next_back()
            .and_then(|(_, child)| child.node_at(pos));
        Some(child.unwrap_or(self))
    }
}

// ============================================================================
// Node Kinds
// ============================================================================

/// The kind of a node together with its kind-specific payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    // Module level
    Module(ModuleNode),
    Import(ImportStatement),
    Database(DatabaseStatement),
    GlobalsInclude(GlobalsInclude),
    Globals(GlobalsBlock),
    Main(MainBlock),
    Function(FunctionBlock),

    // Declarations
    Define(DefineStatement),
    Constant(ConstantStatement),
    TypeDef(TypeStatement),

    // Simple statements
    Let(LetStatement),
    Call(CallStatement),
    Return(ReturnStatement),
    Output(OutputStatement),
    Sleep(SleepStatement),
    Initialize(InitializeStatement),
    Exit(ExitStatement),
    Continue(ContinueStatement),
    Prepare(PrepareStatement),
    Declare(DeclareStatement),
    Cursor(CursorStatement),
    Whenever(WheneverStatement),
    Run(RunStatement),

    // Blocks
    If(IfStatement),
    Else,
    While(WhileStatement),
    For(ForStatement),
    Foreach(ForeachStatement),
    Case(CaseStatement),
    When(WhenClause),
    Otherwise,
    Try,
    Catch,
    Menu(MenuStatement),
    MenuOption(MenuOption),
    MenuOptionControl(MenuOptionControl),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module(_) => "module",
            NodeKind::Import(_) => "import",
            NodeKind::Database(n) => n.keyword.text(),
            NodeKind::GlobalsInclude(_) | NodeKind::Globals(_) => "globals",
            NodeKind::Main(_) => "main",
            NodeKind::Function(_) => "function",
            NodeKind::Define(_) => "define",
            NodeKind::Constant(_) => "constant",
            NodeKind::TypeDef(_) => "type",
            NodeKind::Let(_) => "let",
            NodeKind::Call(_) => "call",
            NodeKind::Return(_) => "return",
            NodeKind::Output(n) => n.keyword.text(),
            NodeKind::Sleep(_) => "sleep",
            NodeKind::Initialize(_) => "initialize",
            NodeKind::Exit(_) => "exit",
            NodeKind::Continue(_) => "continue",
            NodeKind::Prepare(_) => "prepare",
            NodeKind::Declare(_) => "declare",
            NodeKind::Cursor(n) => n.operation.text(),
            NodeKind::Whenever(_) => "whenever",
            NodeKind::Run(_) => "run",
            NodeKind::If(_) => "if",
            NodeKind::Else => "else",
            NodeKind::While(_) => "while",
            NodeKind::For(_) => "for",
            NodeKind::Foreach(_) => "foreach",
            NodeKind::Case(_) => "case",
            NodeKind::When(_) => "when",
            NodeKind::Otherwise => "otherwise",
            NodeKind::Try => "try",
            NodeKind::Catch => "catch",
            NodeKind::Menu(_) => "menu",
            NodeKind::MenuOption(_) => "option",
            NodeKind::MenuOptionControl(n) => n.action.text(),
        }
    }

    /// Expressions held directly by this node, in source order.
    pub fn expressions(&self) -> Vec<&Expression> {
        fn opt(e: &Option<Expression>) -> impl Iterator<Item = &Expression> {
            e.iter()
        }
        match self {
            NodeKind::Constant(n) => n.constants.iter().filter_map(|c| c.value.as_ref()).collect(),
            NodeKind::Let(n) => n.values.iter().collect(),
            NodeKind::Call(n) => opt(&n.call).collect(),
            NodeKind::Return(n) => n.values.iter().collect(),
            NodeKind::Output(n) => n.values.iter().collect(),
            NodeKind::Sleep(n) => opt(&n.seconds).collect(),
            NodeKind::Exit(n) => opt(&n.value).collect(),
            NodeKind::Prepare(n) => opt(&n.source).collect(),
            NodeKind::Declare(n) => opt(&n.source).collect(),
            NodeKind::Cursor(n) => n.using.iter().collect(),
            NodeKind::Run(n) => opt(&n.command).collect(),
            NodeKind::If(n) => opt(&n.condition).collect(),
            NodeKind::While(n) => opt(&n.condition).collect(),
            NodeKind::For(n) => opt(&n.start_value)
                .chain(opt(&n.end_value))
                .chain(opt(&n.step_value))
                .collect(),
            NodeKind::Foreach(n) => n.using.iter().collect(),
            NodeKind::Case(n) => opt(&n.subject).collect(),
            NodeKind::When(n) => n.conditions.iter().collect(),
            NodeKind::Menu(n) => opt(&n.title).collect(),
            NodeKind::MenuOption(n) => match &n.clause {
                MenuClause::Command { name, help, .. } => opt(name).chain(opt(help)).collect(),
                MenuClause::Idle { seconds } => opt(seconds).collect(),
                MenuClause::BeforeMenu | MenuClause::Action { .. } => Vec::new(),
            },
            NodeKind::MenuOptionControl(n) => n.options.iter().collect(),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A type as written in a DEFINE, TYPE or CONSTANT declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeReference {
    /// A built-in or user type name, with optional size arguments:
    /// `INTEGER`, `CHAR(10)`, `DECIMAL(10,2)`, `DATETIME YEAR TO SECOND`.
    Named { name: String, arguments: Vec<String> },
    /// `LIKE table.column`
    Like { table: String, column: String },
    /// `RECORD ... END RECORD`
    Record { fields: Vec<VariableDef> },
    /// `RECORD LIKE table.*`
    RecordLike { table: String },
    /// `ARRAY[n] OF t` or `DYNAMIC ARRAY [WITH DIMENSION n] OF t`
    Array {
        dynamic: bool,
        dimensions: Vec<String>,
        element: Box<TypeReference>,
    },
    /// A type that could not be parsed.
    Missing,
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Named { name, arguments } => {
                write!(f, "{}", name)?;
                if !arguments.is_empty() {
                    write!(f, "({})", arguments.join(","))?;
                }
                Ok(())
            }
            TypeReference::Like { table, column } => write!(f, "like {}.{}", table, column),
            TypeReference::Record { fields } => {
                write!(f, "record ")?;
                for field in fields {
                    write!(f, "{} {}, ", field.name, field.type_ref)?;
                }
                write!(f, "end record")
            }
            TypeReference::RecordLike { table } => write!(f, "record like {}.*", table),
            TypeReference::Array {
                dynamic,
                dimensions,
                element,
            } => {
                if *dynamic {
                    write!(f, "dynamic array")?;
                    if let Some(dims) = dimensions.first() {
                        write!(f, " with dimension {}", dims)?;
                    }
                } else {
                    write!(f, "array[{}]", dimensions.join(","))?;
                }
                write!(f, " of {}", element)
            }
            TypeReference::Missing => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDef {
    pub name: String,
    pub span: TextSpan,
    pub type_ref: TypeReference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantDef {
    pub name: String,
    pub span: TextSpan,
    pub type_ref: Option<TypeReference>,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub name: String,
    pub span: TextSpan,
    pub type_ref: TypeReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorKind {
    Prepared,
    Declared,
}

/// A prepared statement or declared cursor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorDef {
    pub name: String,
    pub span: TextSpan,
    pub kind: CursorKind,
}

/// Names declared in one scope (module, globals, function or main).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeSummary {
    pub variables: Vec<VariableDef>,
    pub constants: Vec<ConstantDef>,
    pub types: Vec<TypeDef>,
    pub cursors: Vec<CursorDef>,
}

impl ScopeSummary {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.constants.is_empty()
            && self.types.is_empty()
            && self.cursors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    pub name: String,
    pub span: TextSpan,
    pub access: AccessModifier,
    pub parameters: Vec<String>,
}

// ============================================================================
// Module-level nodes
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleNode {
    pub scope: ScopeSummary,
    pub globals: ScopeSummary,
    pub functions: Vec<FunctionSignature>,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Fgl,
    Java,
    /// A C extension module (`IMPORT name` with no qualifier).
    Extension,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    pub import_kind: ImportKind,
    pub path: String,
}

/// `SCHEMA name` or `DATABASE name`.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatement {
    pub keyword: TokenKind,
    pub name: String,
}

/// `GLOBALS "file.4gl"`
#[derive(Debug, Clone, Serialize)]
pub struct GlobalsInclude {
    pub file: String,
}

/// `GLOBALS ... END GLOBALS`
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalsBlock {
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MainBlock {
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionBlock {
    pub access: AccessModifier,
    pub name: String,
    pub name_span: TextSpan,
    pub parameters: Vec<String>,
    pub scope: ScopeSummary,
    /// Arity of every RETURN statement found in the body.
    pub return_arities: Vec<usize>,
}

// ============================================================================
// Declarations as statements
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct DefineStatement {
    pub access: AccessModifier,
    pub variables: Vec<VariableDef>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConstantStatement {
    pub access: AccessModifier,
    pub constants: Vec<ConstantDef>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeStatement {
    pub access: AccessModifier,
    pub types: Vec<TypeDef>,
}

// ============================================================================
// Simple statements
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LetStatement {
    pub target: Option<NameExpression>,
    pub values: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallStatement {
    pub call: Option<Expression>,
    pub returning: Vec<NameExpression>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReturnStatement {
    pub values: Vec<Expression>,
}

/// DISPLAY, MESSAGE or ERROR.
#[derive(Debug, Clone, Serialize)]
pub struct OutputStatement {
    pub keyword: TokenKind,
    pub values: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SleepStatement {
    pub seconds: Option<Expression>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InitializeStatement {
    pub targets: Vec<NameExpression>,
}

/// `EXIT <block>` or `EXIT PROGRAM [code]`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitStatement {
    pub exit_type: Option<TokenKind>,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueStatement {
    pub continue_type: Option<TokenKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareStatement {
    pub name: Option<String>,
    pub source: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclareStatement {
    pub name: Option<String>,
    pub scroll: bool,
    pub with_hold: bool,
    /// `FOR prepared_name`
    pub prepared: Option<String>,
    /// `FROM expression`
    pub source: Option<Expression>,
}

/// OPEN, CLOSE, FREE, FETCH or EXECUTE on a named cursor or statement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorStatement {
    pub operation: TokenKind,
    pub name: Option<String>,
    pub fetch_direction: Option<TokenKind>,
    pub using: Vec<Expression>,
    pub into: Vec<NameExpression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WheneverStatement {
    /// `error`, `any error`, `sqlerror`, `warning` or `not found`.
    pub condition: String,
    /// `continue`, `stop`, `raise`, `call name` or `goto name`.
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatement {
    pub command: Option<Expression>,
    pub returning: Option<NameExpression>,
    pub without_waiting: bool,
}

// ============================================================================
// Blocks
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct IfStatement {
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStatement {
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForStatement {
    pub counter_variable: Option<NameExpression>,
    pub start_value: Option<Expression>,
    pub end_value: Option<Expression>,
    pub step_value: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeachStatement {
    pub cursor: Option<String>,
    pub using: Vec<Expression>,
    pub into: Vec<NameExpression>,
    pub reoptimization: bool,
    /// PREPARE or DECLARE statements in the body that reuse the iterated
    /// cursor's name.
    pub redeclarations: Vec<CursorDef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseStatement {
    pub subject: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhenClause {
    pub conditions: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuStatement {
    pub title: Option<Expression>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "clause", rename_all = "camelCase")]
pub enum MenuClause {
    BeforeMenu,
    Command {
        key: Vec<String>,
        name: Option<Expression>,
        help: Option<Expression>,
    },
    Action {
        name: String,
    },
    Idle {
        seconds: Option<Expression>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuOption {
    pub clause: MenuClause,
}

/// `NEXT OPTION`, `SHOW OPTION` or `HIDE OPTION` inside a menu.
#[derive(Debug, Clone, Serialize)]
pub struct MenuOptionControl {
    pub action: TokenKind,
    pub options: Vec<Expression>,
    pub all: bool,
}
