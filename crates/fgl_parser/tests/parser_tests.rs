//! Parser integration tests.
//!
//! Verifies node extents, block recovery, version gating and the scope
//! information the parser collects for whole modules and statement runs.

use fgl_ast::visitor::{walk_node, AstVisitor};
use fgl_ast::{AstNode, CursorKind, NodeKind, TokenKind};
use fgl_core::text::TextSpan;
use fgl_core::version::LanguageVersion;
use fgl_parser::{parse_module, parse_statements, ParseOptions, ParseResult, SnippetResult, TokenQueue};
use fgl_scanner::ScanMode;
use proptest::prelude::*;

/// Helper: parse a module with default options.
fn module(source: &str) -> ParseResult {
    parse_module(source, &ParseOptions::default())
}

/// Helper: parse a run of statements with default options.
fn snippet(source: &str) -> SnippetResult {
    parse_statements(source, &ParseOptions::default())
}

fn codes(diagnostics: &fgl_diagnostics::DiagnosticCollection) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn messages(diagnostics: &fgl_diagnostics::DiagnosticCollection) -> Vec<String> {
    diagnostics.iter().map(|d| d.message_text.clone()).collect()
}

/// Find the first node (depth first) with the given kind name.
fn find<'a>(node: &'a AstNode, name: &str) -> Option<&'a AstNode> {
    if node.name() == name {
        return Some(node);
    }
    node.children().find_map(|child| find(child, name))
}

/// Checks that every child lies within its parent and that every node's
/// decorator end lies within its own extent.
struct ExtentChecker {
    stack: Vec<(u32, u32)>,
    checked: usize,
}

impl AstVisitor for ExtentChecker {
    fn visit_node(&mut self, node: &AstNode) {
        let (start, end) = (node.start_index(), node.end_index());
        assert!(start <= node.decorator_end(), "{} decorator before start", node.name());
        assert!(node.decorator_end() <= end, "{} decorator after end", node.name());
        if let Some(&(parent_start, parent_end)) = self.stack.last() {
            assert!(parent_start <= start && end <= parent_end, "{} escapes its parent", node.name());
        }
        self.checked += 1;
        self.stack.push((start, end));
        walk_node(self, node);
        self.stack.pop();
    }
}

fn check_extents(node: &AstNode) -> usize {
    let mut checker = ExtentChecker {
        stack: Vec::new(),
        checked: 0,
    };
    checker.visit_node(node);
    checker.checked
}

// ============================================================================
// Block recovery
// ============================================================================

#[test]
fn test_unterminated_for_reports_once() {
    let result = snippet("FOR x = 1 TO 10");
    assert_eq!(result.diagnostics.error_count(), 1);
    let message = &messages(&result.diagnostics)[0];
    assert!(message.contains("end for"), "{}", message);

    let node = &result.statements[0];
    assert_eq!(node.name(), "for");
    assert_eq!(node.end_index(), 15);
    assert!(!node.is_complete());
}

#[test]
fn test_well_formed_for() {
    let result = snippet("FOR i = 1 TO 10 STEP 2\n  DISPLAY i\nEND FOR");
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result.diagnostics));
    let node = &result.statements[0];
    let NodeKind::For(ref statement) = node.kind else {
        panic!("expected for statement");
    };
    assert_eq!(statement.counter_variable.as_ref().map(|n| n.name.as_str()), Some("i"));
    assert_eq!(statement.step_value.as_ref().map(|e| e.to_string()), Some("2".to_string()));
    assert_eq!(node.decorator_end(), 22);
    assert_eq!(node.end_index(), 42);
    assert!(node.is_complete());
    assert_eq!(node.children().count(), 1);
}

#[test]
fn test_missing_for_counter() {
    let result = snippet("FOR = 1 TO 3\nEND FOR");
    assert_eq!(codes(&result.diagnostics), vec![2008]);
}

#[test]
fn test_nested_block_leaves_ancestor_terminator() {
    let source = "FUNCTION f()\n  MENU \"x\"\n    ON ACTION a\n      FOR i = 1 TO 3\n  END MENU\nEND FUNCTION\n";
    let result = module(source);
    assert_eq!(result.diagnostics.error_count(), 1);
    assert!(messages(&result.diagnostics)[0].contains("end for"));

    let function = find(&result.module, "function").unwrap();
    assert_eq!(function.end_index() as usize, source.trim_end().len());
    let menu = find(function, "menu").unwrap();
    assert!(source[..menu.end_index() as usize].ends_with("END MENU"));
    assert!(!menu.is_complete());
    assert!(function.children().all(|child| child.end_index() <= function.end_index()));
}

#[test]
fn test_missing_end_if_inside_while() {
    let result = snippet("WHILE x\n  IF y THEN\n    LET a = 1\nEND WHILE");
    assert_eq!(result.diagnostics.error_count(), 1);
    assert!(messages(&result.diagnostics)[0].contains("end if"));
    let node = &result.statements[0];
    assert_eq!(node.name(), "while");
    assert_eq!(node.end_index(), 43);
}

#[test]
fn test_if_else_children() {
    let result = snippet("IF a > 1 THEN\n  LET b = 1\nELSE\n  LET b = 2\n  LET c = 3\nEND IF");
    assert!(result.diagnostics.is_empty());
    let node = &result.statements[0];
    let names: Vec<_> = node.children().map(|child| child.name()).collect();
    assert_eq!(names, vec!["let", "else"]);
    let else_node = find(node, "else").unwrap();
    assert_eq!(else_node.children().count(), 2);
}

#[test]
fn test_case_clauses() {
    let result = snippet("CASE x\n  WHEN 1, 2\n    LET y = 1\n  OTHERWISE\n    LET y = 0\n  OTHERWISE\nEND CASE");
    assert_eq!(codes(&result.diagnostics), vec![2013]);
    let node = &result.statements[0];
    let names: Vec<_> = node.children().map(|child| child.name()).collect();
    assert_eq!(names, vec!["when", "otherwise", "otherwise"]);
}

#[test]
fn test_try_catch() {
    let result = snippet("TRY\n  CALL f()\nCATCH\n  DISPLAY \"failed\"\nEND TRY");
    assert!(result.diagnostics.is_empty());
    let node = &result.statements[0];
    assert!(find(node, "catch").is_some());
    assert!(node.is_complete());
}

#[test]
fn test_scanner_recovery_marks_statement_incomplete() {
    let result = snippet("LET x = \"abc\nLET y = 1");
    assert_eq!(codes(&result.diagnostics), vec![1001]);
    let (first, second) = (&result.statements[0], &result.statements[1]);
    assert_eq!((first.start_index(), first.end_index()), (0, 12));
    assert!(!first.is_complete());
    assert!(second.is_complete());
}

#[test]
fn test_unterminated_comment_marks_module_incomplete() {
    let result = module("MAIN
END MAIN
{ trailing");
    assert_eq!(codes(&result.diagnostics), vec![1002]);
    assert!(find(&result.module, "main").unwrap().is_complete());
    assert!(!result.module.is_complete());
}

#[test]
fn test_menu_without_options_warns() {
    let result = snippet("MENU \"empty\"\nEND MENU");
    assert_eq!(result.diagnostics.error_count(), 0);
    assert_eq!(codes(&result.diagnostics), vec![2018]);
    assert!(result.statements[0].is_complete());
}

#[test]
fn test_menu_option_statements_only_inside_menu() {
    let result = snippet("MENU\n  COMMAND \"Go\"\n    NEXT OPTION \"Quit\"\n  COMMAND \"Quit\"\n    EXIT MENU\nEND MENU");
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result.diagnostics));

    let result = snippet("NEXT OPTION \"Quit\"");
    assert!(result.diagnostics.error_count() >= 1);
}

#[test]
fn test_stray_end_is_reported() {
    let source = "FUNCTION f()\n  END WHILE\nEND FUNCTION";
    let result = module(source);
    assert_eq!(codes(&result.diagnostics), vec![2007]);
    assert_eq!(messages(&result.diagnostics)[0], "Unexpected 'end while'.");
    let function = find(&result.module, "function").unwrap();
    assert_eq!(function.end_index() as usize, source.len());
}

#[test]
fn test_unexpected_tokens_reported_once_per_run() {
    let result = snippet("LET a = 1\n) ) )\nLET b = 2");
    assert_eq!(codes(&result.diagnostics), vec![2006]);
    assert_eq!(result.statements.len(), 2);
}

// ============================================================================
// EXIT / CONTINUE
// ============================================================================

#[test]
fn test_exit_targets() {
    let ok = snippet("WHILE TRUE\n  FOR i = 1 TO 2\n    EXIT WHILE\n    CONTINUE FOR\n  END FOR\nEND WHILE");
    assert!(ok.diagnostics.is_empty(), "{:?}", messages(&ok.diagnostics));

    let bad = snippet("FOR i = 1 TO 2\n  EXIT WHILE\nEND FOR");
    assert_eq!(codes(&bad.diagnostics), vec![2005]);
    assert!(messages(&bad.diagnostics)[0].contains("'exit while'"));
}

#[test]
fn test_continue_case_is_never_valid() {
    let result = snippet("CASE\n  WHEN x = 1\n    EXIT CASE\n    CONTINUE CASE\nEND CASE");
    assert_eq!(codes(&result.diagnostics), vec![2005]);
}

#[test]
fn test_exit_scope_resets_in_function() {
    let result = module("FUNCTION f()\n  EXIT FOR\nEND FUNCTION\n");
    assert_eq!(codes(&result.diagnostics), vec![2005]);

    let result = snippet("EXIT PROGRAM 1");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_exit_requires_block_keyword() {
    let result = snippet("EXIT");
    assert_eq!(codes(&result.diagnostics), vec![2020]);
}

// ============================================================================
// Modules and scopes
// ============================================================================

const SAMPLE_MODULE: &str = r#"
IMPORT FGL util.strings
SCHEMA stores
GLOBALS
  DEFINE g_user STRING
END GLOBALS
DEFINE m_count INTEGER
MAIN
  DEFINE i INTEGER
  PREPARE st FROM "select * from items"
  DECLARE c1 CURSOR FOR st
  FOR i = 1 TO 10
    LET m_count = m_count + 1
  END FOR
  CALL show(m_count)
END MAIN

PRIVATE FUNCTION show(n)
  DISPLAY n
  RETURN n, TRUE
END FUNCTION
"#;

#[test]
fn test_module_structure() {
    let result = module(SAMPLE_MODULE);
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result.diagnostics));

    let root = &result.module;
    assert_eq!(root.start_index(), 0);
    assert_eq!(root.end_index() as usize, SAMPLE_MODULE.chars().count());
    assert!(root.is_complete());

    let NodeKind::Module(ref info) = root.kind else {
        panic!("expected module");
    };
    assert_eq!(info.imports, vec!["util.strings".to_string()]);
    assert_eq!(info.scope.variables[0].name, "m_count");
    assert_eq!(info.globals.variables[0].name, "g_user");
    assert_eq!(info.functions.len(), 1);
    assert_eq!(info.functions[0].parameters, vec!["n".to_string()]);

    let names: Vec<_> = root.children().map(|child| child.name()).collect();
    assert_eq!(names, vec!["import", "schema", "globals", "define", "main", "function"]);
}

#[test]
fn test_foreach_claims_redeclared_cursor() {
    let result = module(
        "FUNCTION f()
  DECLARE c1 CURSOR FROM \"select 1\"
  FOREACH c1
    PREPARE st FROM \"select 2\"
    DECLARE c1 CURSOR FOR st
  END FOREACH
END FUNCTION
",
    );
    assert_eq!(codes(&result.diagnostics), vec![2022]);
    assert_eq!(result.diagnostics.iter().next().unwrap().span, Some(TextSpan::new(105, 2)));

    let function = find(&result.module, "function").unwrap();
    let NodeKind::Function(ref block) = function.kind else {
        panic!("expected function");
    };
    let cursors: Vec<_> = block.scope.cursors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(cursors, vec!["c1", "st"]);

    let foreach = find(&result.module, "foreach").unwrap();
    let NodeKind::Foreach(ref statement) = foreach.kind else {
        panic!("expected foreach");
    };
    assert_eq!(statement.cursor.as_deref(), Some("c1"));
    assert_eq!(statement.redeclarations.len(), 1);
    assert_eq!(statement.redeclarations[0].kind, CursorKind::Declared);
}

#[test]
fn test_routine_scopes() {
    let result = module(SAMPLE_MODULE);
    let main = find(&result.module, "main").unwrap();
    let NodeKind::Main(ref block) = main.kind else {
        panic!("expected main");
    };
    assert_eq!(block.scope.variables.len(), 1);
    let cursors: Vec<_> = block.scope.cursors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(cursors, vec!["st", "c1"]);

    let function = find(&result.module, "function").unwrap();
    let NodeKind::Function(ref block) = function.kind else {
        panic!("expected function");
    };
    assert_eq!(block.name, "show");
    assert_eq!(block.return_arities, vec![2]);
}

#[test]
fn test_extents_nest() {
    let result = module(SAMPLE_MODULE);
    assert!(check_extents(&result.module) > 10);

    let broken = module("MAIN\n  IF x THEN\n    WHILE y\n      LET a = 1\nEND MAIN\n");
    assert_eq!(broken.diagnostics.error_count(), 2);
    check_extents(&broken.module);
}

#[test]
fn test_node_at_finds_innermost() {
    let result = module(SAMPLE_MODULE);
    let offset = SAMPLE_MODULE.find("m_count + 1").unwrap() as u32;
    let node = result.module.node_at(offset).unwrap();
    assert_eq!(node.name(), "let");
}

#[test]
fn test_duplicate_definition() {
    let result = module("FUNCTION f()\n  DEFINE a INTEGER\n  DEFINE a STRING\nEND FUNCTION");
    assert_eq!(codes(&result.diagnostics), vec![2019]);
    assert!(messages(&result.diagnostics)[0].contains("'a'"));
}

#[test]
fn test_return_values_outside_function() {
    let result = module("MAIN\n  RETURN 1\nEND MAIN");
    assert_eq!(codes(&result.diagnostics), vec![2010]);

    let result = module("MAIN\n  RETURN\nEND MAIN");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_main_rules() {
    let result = module("MAIN\nEND MAIN\nMAIN\nEND MAIN");
    assert_eq!(codes(&result.diagnostics), vec![2015]);

    let result = module("PUBLIC MAIN\nEND MAIN");
    assert_eq!(codes(&result.diagnostics), vec![2016]);
    assert_eq!(
        messages(&result.diagnostics)[0],
        "'public' modifier cannot be applied to main."
    );
}

#[test]
fn test_unterminated_function_stops_at_next_routine() {
    let result = module("FUNCTION a()\n  LET x = 1\nFUNCTION b()\nEND FUNCTION");
    assert_eq!(result.diagnostics.error_count(), 1);
    assert!(messages(&result.diagnostics)[0].contains("end function"));
    let NodeKind::Module(ref info) = result.module.kind else {
        panic!("expected module");
    };
    assert_eq!(info.functions.len(), 2);
}

#[test]
fn test_module_level_garbage() {
    let result = module("LET x = 1\nMAIN\nEND MAIN");
    assert_eq!(result.diagnostics.error_count(), 1);
    assert_eq!(codes(&result.diagnostics), vec![2014]);
    assert!(find(&result.module, "main").is_some());
}

#[test]
fn test_globals_include() {
    let result = module("GLOBALS \"globals.4gl\"\nMAIN\nEND MAIN");
    assert!(result.diagnostics.is_empty());
    let NodeKind::GlobalsInclude(ref include) = result.module.children().next().unwrap().kind else {
        panic!("expected globals include");
    };
    assert_eq!(include.file, "globals.4gl");
}

#[test]
fn test_import_kinds() {
    let result = module("IMPORT os\nIMPORT JAVA java.util.Date");
    assert!(result.diagnostics.is_empty());
    let kinds: Vec<_> = result
        .module
        .children()
        .map(|child| match &child.kind {
            NodeKind::Import(import) => (import.import_kind, import.path.clone()),
            _ => panic!("expected import"),
        })
        .collect();
    assert_eq!(kinds[0].0, fgl_ast::ImportKind::Extension);
    assert_eq!(kinds[1], (fgl_ast::ImportKind::Java, "java.util.Date".to_string()));
}

// ============================================================================
// Version gating
// ============================================================================

#[test]
fn test_version_gated_statements() {
    let source = "TYPE t_id INTEGER\nMAIN\nEND MAIN";

    let latest = module(source);
    assert!(latest.diagnostics.is_empty());

    let old = parse_module(source, &ParseOptions::with_version(LanguageVersion::V2_10));
    assert_eq!(codes(&old.diagnostics)[0], 2011);
    assert_eq!(
        messages(&old.diagnostics)[0],
        "'type' requires language version 2.20 or later."
    );
    // Recovery resumes at the next module member.
    assert!(find(&old.module, "main").is_some());

    let import = parse_module("IMPORT os", &ParseOptions::with_version(LanguageVersion::V2_20));
    assert_eq!(codes(&import.diagnostics)[0], 2011);
}

#[test]
fn test_modifier_does_not_commit_to_gated_production() {
    let result = parse_module(
        "PRIVATE FUNCTION f()\nEND FUNCTION",
        &ParseOptions::with_version(LanguageVersion::V2_10),
    );
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result.diagnostics));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_verbatim_keeps_trivia() {
    let options = ParseOptions {
        verbatim: true,
        ..ParseOptions::default()
    };
    let result = parse_module("MAIN # entry\nEND MAIN", &options);
    assert!(result.trivia.iter().any(|t| t.kind == TokenKind::Comment));

    let plain = module("MAIN # entry\nEND MAIN");
    assert!(plain.trivia.is_empty());
}

#[test]
fn test_file_name_is_attached() {
    let options = ParseOptions {
        file_name: Some("orders.4gl".to_string()),
        ..ParseOptions::default()
    };
    let result = parse_module("MAIN\n", &options);
    assert!(result
        .diagnostics
        .iter()
        .all(|d| d.file.as_deref() == Some("orders.4gl")));
    assert_eq!(result.diagnostics.len(), 1);
}

#[test]
fn test_deep_nesting_is_bounded() {
    let depth = 400;
    let source = format!("LET x = {}1{}", "(".repeat(depth), ")".repeat(depth));
    let result = snippet(&source);
    let nesting = codes(&result.diagnostics).iter().filter(|&&code| code == 2012).count();
    assert_eq!(nesting, 1);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_peek_is_idempotent(source in "[a-zA-Z0-9 \n().,=+*#\"-]{0,60}", depth in 1usize..6) {
        let mut queue = TokenQueue::new(&source, ScanMode::Default);
        let deep = queue.peek_token(depth).clone();
        let first = queue.peek_token(1).clone();
        prop_assert_eq!(queue.peek_token(depth).clone(), deep);
        queue.next_token();
        prop_assert_eq!(queue.token().clone(), first);
    }

    #[test]
    fn prop_module_spans_whole_text(source in "(MAIN|END|FOR|IF|THEN|LET|x|=|1|\n| )*") {
        let result = module(&source);
        prop_assert_eq!(result.module.end_index() as usize, source.chars().count());
        check_extents(&result.module);
    }
}
