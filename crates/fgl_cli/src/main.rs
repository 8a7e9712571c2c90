//! fglc: command-line front end for 4GL sources.
//!
//! Usage:
//!   fglc parse <FILE> [--verbatim] [--snippet]
//!   fglc check <FILE>...
//!   fglc tokens <FILE> [--verbatim]
//!   fglc complete <FILE> (--offset N | --line L --column C) [--kinds k,...]
//!
//! Options are read from the nearest fglconfig.json unless `--project` names
//! one; flags override file values.

use clap::{Args, Parser as ClapParser, Subcommand};
use fgl_ast::{AstNode, TokenKind};
use fgl_completion::{
    CompletionEngine, FileRuleSource, MemoryRuleSource, ProviderRegistry, RuleRegistry, RuleSource,
};
use fgl_core::text::{byte_offset, LineAndColumn, LineMap, TextPos};
use fgl_core::version::LanguageVersion;
use fgl_diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticCollection};
use fgl_options::FrontendOptions;
use fgl_parser::{parse_module, parse_statements};
use fgl_scanner::{tokenize, ScanMode};
use miette::{IntoDiagnostic, LabeledSpan, MietteDiagnostic, NamedSource, Severity, WrapErr};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

#[derive(ClapParser, Debug)]
#[command(name = "fglc", version, about = "fglc - parse, check and complete 4GL sources")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Path to fglconfig.json.
    #[arg(short = 'p', long = "project", global = true)]
    project: Option<PathBuf>,

    /// Active language version, e.g. 3.20.
    #[arg(long = "language-version", global = true)]
    language_version: Option<LanguageVersion>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a file and print its syntax tree.
    Parse {
        file: PathBuf,

        /// Keep whitespace and comments.
        #[arg(long)]
        verbatim: bool,

        /// Parse a run of statements instead of a whole module.
        #[arg(long)]
        snippet: bool,
    },

    /// Parse files in parallel and report their diagnostics.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the tokens of a file.
    Tokens {
        file: PathBuf,

        /// Include whitespace and comment tokens.
        #[arg(long)]
        verbatim: bool,
    },

    /// List completion candidates at a position.
    Complete {
        file: PathBuf,

        /// Character offset of the cursor.
        #[arg(long, conflicts_with_all = ["line", "column"], required_unless_present = "line")]
        offset: Option<u32>,

        /// 1-based cursor line.
        #[arg(long, requires = "column")]
        line: Option<u32>,

        /// 1-based cursor column, in characters.
        #[arg(long, requires = "line")]
        column: Option<u32>,

        /// Member kinds to offer, comma separated.
        #[arg(long, value_delimiter = ',')]
        kinds: Vec<String>,

        /// Completion rule document; overrides `rulesFile`.
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> miette::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().into_diagnostic()?;
    let (mut options, config_path) =
        fgl_options::load_options(cli.global.project.as_deref(), &cwd).into_diagnostic()?;
    if let Some(path) = &config_path {
        debug!(path = %path.display(), "using options file");
    }
    options.merge(FrontendOptions {
        language_version: cli.global.language_version,
        ..FrontendOptions::default()
    });

    let json = cli.global.json;
    match cli.command {
        Command::Parse {
            file,
            verbatim,
            snippet,
        } => {
            if verbatim {
                options.verbatim = Some(true);
            }
            run_parse(&file, &options, snippet, json)
        }
        Command::Check { files } => run_check(&files, &options, json),
        Command::Tokens { file, verbatim } => run_tokens(&file, verbatim, json),
        Command::Complete {
            file,
            offset,
            line,
            column,
            kinds,
            rules,
        } => {
            if !kinds.is_empty() {
                options.member_kinds = Some(kinds);
            }
            if rules.is_some() {
                options.rules_file = rules;
            }
            let text = read_source(&file)?;
            let offset = match (offset, line, column) {
                (Some(offset), _, _) => offset,
                (None, Some(line), Some(column)) => LineMap::new(&text).offset_of(LineAndColumn::new(
                    line.saturating_sub(1),
                    column.saturating_sub(1),
                )),
                _ => miette::bail!("a cursor position is required: --offset or --line/--column"),
            };
            run_complete(&text, offset, &options, json)
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> miette::Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read '{}'", path.display()))
}

fn exit_code(diagnostics: &DiagnosticCollection) -> ExitCode {
    if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json(value: &impl Serialize) -> miette::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

// ============================================================================
// parse
// ============================================================================

fn run_parse(file: &Path, options: &FrontendOptions, snippet: bool, json: bool) -> miette::Result<ExitCode> {
    let text = read_source(file)?;
    let name = file.display().to_string();
    let parse_options = options.parse_options(Some(&name));
    let line_map = LineMap::new(&text);

    let diagnostics = if snippet {
        let result = parse_statements(&text, &parse_options);
        if json {
            print_json(&serde_json::json!({
                "statements": result.statements,
                "diagnostics": result.diagnostics.diagnostics(),
            }))?;
        } else {
            for statement in &result.statements {
                print_outline(statement, &line_map, 0);
            }
        }
        result.diagnostics
    } else {
        let result = parse_module(&text, &parse_options);
        if json {
            print_json(&serde_json::json!({
                "module": result.module,
                "diagnostics": result.diagnostics.diagnostics(),
                "trivia": result.trivia.len(),
            }))?;
        } else {
            print_outline(&result.module, &line_map, 0);
        }
        result.diagnostics
    };

    if !json {
        report_diagnostics(&name, &text, &diagnostics);
    }
    Ok(exit_code(&diagnostics))
}

fn print_outline(node: &AstNode, line_map: &LineMap, depth: usize) {
    let start = line_map.line_and_column_of(node.start_index());
    let end = line_map.line_and_column_of(node.end_index());
    println!(
        "{:indent$}{} {}:{}-{}:{}{}",
        "",
        node.name(),
        start.line + 1,
        start.character + 1,
        end.line + 1,
        end.character + 1,
        if node.is_complete() { "" } else { " (incomplete)" },
        indent = depth * 2,
    );
    for child in node.children() {
        print_outline(child, line_map, depth + 1);
    }
}

// ============================================================================
// check
// ============================================================================

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    diagnostics: &'a [Diagnostic],
}

fn run_check(files: &[PathBuf], options: &FrontendOptions, json: bool) -> miette::Result<ExitCode> {
    let results: Vec<_> = files
        .par_iter()
        .map(|file| {
            let name = file.display().to_string();
            let parsed = read_source(file).map(|text| {
                let result = parse_module(&text, &options.parse_options(Some(&name)));
                (text, result.diagnostics)
            });
            (name, parsed)
        })
        .collect();

    let mut errors = 0;
    let mut failed_files = 0;
    let mut reports = Vec::new();
    for (name, parsed) in &results {
        match parsed {
            Ok((text, diagnostics)) => {
                errors += diagnostics.error_count();
                if diagnostics.has_errors() {
                    failed_files += 1;
                }
                if json {
                    reports.push(FileReport {
                        file: name.clone(),
                        error: None,
                        diagnostics: diagnostics.diagnostics(),
                    });
                } else {
                    report_diagnostics(name, text, diagnostics);
                }
            }
            Err(err) => {
                failed_files += 1;
                if json {
                    reports.push(FileReport {
                        file: name.clone(),
                        error: Some(format!("{err}")),
                        diagnostics: &[],
                    });
                } else {
                    eprintln!("{err:?}");
                }
            }
        }
    }

    if json {
        print_json(&reports)?;
    } else {
        eprintln!(
            "Checked {} file{}: {} error{} in {} file{}.",
            files.len(),
            plural(files.len()),
            errors,
            plural(errors),
            failed_files,
            plural(failed_files),
        );
    }
    Ok(if failed_files > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

// ============================================================================
// tokens
// ============================================================================

#[derive(Serialize)]
struct TokenView<'a> {
    kind: TokenKind,
    category: &'static str,
    start: TextPos,
    end: TextPos,
    text: &'a str,
}

fn run_tokens(file: &Path, verbatim: bool, json: bool) -> miette::Result<ExitCode> {
    let text = read_source(file)?;
    let mode = if verbatim {
        ScanMode::Verbatim
    } else {
        ScanMode::Default
    };
    let (tokens, diagnostics) = tokenize(&text, mode);

    if json {
        let views: Vec<_> = tokens
            .iter()
            .map(|token| TokenView {
                kind: token.kind,
                category: token.category().name(),
                start: token.pos,
                end: token.end,
                text: &token.text,
            })
            .collect();
        print_json(&views)?;
    } else {
        let line_map = LineMap::new(&text);
        for token in &tokens {
            let at = line_map.line_and_column_of(token.pos);
            println!(
                "{}:{}\t{}\t{:?}",
                at.line + 1,
                at.character + 1,
                token.category().name(),
                token.text
            );
        }
        report_diagnostics(&file.display().to_string(), &text, &diagnostics);
    }
    Ok(exit_code(&diagnostics))
}

// ============================================================================
// complete
// ============================================================================

fn run_complete(text: &str, offset: TextPos, options: &FrontendOptions, json: bool) -> miette::Result<ExitCode> {
    let kinds = options.member_kinds().into_diagnostic()?;
    let providers = Arc::new(ProviderRegistry::with_builtins());
    let source: Box<dyn RuleSource> = match &options.rules_file {
        Some(path) => Box::new(FileRuleSource::new(path)),
        None => Box::new(MemoryRuleSource::bundled()),
    };
    let registry = RuleRegistry::new(source, options.product_version(), &providers);
    registry
        .reload()
        .into_diagnostic()
        .wrap_err("failed to load completion rules")?;

    let engine = CompletionEngine::new(Arc::new(registry), providers);
    let candidates = engine.complete_at(text, offset, options.language_version(), kinds);

    if json {
        print_json(&candidates.into_vec())?;
    } else {
        for item in candidates.iter() {
            match &item.detail {
                Some(detail) => println!("{}\t{:?}\t{}", item.label, item.kind, detail),
                None => println!("{}\t{:?}", item.label, item.kind),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Diagnostic rendering
// ============================================================================

fn report_diagnostics(name: &str, text: &str, diagnostics: &DiagnosticCollection) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{:?}", to_report(diagnostic, name, text));
    }
}

/// Convert a diagnostic for miette, translating its character span into the
/// byte span miette expects.
fn to_report(diagnostic: &Diagnostic, name: &str, text: &str) -> miette::Report {
    let severity = match diagnostic.category {
        DiagnosticCategory::Error => Severity::Error,
        DiagnosticCategory::Warning => Severity::Warning,
    };
    let mut report = MietteDiagnostic::new(diagnostic.message_text.clone())
        .with_code(format!("FGL{}", diagnostic.code))
        .with_severity(severity);
    if let Some(span) = diagnostic.span {
        let (start, end) = byte_span(text, span.start, span.end());
        report = report.with_label(LabeledSpan::underline(start..end));
    }
    miette::Report::new(report).with_source_code(NamedSource::new(name, text.to_string()))
}

fn byte_span(text: &str, start: TextPos, end: TextPos) -> (usize, usize) {
    (byte_offset(text, start), byte_offset(text, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_byte_span_counts_characters() {
        let text = "LET é = \"ü\"";
        assert_eq!(byte_span(text, 4, 5), (4, 6));
        assert_eq!(byte_span(text, 8, 11), (9, 13));
        assert_eq!(byte_span(text, 20, 30), (text.len(), text.len()));
    }

    #[test]
    fn test_complete_arguments() {
        let cli = Cli::try_parse_from(["fglc", "complete", "a.4gl", "--line", "3", "--column", "5", "--kinds", "variables,keywords"])
            .unwrap();
        match cli.command {
            Command::Complete { line, column, kinds, offset, .. } => {
                assert_eq!((line, column, offset), (Some(3), Some(5), None));
                assert_eq!(kinds, vec!["variables", "keywords"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["fglc", "complete", "a.4gl"]).is_err());
        assert!(Cli::try_parse_from(["fglc", "complete", "a.4gl", "--offset", "1", "--line", "1", "--column", "1"]).is_err());
    }

    #[test]
    fn test_global_version_flag() {
        let cli = Cli::try_parse_from(["fglc", "check", "a.4gl", "--language-version", "2.50"]).unwrap();
        assert_eq!(cli.global.language_version, Some(LanguageVersion::V2_50));
    }
}
