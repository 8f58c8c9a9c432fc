//! End-to-end tests for grove-syntax using insta for snapshot testing.
//!
//! These tests drive the public API the way a consumer would: parse, query,
//! edit and traverse, with inline snapshots for structured outputs.

use std::cell::RefCell;

use insta::assert_snapshot;
use rstest::{fixture, rstest};

use grove_syntax::{
    DispatchMode, Parser, ParserConfig, Query, QueryOptions, SupportedLanguage, SyntaxTree,
    Visitor, VisitorConfig,
};

/// Fixture providing the arithmetic expression used across the suite.
#[fixture]
fn expression() -> SyntaxTree {
    Parser::new(SupportedLanguage::Math)
        .parse("1 + x * 3 + 2\n")
        .unwrap_or_else(|err| panic!("parse: {err}"))
}

fn captures_for(language: SupportedLanguage, source: &str, query: &str) -> Vec<String> {
    let tree = Parser::new(language)
        .parse(source)
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let matches = tree
        .query(query)
        .unwrap_or_else(|err| panic!("query: {err}"));
    matches
        .iter()
        .flat_map(|found| found.captures())
        .map(|capture| format!("{language}: {}={}", capture.name(), capture.text()))
        .collect()
}

// =============================================================================
// Parsing
// =============================================================================

#[rstest]
fn snapshot_math_tree(expression: SyntaxTree) {
    assert_snapshot!(
        expression.root_node().to_sexp(),
        @"(expression (sum left: (sum left: (number) right: (product left: (variable) right: (number))) right: (number)))"
    );
}

#[rstest]
#[case(SupportedLanguage::Rust, "fn main() { println!(\"hello\"); }")]
#[case(
    SupportedLanguage::Python,
    "def greet(name):\n    print(f'Hello, {name}')"
)]
#[case(
    SupportedLanguage::TypeScript,
    "function greet(name: string): void { console.log(name); }"
)]
fn parse_valid_file_succeeds(#[case] language: SupportedLanguage, #[case] source: &str) {
    let tree = Parser::new(language)
        .parse(source)
        .unwrap_or_else(|err| panic!("parse: {err}"));

    assert!(!tree.has_errors());
    assert_eq!(tree.language(), language);
}

#[test]
fn snapshot_language_detection() {
    let extensions = ["math", "rs", "py", "pyi", "ts", "tsx", "json", "md"];
    let results: Vec<_> = extensions
        .iter()
        .map(|ext| {
            let language = SupportedLanguage::from_extension(ext);
            format!("{ext}: {language:?}")
        })
        .collect();

    assert_snapshot!(results.join("\n"), @r"
    math: Some(Math)
    rs: Some(Rust)
    py: Some(Python)
    pyi: Some(Python)
    ts: Some(TypeScript)
    tsx: Some(TypeScript)
    json: None
    md: None
    ");
}

// =============================================================================
// Querying
// =============================================================================

#[rstest]
fn snapshot_sum_captures(expression: SyntaxTree) {
    let matches = expression
        .query("(sum left: (_) @left right: (_) @right) @sum")
        .unwrap_or_else(|err| panic!("query: {err}"));
    let rendered: Vec<_> = matches
        .iter()
        .map(|found| {
            found
                .captures()
                .map(|capture| format!("{}={:?}", capture.name(), capture.text()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    assert_snapshot!(rendered.join("\n"), @r#"
    left="1 + x * 3" right="2" sum="1 + x * 3 + 2"
    left="1" right="x * 3" sum="1 + x * 3"
    "#);
}

#[test]
fn snapshot_captures_across_languages() {
    let mut captured = captures_for(
        SupportedLanguage::Rust,
        "fn main() {}\nfn other() {}",
        "(function_item name: (identifier) @name)",
    );
    captured.extend(captures_for(
        SupportedLanguage::Python,
        "def greet():\n    pass\n",
        "(function_definition name: (identifier) @name)",
    ));
    captured.extend(captures_for(
        SupportedLanguage::TypeScript,
        "function greet(): void {}",
        "(function_declaration name: (identifier) @name)",
    ));

    assert_snapshot!(captured.join("\n"), @r"
    rust: name=main
    rust: name=other
    python: name=greet
    typescript: name=greet
    ");
}

#[rstest]
fn query_options_restrict_results(expression: SyntaxTree) {
    let query = Query::for_language(SupportedLanguage::Math, "(number) @n")
        .unwrap_or_else(|err| panic!("query: {err}"));
    let options = QueryOptions::default().with_byte_range(0..5);
    let texts: Vec<_> = query
        .matches_in(&expression, &options)
        .unwrap_or_else(|err| panic!("matches: {err}"))
        .iter()
        .filter_map(|found| found.get("n").map(|capture| capture.text()))
        .collect();

    assert_eq!(texts, ["1"]);
}

#[rstest]
fn snapshot_query_on_another_language(expression: SyntaxTree) {
    let query = Query::for_language(SupportedLanguage::Rust, "(identifier) @id")
        .unwrap_or_else(|err| panic!("query: {err}"));
    let err = query
        .matches(&expression)
        .expect_err("a rust query should not run on a math tree");

    assert_snapshot!(err.to_string(), @"query for rust cannot run on a math tree");
}

#[test]
fn snapshot_query_compilation_error() {
    let err = Query::for_language(SupportedLanguage::Math, "(summation)")
        .expect_err("unknown kind should be rejected");

    assert_snapshot!(
        err.to_string(),
        @"invalid query for math at offset 1: unknown node kind `summation`"
    );
}

// =============================================================================
// Editing
// =============================================================================

#[rstest]
fn snapshot_errors_after_delete(mut expression: SyntaxTree) {
    let range = expression
        .query("(product) @product")
        .and_then(|matches| matches.dig(0, "product").map(|capture| capture.byte_range()))
        .unwrap_or_else(|err| panic!("query: {err}"));
    expression
        .delete(range)
        .unwrap_or_else(|err| panic!("delete: {err}"));

    let errors: Vec<_> = expression
        .errors()
        .iter()
        .map(|error| format!("{}:{} {}", error.line, error.column, error.message))
        .collect();
    assert_snapshot!(format!("{:?} {errors:?}", expression.text()), @r#""1 +  + 2\n" ["1:4 missing number"]"#);
}

#[rstest]
fn snapshot_out_of_bounds_edit(mut expression: SyntaxTree) {
    let err = expression
        .edit(3..40, "x")
        .expect_err("range past the end should be rejected");

    assert_snapshot!(
        err.to_string(),
        @"range 3..40 is out of bounds for document of length 14"
    );
    assert_eq!(expression.text(), "1 + x * 3 + 2\n");
}

#[rstest]
#[case(true)]
#[case(false)]
fn python_edits_match_fresh_parses(#[case] incremental: bool) {
    let parser =
        Parser::new(SupportedLanguage::Python).with_config(ParserConfig::new(incremental));
    let mut tree = parser
        .parse("def hello():\n    return 1\n")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    tree.edit(24..25, "name + 1")
        .unwrap_or_else(|err| panic!("edit: {err}"));

    let fresh = parser
        .parse("def hello():\n    return name + 1\n")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    assert_eq!(tree.text(), fresh.text());
    assert_eq!(tree.root_node().to_sexp(), fresh.root_node().to_sexp());
}

// =============================================================================
// Traversal
// =============================================================================

#[test]
fn snapshot_indented_outline() {
    let tree = Parser::new(SupportedLanguage::Math)
        .parse("(a + 1) / b")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let depth = RefCell::new(0_usize);
    let lines = RefCell::new(Vec::new());
    Visitor::new(tree.root_node())
        .around(|node, cont| {
            if node.is_named() {
                let indent = "  ".repeat(*depth.borrow());
                lines.borrow_mut().push(format!("{indent}{}", node.kind()));
            }
            *depth.borrow_mut() += 1;
            cont.proceed();
            *depth.borrow_mut() -= 1;
        })
        .visit();

    assert_snapshot!(lines.into_inner().join("\n"), @r"
    expression
      quotient
        parenthesized_expression
          sum
            variable
            number
        variable
    ");
}

#[test]
fn wrap_supersedes_lets_wrap_hooks_choose() {
    let tree = Parser::new(SupportedLanguage::Math)
        .parse("1 + x * 3")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let config: VisitorConfig = serde_json::from_str(r#"{"dispatch": "wrap_supersedes"}"#)
        .unwrap_or_else(|err| panic!("config: {err}"));
    assert_eq!(config.dispatch(), DispatchMode::WrapSupersedes);

    let events = RefCell::new(Vec::new());
    Visitor::with_config(tree.root_node(), config)
        .on(|node| events.borrow_mut().push(node.kind()))
        .around_kind("product", |_, cont| cont.proceed())
        .visit();

    assert_eq!(
        events.into_inner(),
        ["expression", "sum", "number", "+", "variable", "*", "number"]
    );
}
