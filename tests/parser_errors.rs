// Parser error path tests
// Each malformed schema must be rejected as a whole, with the position of the first bad token

use dmmf_core::{error::DmmfError, generate};

fn syntax_position(source: &str) -> (usize, usize, usize) {
    match generate(source, "test.prisma") {
        Err(DmmfError::Syntax(err)) => (err.position, err.line, err.column),
        Err(other) => panic!("Expected syntax error, got {other:?}"),
        Ok(_) => panic!("Expected syntax error, got a document"),
    }
}

#[test]
fn test_parser_error_missing_closing_brace() {
    let result = generate("model User {\n  id Int", "test.prisma");
    assert!(result.is_err(), "Should fail with missing }}");
}

#[test]
fn test_parser_error_missing_block_name() {
    let result = generate("model {\n}", "test.prisma");
    assert!(result.is_err(), "Should fail without a model name");
}

#[test]
fn test_parser_error_unknown_top_level_keyword() {
    let result = generate("table User {\n}", "test.prisma");
    assert!(result.is_err(), "Should fail on unknown declaration");
    assert_eq!(syntax_position("table User {\n}"), (0, 1, 1));
}

#[test]
fn test_parser_error_missing_closing_bracket() {
    let result = generate("model A {\n  tags String[\n}", "test.prisma");
    assert!(result.is_err(), "Should fail with missing ]");
}

#[test]
fn test_parser_error_unclosed_attribute_arguments() {
    let result = generate("model A {\n  id Int @default(autoincrement()\n}", "test.prisma");
    assert!(result.is_err(), "Should fail with missing )");
}

#[test]
fn test_parser_error_config_property_without_equals() {
    let result = generate("datasource db {\n  provider \"sqlite\"\n}", "test.prisma");
    assert!(result.is_err(), "Should fail with missing =");
}

#[test]
fn test_parser_error_bad_escape() {
    let result = generate("model A {\n  s String @default(\"\\q\")\n}", "test.prisma");
    assert!(result.is_err(), "Should fail with an unknown escape");
}

#[test]
fn test_parser_error_unterminated_block_comment() {
    let result = generate("/* never closed\nmodel A {\n}", "test.prisma");
    assert!(result.is_err(), "Should fail on unterminated block comment");
}

#[test]
fn test_parser_error_position_counts_characters() {
    // "承認" is six bytes but two columns.
    let source = "/// 承認\nmodel A {\n  id Int\n  }x\n}";
    let (position, line, column) = syntax_position(source);
    assert_eq!(&source[position..position + 1], "x");
    assert_eq!((line, column), (4, 4));
}

#[test]
fn test_parser_error_renders_with_miette() {
    let err = generate("model A {\n  id\n}", "test.prisma").unwrap_err();
    let report = miette::Report::from(err);
    let rendered = format!("{report:?}");
    assert!(rendered.contains("parser::unexpected_token"), "{rendered}");
}
