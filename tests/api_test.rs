use dmmf_core::dmmf::DmmfDocument;
use dmmf_core::{generate, generate_from_bytes, generate_from_reader, GenerateOptions};
use std::io::Cursor;

fn doc_schema(doc: &str) -> String {
    format!("/// {doc}\nmodel Item {{\n  /// {doc}\n  id Int @id\n}}\n\n/// {doc}\nenum Kind {{\n  /// {doc}\n  A\n}}\n")
}

#[test]
fn test_round_trip_for_every_encoded_width() {
    for doc in ["plain ascii", "café crème", "最終更新者", "🦀🦀 crab", "mixé 承認 🦀"] {
        let result = generate(&doc_schema(doc), "test.prisma").unwrap();
        let json = result.to_json_compact().unwrap();
        let parsed: DmmfDocument = serde_json::from_str(&json).unwrap();

        let model = &parsed.datamodel.models[0];
        assert_eq!(model.documentation.as_deref(), Some(doc));
        assert_eq!(model.fields[0].documentation.as_deref(), Some(doc));
        let kind = &parsed.datamodel.enums[0];
        assert_eq!(kind.documentation.as_deref(), Some(doc));
        assert_eq!(kind.values[0].documentation.as_deref(), Some(doc));
        assert_eq!(parsed, result.document);
    }
}

#[test]
fn test_round_trip_of_text_that_needs_escaping() {
    let lines = [
        "a \"q\" \\ b\tc",
        "del\u{7f} ls\u{2028} ps\u{2029} end",
        "  indented 承認\t ",
    ];
    let source = format!(
        "/// {}\n/// {}\n/// {}\nmodel A {{\n  /// {}\n  id Int\n}}\n",
        lines[0], lines[1], lines[2], lines[0]
    );
    let expected = lines.join("\n");

    let result = generate(&source, "test.prisma").unwrap();
    for json in [result.to_json().unwrap(), result.to_json_compact().unwrap()] {
        let parsed: DmmfDocument = serde_json::from_str(&json).unwrap();
        let model = &parsed.datamodel.models[0];
        assert_eq!(model.documentation.as_deref(), Some(expected.as_str()));
        assert_eq!(model.fields[0].documentation.as_deref(), Some(lines[0]));
    }
    let compact = result.to_json_compact().unwrap();
    assert!(compact.contains(r#"a \"q\" \\ b\tc"#), "{compact}");
}

#[test]
fn test_multibyte_text_is_not_escaped() {
    let result = generate(&doc_schema("承認日時"), "test.prisma").unwrap();
    let json = result.to_json().unwrap();
    assert!(json.contains("\"documentation\": \"承認日時\""), "{json}");
    assert!(!json.contains("\\u"), "{json}");
}

#[test]
fn test_control_characters_are_escaped() {
    let source = "model A {\n  name String @default(\"tab\\there\")\n}";
    let result = generate(source, "test.prisma").unwrap();
    let json = result.to_json_compact().unwrap();
    assert!(json.contains(r#""default":"tab\there""#), "{json}");
}

#[test]
fn test_absent_documentation_is_null() {
    let result = generate("model A {\n  id Int\n}", "test.prisma").unwrap();
    let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    let model = &value["datamodel"]["models"][0];
    assert!(model.as_object().unwrap().contains_key("documentation"));
    assert!(model["documentation"].is_null());
    assert!(model["fields"][0]["documentation"].is_null());
}

#[test]
fn test_output_is_idempotent() {
    let source = doc_schema("最終更新者 🦀");
    let first = generate(&source, "test.prisma").unwrap().to_json().unwrap();
    let second = generate(&source, "test.prisma").unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_doc_whitespace_is_preserved() {
    let source = "///   indented code\n///\tx  \nmodel A {\n  id Int\n}\n";
    let result = generate(source, "test.prisma").unwrap();
    assert_eq!(
        result.document.datamodel.models[0].documentation.as_deref(),
        Some("  indented code\n\tx  ")
    );
}

#[test]
fn test_crlf_line_endings_are_normalized() {
    let source = "/// 承認日時\r\n/// 二行目\r\nmodel A {\r\n  id Int\r\n}\r\n";
    let result = generate(source, "test.prisma").unwrap();
    assert_eq!(
        result.document.datamodel.models[0].documentation.as_deref(),
        Some("承認日時\n二行目")
    );
}

#[test]
fn test_all_entry_points_agree() {
    let source = doc_schema("承認者 🦀");
    let from_str = generate(&source, "test.prisma").unwrap().to_json().unwrap();
    let from_bytes = generate_from_bytes(source.clone().into_bytes(), GenerateOptions::new("test.prisma"))
        .unwrap()
        .to_json()
        .unwrap();
    let from_reader = generate_from_reader(
        Cursor::new(source.into_bytes()),
        GenerateOptions::new("test.prisma").with_read_chunk_size(3),
    )
    .unwrap()
    .to_json()
    .unwrap();
    assert_eq!(from_str, from_bytes);
    assert_eq!(from_str, from_reader);
}

#[test]
fn test_elements_in_source_order() {
    let result = generate(&doc_schema("説明"), "test.prisma").unwrap();
    let elements = result.elements();
    let names: Vec<&str> = elements.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["Item", "id", "id", "Kind", "A"]);
    let starts: Vec<usize> = elements.iter().map(|e| e.span().start()).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]), "{starts:?}");
    assert!(elements[1].span().end() <= elements[0].span().end());
}

#[test]
fn test_generation_result_serializes_as_document() {
    let result = generate(&doc_schema("説明"), "test.prisma").unwrap();
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        result.to_json_compact().unwrap()
    );
}
