// Integration tests for dmmf-core using schema fixtures
use dmmf_core::dmmf::FieldKind;
use dmmf_core::generate;
use std::fs;
use std::path::PathBuf;

fn get_test_file_path(subdir: &str, filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(subdir)
        .join(filename)
}

fn read_test_file(subdir: &str, filename: &str) -> String {
    let path = get_test_file_path(subdir, filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {:?}", path))
}

// Schemas that should parse and render successfully
mod ok_tests {
    use super::*;

    #[test]
    fn test_blog() {
        let content = read_test_file("ok", "blog.prisma");
        let result = generate(&content, "blog.prisma");
        assert!(
            result.is_ok(),
            "Should parse successfully: {:?}",
            result.err()
        );
        let doc = result.unwrap().document;

        let user = &doc.datamodel.models[0];
        assert_eq!(user.name, "User");
        assert_eq!(
            user.documentation.as_deref(),
            Some("投稿者\nブログの利用者を表す")
        );
        assert_eq!(user.db_name.as_deref(), Some("users"));

        let post = &doc.datamodel.models[1];
        let title = post.fields.iter().find(|f| f.name == "title").unwrap();
        assert_eq!(title.documentation.as_deref(), Some("タイトル"));
        let tags = post.fields.iter().find(|f| f.name == "tags").unwrap();
        assert!(tags.is_list);
        assert_eq!(post.unique_fields, vec![vec!["title", "authorId"]]);

        let role = &doc.datamodel.enums[0];
        assert_eq!(role.documentation.as_deref(), Some("役割"));
        assert_eq!(role.values[0].documentation.as_deref(), Some("管理者"));
        assert_eq!(role.values[1].db_name.as_deref(), Some("user"));
    }

    #[test]
    fn test_multibyte_docs() {
        let content = read_test_file("ok", "multibyte_docs.prisma");
        let result = generate(&content, "multibyte_docs.prisma").unwrap();
        let doc = &result.document;

        let approval = &doc.datamodel.models[0];
        assert_eq!(
            approval.documentation.as_deref(),
            Some("承認日時の履歴\nÉmile's café ☕ 🦀")
        );
        let docs: Vec<Option<&str>> = approval
            .fields
            .iter()
            .map(|f| f.documentation.as_deref())
            .collect();
        assert_eq!(
            docs,
            vec![
                Some("承認日時"),
                Some("承認者 👩‍💻"),
                Some("한국어 설명 и русский текст"),
                Some(""),
            ]
        );

        let address = &doc.datamodel.types[0];
        assert_eq!(address.documentation.as_deref(), Some("Адрес"));
        assert_eq!(address.fields[1].documentation.as_deref(), Some("市区町村"));

        let json = result.to_json().unwrap();
        assert!(!json.contains('\u{FFFD}'));
        assert!(json.contains("承認者 👩‍💻"));
    }

    #[test]
    fn test_edge_cases() {
        let content = read_test_file("ok", "edge_cases.prisma");
        let result = generate(&content, "edge_cases.prisma");
        assert!(
            result.is_ok(),
            "Should parse successfully: {:?}",
            result.err()
        );
        let doc = result.unwrap().document;

        let stats = &doc.datamodel.models[0];
        assert_eq!(stats.name, "UserStats");
        assert_eq!(stats.documentation.as_deref(), Some("A view over users."));
        let point = &stats.fields[3];
        assert_eq!(point.kind, FieldKind::Unsupported);
        assert_eq!(point.field_type, "geometry(Point, 4326)");

        let composite = &doc.datamodel.models[1];
        let pk = composite.primary_key.as_ref().unwrap();
        assert_eq!(pk.name.as_deref(), Some("composite_pk"));
        assert_eq!(pk.fields, vec!["a", "b"]);
        assert_eq!(composite.db_name.as_deref(), Some("composite_table"));

        assert!(doc.datamodel.enums[0].values.is_empty());

        let keywords = &doc.datamodel.models[2];
        let names: Vec<&str> = keywords.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["model", "type", "enum"]);
    }
}

// Schemas that should be rejected
mod bad_tests {
    use super::*;

    fn assert_rejected(filename: &str) {
        let content = read_test_file("bad", filename);
        let result = generate(&content, filename);
        assert!(result.is_err(), "{filename} should fail to parse");
    }

    #[test]
    fn test_missing_brace() {
        assert_rejected("missing_brace.prisma");
    }

    #[test]
    fn test_unterminated_string() {
        assert_rejected("unterminated_string.prisma");
    }

    #[test]
    fn test_field_without_type() {
        assert_rejected("field_without_type.prisma");
    }

    #[test]
    fn test_stray_token() {
        assert_rejected("stray_token.prisma");
    }
}
