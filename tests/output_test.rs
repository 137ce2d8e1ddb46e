// Rendered output written to disk is the exact bytes that were rendered
use dmmf_core::{generate_from_reader, generate_with_options, GenerateOptions, OutputFormat};
use std::fs::{self, File};
use std::io::{BufWriter, Write};

const SCHEMA: &str = "/// 承認日時の履歴 🦀\nmodel Approval {\n  /// 承認者\n  approver String\n  /// 承認日時\n  approvedAt DateTime @default(now())\n}\n";

#[test]
fn test_write_json_file_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dmmf.json");

    let options = GenerateOptions::new("schema.prisma").with_write_chunk_size(7);
    let result = generate_with_options(SCHEMA, options).unwrap();
    let mut writer = BufWriter::new(File::create(&path).unwrap());
    let written = result.write_to(&mut writer).unwrap();
    writer.flush().unwrap();
    drop(writer);

    let on_disk = fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), written);
    assert_eq!(on_disk, result.to_json().unwrap().into_bytes());
    let text = String::from_utf8(on_disk).unwrap();
    assert!(text.contains("承認日時の履歴 🦀"));
}

#[test]
fn test_schema_file_to_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.prisma");
    let output_path = dir.path().join("dmmf.yaml");
    fs::write(&schema_path, SCHEMA).unwrap();

    let options = GenerateOptions::new("schema.prisma")
        .with_output(OutputFormat::Yaml)
        .with_read_chunk_size(5);
    let result = generate_from_reader(File::open(&schema_path).unwrap(), options).unwrap();
    let mut file = File::create(&output_path).unwrap();
    result.write_to(&mut file).unwrap();

    let yaml = fs::read_to_string(&output_path).unwrap();
    assert_eq!(yaml, result.to_yaml().unwrap());
    assert!(yaml.contains("承認者"), "{yaml}");
}
