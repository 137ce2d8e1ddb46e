//! The Data Model Meta Format (DMMF) document and the builder that derives it from a schema.
//!
//! The builder is a pure function of the AST: it walks declarations in source order,
//! keeps every collection in a `Vec`, and resolves type names through ordered sets,
//! so the same schema always yields an identical document. Attributes are read as
//! written; relations and references are not validated.

use crate::ast::{self, Attribute, Declaration, Expression, FieldArity, FieldType, Schema};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const SCALAR_TYPES: [&str; 9] = [
    "String", "Boolean", "Int", "BigInt", "Float", "Decimal", "DateTime", "Json", "Bytes",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmmfDocument {
    pub datamodel: Datamodel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datamodel {
    pub models: Vec<Model>,
    pub enums: Vec<Enum>,
    /// Composite types.
    pub types: Vec<Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    pub db_name: Option<String>,
    pub fields: Vec<Field>,
    pub primary_key: Option<PrimaryKey>,
    pub unique_fields: Vec<Vec<String>>,
    pub unique_indexes: Vec<UniqueIndex>,
    pub is_generated: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueIndex {
    pub name: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Scalar,
    Object,
    Enum,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub is_list: bool,
    pub is_required: bool,
    pub is_unique: bool,
    pub is_id: bool,
    pub is_read_only: bool,
    pub has_default_value: bool,
    #[serde(rename = "type")]
    pub field_type: String,
    pub db_name: Option<String>,
    pub default: Option<DefaultValue>,
    pub relation_name: Option<String>,
    pub relation_from_fields: Vec<String>,
    pub relation_to_fields: Vec<String>,
    pub relation_on_delete: Option<String>,
    pub is_generated: bool,
    pub is_updated_at: bool,
    pub documentation: Option<String>,
}

/// The value of `@default(...)`: a literal, a list, or a function such as `now()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Function {
        name: String,
        args: Vec<DefaultValue>,
    },
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    List(Vec<DefaultValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub db_name: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub db_name: Option<String>,
    pub documentation: Option<String>,
}

/// Walks a parsed schema and produces its `DmmfDocument`.
pub struct DmmfBuilder<'a> {
    schema: &'a Schema,
    enum_names: BTreeSet<&'a str>,
    object_names: BTreeSet<&'a str>,
}

impl<'a> DmmfBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        let mut enum_names = BTreeSet::new();
        let mut object_names = BTreeSet::new();
        for declaration in &schema.declarations {
            match declaration {
                Declaration::Enum(e) => {
                    enum_names.insert(e.name.name.as_str());
                }
                Declaration::Model(m) | Declaration::View(m) | Declaration::CompositeType(m) => {
                    object_names.insert(m.name.name.as_str());
                }
                Declaration::Datasource(_) | Declaration::Generator(_) => {}
            }
        }
        Self {
            schema,
            enum_names,
            object_names,
        }
    }

    pub fn build(&self) -> DmmfDocument {
        let mut models = Vec::new();
        let mut enums = Vec::new();
        let mut types = Vec::new();

        for declaration in &self.schema.declarations {
            match declaration {
                Declaration::Model(m) | Declaration::View(m) => models.push(self.build_model(m)),
                Declaration::CompositeType(m) => types.push(self.build_model(m)),
                Declaration::Enum(e) => enums.push(build_enum(e)),
                Declaration::Datasource(_) | Declaration::Generator(_) => {}
            }
        }

        debug!(
            "built DMMF with {} models, {} enums, {} composite types",
            models.len(),
            enums.len(),
            types.len()
        );
        DmmfDocument {
            datamodel: Datamodel {
                models,
                enums,
                types,
            },
        }
    }

    fn build_model(&self, model: &ast::Model) -> Model {
        // Scalar fields referenced by `@relation(fields: [...])` are written through the relation.
        let foreign_keys: BTreeSet<String> = model
            .fields
            .iter()
            .filter_map(|f| find_attribute(&f.attributes, "relation"))
            .filter_map(|relation| relation.argument("fields"))
            .flat_map(Expression::as_name_list)
            .collect();

        let fields = model
            .fields
            .iter()
            .map(|f| self.build_field(f, foreign_keys.contains(&f.name.name)))
            .collect();

        let primary_key = find_attribute(&model.attributes, "id").map(|id| PrimaryKey {
            name: string_argument(id, "name"),
            fields: field_list(id),
        });

        let unique_indexes: Vec<UniqueIndex> = model
            .attributes
            .iter()
            .filter(|a| a.name == "unique")
            .map(|unique| UniqueIndex {
                name: string_argument(unique, "name"),
                fields: field_list(unique),
            })
            .collect();

        Model {
            name: model.name.name.clone(),
            db_name: find_attribute(&model.attributes, "map").and_then(map_target),
            fields,
            primary_key,
            unique_fields: unique_indexes.iter().map(|u| u.fields.clone()).collect(),
            unique_indexes,
            is_generated: false,
            documentation: doc_text(&model.documentation),
        }
    }

    fn build_field(&self, field: &ast::Field, is_foreign_key: bool) -> Field {
        let attrs = &field.attributes;
        let relation = find_attribute(attrs, "relation");
        let default = find_attribute(attrs, "default")
            .and_then(Attribute::first_positional)
            .map(default_value);

        Field {
            name: field.name.name.clone(),
            kind: self.kind_of(&field.field_type),
            is_list: field.arity == FieldArity::List,
            is_required: field.arity != FieldArity::Optional,
            is_unique: find_attribute(attrs, "unique").is_some(),
            is_id: find_attribute(attrs, "id").is_some(),
            is_read_only: is_foreign_key,
            has_default_value: default.is_some(),
            field_type: field.field_type.name().to_string(),
            db_name: find_attribute(attrs, "map").and_then(map_target),
            default,
            relation_name: relation.and_then(|r| string_argument(r, "name")),
            relation_from_fields: relation
                .and_then(|r| r.argument("fields"))
                .map(Expression::as_name_list)
                .unwrap_or_default(),
            relation_to_fields: relation
                .and_then(|r| r.argument("references"))
                .map(Expression::as_name_list)
                .unwrap_or_default(),
            relation_on_delete: relation
                .and_then(|r| r.argument("onDelete"))
                .and_then(Expression::as_str)
                .map(str::to_string),
            is_generated: false,
            is_updated_at: find_attribute(attrs, "updatedAt").is_some(),
            documentation: doc_text(&field.documentation),
        }
    }

    fn kind_of(&self, field_type: &FieldType) -> FieldKind {
        match field_type {
            FieldType::Unsupported(..) => FieldKind::Unsupported,
            FieldType::Named(ident) => {
                let name = ident.name.as_str();
                if SCALAR_TYPES.contains(&name) {
                    FieldKind::Scalar
                } else if self.enum_names.contains(name) {
                    FieldKind::Enum
                } else {
                    if !self.object_names.contains(name) {
                        debug!("type `{name}` is not declared in this schema; treating it as an object");
                    }
                    FieldKind::Object
                }
            }
        }
    }
}

/// Builds the DMMF document for `schema`.
pub fn build_dmmf(schema: &Schema) -> DmmfDocument {
    DmmfBuilder::new(schema).build()
}

fn build_enum(enm: &ast::Enum) -> Enum {
    Enum {
        name: enm.name.name.clone(),
        values: enm
            .values
            .iter()
            .map(|v| EnumValue {
                name: v.name.name.clone(),
                db_name: find_attribute(&v.attributes, "map").and_then(map_target),
                documentation: doc_text(&v.documentation),
            })
            .collect(),
        db_name: find_attribute(&enm.attributes, "map").and_then(map_target),
        documentation: doc_text(&enm.documentation),
    }
}

fn doc_text(doc: &Option<ast::DocComment>) -> Option<String> {
    doc.as_ref().map(|d| d.text.clone())
}

fn find_attribute<'s>(attributes: &'s [Attribute], name: &str) -> Option<&'s Attribute> {
    attributes.iter().find(|a| a.name == name)
}

/// `@map("x")` and `@@map(name: "x")`.
fn map_target(attribute: &Attribute) -> Option<String> {
    attribute
        .first_positional()
        .or_else(|| attribute.argument("name"))
        .and_then(string_expression)
}

/// A named string argument; for `name` a leading positional string also counts.
fn string_argument(attribute: &Attribute, name: &str) -> Option<String> {
    let named = attribute.argument(name).and_then(string_expression);
    if named.is_some() || name != "name" {
        return named;
    }
    attribute.first_positional().and_then(string_expression)
}

fn string_expression(expression: &Expression) -> Option<String> {
    match expression {
        Expression::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// The field names of `@@id([...])` / `@@unique([...])`, positional or as `fields:`.
fn field_list(attribute: &Attribute) -> Vec<String> {
    attribute
        .argument("fields")
        .or_else(|| {
            attribute
                .first_positional()
                .filter(|e| matches!(e, Expression::Array(_)))
        })
        .map(Expression::as_name_list)
        .unwrap_or_default()
}

fn default_value(expression: &Expression) -> DefaultValue {
    match expression {
        Expression::String(s) | Expression::Constant(s) => DefaultValue::String(s.clone()),
        Expression::Number(text) => match text.parse::<serde_json::Number>() {
            Ok(number) => DefaultValue::Number(number),
            Err(_) => DefaultValue::String(text.clone()),
        },
        Expression::Boolean(b) => DefaultValue::Boolean(*b),
        Expression::Array(items) => DefaultValue::List(items.iter().map(default_value).collect()),
        Expression::Function(name, args) => DefaultValue::Function {
            name: name.clone(),
            args: args.iter().map(|a| default_value(&a.value)).collect(),
        },
    }
}
