use crate::source::Span;

/// Documentation collected from `///` lines, decoded once and owned by its element.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DocComment {
    pub text: String,
    /// Covers every source line the text was built from.
    pub span: Span,
    pub line_count: usize,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Schema {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Declaration {
    Model(Model),
    View(Model),
    /// A `type` block: a composite type embedded in documents.
    CompositeType(Model),
    Enum(Enum),
    Datasource(ConfigBlock),
    Generator(ConfigBlock),
}

/// The body shared by `model`, `view` and `type` blocks.
#[derive(Debug, PartialEq, Clone)]
pub struct Model {
    pub name: Identifier,
    pub fields: Vec<Field>,
    /// Block attributes (`@@...`) in source order.
    pub attributes: Vec<Attribute>,
    pub documentation: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Field {
    pub name: Identifier,
    pub field_type: FieldType,
    pub arity: FieldArity,
    pub attributes: Vec<Attribute>,
    pub documentation: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FieldType {
    Named(Identifier),
    /// `Unsupported("...")`; holds the database type string.
    Unsupported(String, Span),
}

impl FieldType {
    pub fn name(&self) -> &str {
        match self {
            FieldType::Named(ident) => &ident.name,
            FieldType::Unsupported(db_type, _) => db_type,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldArity {
    Required,
    Optional,
    List,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Enum {
    pub name: Identifier,
    pub values: Vec<EnumValue>,
    pub attributes: Vec<Attribute>,
    pub documentation: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct EnumValue {
    pub name: Identifier,
    pub attributes: Vec<Attribute>,
    pub documentation: Option<DocComment>,
    pub span: Span,
}

/// A `datasource` or `generator` block.
#[derive(Debug, PartialEq, Clone)]
pub struct ConfigBlock {
    pub name: Identifier,
    pub properties: Vec<ConfigProperty>,
    pub documentation: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ConfigProperty {
    pub name: Identifier,
    pub value: Expression,
    pub documentation: Option<DocComment>,
    pub span: Span,
}

/// `@name(args)` or `@@name(args)`. Namespaced names such as `db.VarChar` keep their dots.
#[derive(Debug, PartialEq, Clone)]
pub struct Attribute {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

impl Attribute {
    /// The argument passed as `name: value`.
    pub fn argument(&self, name: &str) -> Option<&Expression> {
        self.arguments
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| &arg.value)
    }

    pub fn first_positional(&self) -> Option<&Expression> {
        self.arguments
            .iter()
            .find(|arg| arg.name.is_none())
            .map(|arg| &arg.value)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    String(String),
    /// Kept as written so no precision is lost before serialization.
    Number(String),
    Boolean(bool),
    /// A bare name such as `Cascade` or a field reference.
    Constant(String),
    Function(String, Vec<Argument>),
    Array(Vec<Expression>),
}

impl Expression {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expression::String(s) | Expression::Constant(s) => Some(s),
            _ => None,
        }
    }

    /// Names listed in an array of constants, e.g. `[id, email]`.
    pub fn as_name_list(&self) -> Vec<String> {
        match self {
            Expression::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Expression::Constant(name) => Some(name.clone()),
                    // `@@index([title(ops: raw("..."))])` style entries
                    Expression::Function(name, _) => Some(name.clone()),
                    _ => None,
                })
                .collect(),
            Expression::Constant(name) => vec![name.clone()],
            _ => Vec::new(),
        }
    }
}

/// A borrowed view of one documented (or attributed) element of the schema.
#[derive(Debug, Clone, Copy)]
pub enum SchemaElement<'a> {
    Model(&'a Model),
    Field(&'a Field),
    Enum(&'a Enum),
    EnumValue(&'a EnumValue),
    Attribute(&'a Attribute),
}

impl<'a> SchemaElement<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            SchemaElement::Model(m) => &m.name.name,
            SchemaElement::Field(f) => &f.name.name,
            SchemaElement::Enum(e) => &e.name.name,
            SchemaElement::EnumValue(v) => &v.name.name,
            SchemaElement::Attribute(a) => &a.name,
        }
    }

    pub fn documentation(&self) -> Option<&'a str> {
        let doc = match self {
            SchemaElement::Model(m) => m.documentation.as_ref(),
            SchemaElement::Field(f) => f.documentation.as_ref(),
            SchemaElement::Enum(e) => e.documentation.as_ref(),
            SchemaElement::EnumValue(v) => v.documentation.as_ref(),
            SchemaElement::Attribute(_) => None,
        };
        doc.map(|d| d.text.as_str())
    }

    pub fn span(&self) -> Span {
        match self {
            SchemaElement::Model(m) => m.span,
            SchemaElement::Field(f) => f.span,
            SchemaElement::Enum(e) => e.span,
            SchemaElement::EnumValue(v) => v.span,
            SchemaElement::Attribute(a) => a.span,
        }
    }
}

impl Schema {
    /// Every model-like block, enum, and their children, in source pre-order.
    /// Field attributes follow their field; block attributes close their block.
    pub fn elements(&self) -> Vec<SchemaElement<'_>> {
        let mut out = Vec::new();
        for declaration in &self.declarations {
            match declaration {
                Declaration::Model(model)
                | Declaration::View(model)
                | Declaration::CompositeType(model) => {
                    out.push(SchemaElement::Model(model));
                    for field in &model.fields {
                        out.push(SchemaElement::Field(field));
                        out.extend(field.attributes.iter().map(SchemaElement::Attribute));
                    }
                    out.extend(model.attributes.iter().map(SchemaElement::Attribute));
                }
                Declaration::Enum(enm) => {
                    out.push(SchemaElement::Enum(enm));
                    for value in &enm.values {
                        out.push(SchemaElement::EnumValue(value));
                        out.extend(value.attributes.iter().map(SchemaElement::Attribute));
                    }
                    out.extend(enm.attributes.iter().map(SchemaElement::Attribute));
                }
                Declaration::Datasource(_) | Declaration::Generator(_) => {}
            }
        }
        out
    }
}
