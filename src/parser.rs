use crate::ast::*;
use crate::docs::attach_docs;
use crate::error::{DmmfError, SyntaxError};
use crate::lexer::{Lexer, Token, TokenType};
use crate::source::{SourceText, Span};
use log::{debug, trace};

/// A recursive descent parser for Prisma-style schema files.
///
/// Tokens are pulled from the lexer on demand; the parser sees exactly one token of
/// lookahead and never backtracks. Parsing is all-or-nothing: the first error aborts
/// and no partial schema is returned.
pub struct Parser<'a> {
    source: &'a SourceText,
    lexer: Lexer<'a>,
    current: Token,
    previous_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a SourceText) -> Self {
        let mut lexer = Lexer::new(source);
        let current = next_significant(&mut lexer, source.len());
        Self {
            source,
            lexer,
            current,
            previous_end: 0,
        }
    }

    // === Main Parsing Methods ===

    /// Schema ::= { Docs? Declaration } EOF
    pub fn parse_schema(&mut self) -> Result<Schema, DmmfError> {
        let mut declarations = Vec::new();
        loop {
            let doc_spans = self.parse_doc_spans();
            let declaration = match self.current.ttype {
                TokenType::Eof => {
                    if !doc_spans.is_empty() {
                        trace!("dropping {} doc line(s) at end of file", doc_spans.len());
                    }
                    break;
                }
                TokenType::Model => Declaration::Model(self.parse_model_block(&doc_spans)?),
                TokenType::View => Declaration::View(self.parse_model_block(&doc_spans)?),
                TokenType::Type => {
                    Declaration::CompositeType(self.parse_model_block(&doc_spans)?)
                }
                TokenType::Enum => Declaration::Enum(self.parse_enum(&doc_spans)?),
                TokenType::Datasource => {
                    Declaration::Datasource(self.parse_config_block(&doc_spans)?)
                }
                TokenType::Generator => {
                    Declaration::Generator(self.parse_config_block(&doc_spans)?)
                }
                _ => {
                    return self.err_unexpected(
                        "a declaration (model, view, type, enum, datasource or generator)",
                    )
                }
            };
            declarations.push(declaration);
        }

        debug!(
            "parsed {} declarations from {}",
            declarations.len(),
            self.source.name()
        );
        Ok(Schema {
            declarations,
            span: self.source.full_span(),
        })
    }

    /// ModelBlock ::= ( "model" | "view" | "type" ) Identifier "{" { Docs? ( Field | BlockAttribute ) } "}"
    fn parse_model_block(&mut self, doc_spans: &[Span]) -> Result<Model, DmmfError> {
        let start = self.current.span;
        let documentation = self.attach(doc_spans)?;
        self.advance(); // Consume the keyword
        let name = self.parse_identifier("a block name")?;
        self.expect(TokenType::LBrace)?;

        let mut fields = Vec::new();
        let mut attributes = Vec::new();
        loop {
            let member_docs = self.parse_doc_spans();
            match self.current.ttype {
                TokenType::RBrace => break,
                TokenType::DoubleAt => attributes.push(self.parse_attribute()?),
                t if is_name(t) => fields.push(self.parse_field(member_docs)?),
                _ => return self.err_unexpected("a field, a block attribute or '}'"),
            }
        }
        let end = self.expect(TokenType::RBrace)?;

        Ok(Model {
            name,
            fields,
            attributes,
            documentation,
            span: start.to(end),
        })
    }

    /// Field ::= Identifier FieldType [ "?" | "[" "]" ] { FieldAttribute } [ TrailingDoc ]
    fn parse_field(&mut self, mut doc_spans: Vec<Span>) -> Result<Field, DmmfError> {
        let name = self.parse_identifier("a field name")?;
        if self.on_new_line() {
            return self.err_unexpected("a field type on the same line as the field name");
        }
        let field_type = self.parse_field_type()?;

        let arity = if self.match_token(TokenType::Question) {
            FieldArity::Optional
        } else if self.match_token(TokenType::LBracket) {
            self.expect(TokenType::RBracket)?;
            FieldArity::List
        } else {
            FieldArity::Required
        };

        let attributes = self.parse_field_attributes()?;
        let span = Span::new(name.span.start(), self.previous_end);
        if let Some(trailing) = self.parse_trailing_doc() {
            doc_spans.push(trailing);
        }

        Ok(Field {
            name,
            field_type,
            arity,
            attributes,
            documentation: self.attach(&doc_spans)?,
            span,
        })
    }

    /// FieldType ::= Identifier | "Unsupported" "(" String ")"
    fn parse_field_type(&mut self) -> Result<FieldType, DmmfError> {
        let ident = self.parse_identifier("a field type")?;
        if ident.name == "Unsupported" && self.match_token(TokenType::LParen) {
            let db_type = self.parse_string_literal()?;
            let end = self.expect(TokenType::RParen)?;
            return Ok(FieldType::Unsupported(db_type, ident.span.to(end)));
        }
        Ok(FieldType::Named(ident))
    }

    /// Enum ::= "enum" Identifier "{" { Docs? ( EnumValue | BlockAttribute ) } "}"
    fn parse_enum(&mut self, doc_spans: &[Span]) -> Result<Enum, DmmfError> {
        let start = self.current.span;
        let documentation = self.attach(doc_spans)?;
        self.expect(TokenType::Enum)?;
        let name = self.parse_identifier("an enum name")?;
        self.expect(TokenType::LBrace)?;

        let mut values = Vec::new();
        let mut attributes = Vec::new();
        loop {
            let mut value_docs = self.parse_doc_spans();
            match self.current.ttype {
                TokenType::RBrace => break,
                TokenType::DoubleAt => attributes.push(self.parse_attribute()?),
                t if is_name(t) => {
                    // EnumValue ::= Identifier { FieldAttribute } [ TrailingDoc ]
                    let value_name = self.parse_identifier("an enum value")?;
                    let value_attributes = self.parse_field_attributes()?;
                    let span = Span::new(value_name.span.start(), self.previous_end);
                    if let Some(trailing) = self.parse_trailing_doc() {
                        value_docs.push(trailing);
                    }
                    values.push(EnumValue {
                        name: value_name,
                        attributes: value_attributes,
                        documentation: self.attach(&value_docs)?,
                        span,
                    });
                }
                _ => return self.err_unexpected("an enum value, a block attribute or '}'"),
            }
        }
        let end = self.expect(TokenType::RBrace)?;

        Ok(Enum {
            name,
            values,
            attributes,
            documentation,
            span: start.to(end),
        })
    }

    /// ConfigBlock ::= ( "datasource" | "generator" ) Identifier "{" { Docs? Identifier "=" Expression } "}"
    fn parse_config_block(&mut self, doc_spans: &[Span]) -> Result<ConfigBlock, DmmfError> {
        let start = self.current.span;
        let documentation = self.attach(doc_spans)?;
        self.advance(); // Consume the keyword
        let name = self.parse_identifier("a block name")?;
        self.expect(TokenType::LBrace)?;

        let mut properties = Vec::new();
        loop {
            let property_docs = self.parse_doc_spans();
            if self.check(TokenType::RBrace) {
                break;
            }
            let key = self.parse_identifier("a property name or '}'")?;
            self.expect(TokenType::Equals)?;
            let value = self.parse_expression()?;
            let span = Span::new(key.span.start(), self.previous_end);
            properties.push(ConfigProperty {
                name: key,
                value,
                documentation: self.attach(&property_docs)?,
                span,
            });
        }
        let end = self.expect(TokenType::RBrace)?;

        Ok(ConfigBlock {
            name,
            properties,
            documentation,
            span: start.to(end),
        })
    }

    // === EBNF Sub-Rules ===

    /// Attributes must start on the same line as the element they decorate.
    fn parse_field_attributes(&mut self) -> Result<Vec<Attribute>, DmmfError> {
        let mut attributes = Vec::new();
        while self.check(TokenType::At) && !self.on_new_line() {
            attributes.push(self.parse_attribute()?);
        }
        Ok(attributes)
    }

    /// Attribute ::= ( "@" | "@@" ) Identifier { "." Identifier } [ ArgumentList ]
    fn parse_attribute(&mut self) -> Result<Attribute, DmmfError> {
        let start = self.current.span;
        self.advance(); // Consume '@' or '@@'
        let mut name = self.parse_identifier("an attribute name")?.name;
        while self.match_token(TokenType::Dot) {
            name.push('.');
            name.push_str(&self.parse_identifier("an identifier after '.'")?.name);
        }
        let arguments = if self.check(TokenType::LParen) {
            self.parse_argument_list()?
        } else {
            Vec::new()
        };
        Ok(Attribute {
            name,
            arguments,
            span: Span::new(start.start(), self.previous_end),
        })
    }

    /// ArgumentList ::= "(" [ Argument { "," Argument } [ "," ] ] ")"
    /// Argument ::= [ Identifier ":" ] Expression
    fn parse_argument_list(&mut self) -> Result<Vec<Argument>, DmmfError> {
        self.expect(TokenType::LParen)?;
        let mut arguments = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                arguments.push(self.parse_argument()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RParen) {
                    break; // Allow trailing comma
                }
            }
        }
        self.expect(TokenType::RParen)?;
        Ok(arguments)
    }

    fn parse_argument(&mut self) -> Result<Argument, DmmfError> {
        if !is_name(self.current.ttype) || self.check(TokenType::True) || self.check(TokenType::False)
        {
            return Ok(Argument {
                name: None,
                value: self.parse_expression()?,
            });
        }
        // A leading name is either the argument's name or the start of the value.
        let name = self.parse_identifier("an argument")?.name;
        if self.match_token(TokenType::Colon) {
            Ok(Argument {
                name: Some(name),
                value: self.parse_expression()?,
            })
        } else {
            Ok(Argument {
                name: None,
                value: self.parse_expression_after_name(name)?,
            })
        }
    }

    /// Expression ::= String | Number | "true" | "false" | Array | Identifier [ ArgumentList ]
    fn parse_expression(&mut self) -> Result<Expression, DmmfError> {
        match self.current.ttype {
            TokenType::String => Ok(Expression::String(self.parse_string_literal()?)),
            TokenType::Number => {
                let text = self.source.decode(self.current.span)?;
                self.advance();
                Ok(Expression::Number(text))
            }
            TokenType::True => {
                self.advance();
                Ok(Expression::Boolean(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Expression::Boolean(false))
            }
            TokenType::LBracket => self.parse_array(),
            t if is_name(t) => {
                let name = self.parse_identifier("a value")?.name;
                self.parse_expression_after_name(name)
            }
            _ => self.err_unexpected("a value"),
        }
    }

    fn parse_expression_after_name(&mut self, name: String) -> Result<Expression, DmmfError> {
        if self.check(TokenType::LParen) {
            let arguments = self.parse_argument_list()?;
            Ok(Expression::Function(name, arguments))
        } else {
            Ok(Expression::Constant(name))
        }
    }

    /// Array ::= "[" [ Expression { "," Expression } [ "," ] ] "]"
    fn parse_array(&mut self) -> Result<Expression, DmmfError> {
        self.expect(TokenType::LBracket)?;
        let mut items = Vec::new();
        if !self.check(TokenType::RBracket) {
            loop {
                items.push(self.parse_expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RBracket) {
                    break; // Allow trailing comma
                }
            }
        }
        self.expect(TokenType::RBracket)?;
        Ok(Expression::Array(items))
    }

    /// Decodes the whole literal once, then resolves escapes on the decoded text.
    fn parse_string_literal(&mut self) -> Result<String, DmmfError> {
        if !self.check(TokenType::String) {
            return self.err_unexpected("a string");
        }
        let raw = self.source.decode(self.current.span)?;
        let value = match unescape(&raw) {
            Ok(value) => value,
            Err(bad_escape) => {
                return self.err_at(
                    self.current.span,
                    "a valid escape sequence",
                    format!("`{bad_escape}`"),
                )
            }
        };
        self.advance();
        Ok(value)
    }

    fn parse_identifier(&mut self, expected: &str) -> Result<Identifier, DmmfError> {
        if !is_name(self.current.ttype) {
            return self.err_unexpected(expected);
        }
        let span = self.current.span;
        let name = self.source.decode(span)?;
        self.advance();
        Ok(Identifier { name, span })
    }

    // === Documentation Helpers ===

    /// Docs ::= { DocComment }
    fn parse_doc_spans(&mut self) -> Vec<Span> {
        let mut spans = Vec::new();
        while self.check(TokenType::DocComment) {
            spans.push(self.current.span);
            self.advance();
        }
        spans
    }

    /// A `///` comment on the same line as the element it follows.
    fn parse_trailing_doc(&mut self) -> Option<Span> {
        if self.check(TokenType::DocComment) && !self.on_new_line() {
            let span = self.current.span;
            self.advance();
            Some(span)
        } else {
            None
        }
    }

    fn attach(&self, doc_spans: &[Span]) -> Result<Option<DocComment>, DmmfError> {
        Ok(attach_docs(self.source, doc_spans)?)
    }

    // === Tokenizer Helper Methods ===

    fn advance(&mut self) {
        if self.current.ttype != TokenType::Eof {
            self.previous_end = self.current.span.end();
            self.current = next_significant(&mut self.lexer, self.source.len());
        }
    }

    /// Consumes a token of the given type and returns its span.
    fn expect(&mut self, expected: TokenType) -> Result<Span, DmmfError> {
        if self.current.ttype == expected {
            let span = self.current.span;
            self.advance();
            Ok(span)
        } else {
            self.err_unexpected(expected.describe())
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        self.current.ttype == ttype
    }

    /// Whether a line break separates the current token from the previous one.
    fn on_new_line(&self) -> bool {
        self.source
            .span(self.previous_end, self.current.span.start())
            .and_then(|gap| self.source.slice(gap))
            .is_some_and(|gap| gap.contains('\n'))
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, DmmfError> {
        let token = self.current;
        let found = match token.ttype {
            TokenType::Eof => token.ttype.describe().to_string(),
            ttype => {
                let text: String = self
                    .source
                    .slice(token.span)
                    .unwrap_or_default()
                    .chars()
                    .take(40)
                    .collect();
                format!("{} `{}`", ttype.describe(), text)
            }
        };
        self.err_at(token.span, expected, found)
    }

    fn err_at<T>(&self, span: Span, expected: &str, found: String) -> Result<T, DmmfError> {
        let (line, column) = self.source.line_and_column(span.start());
        Err(SyntaxError {
            position: span.start(),
            line,
            column,
            expected: expected.to_string(),
            found,
            src: self.source.to_named_source(),
            span: span.into(),
        }
        .into())
    }
}

/// Parses a whole source into a schema.
///
/// # Errors
/// Returns the first `SyntaxError` encountered.
pub fn parse_schema(source: &SourceText) -> Result<Schema, DmmfError> {
    Parser::new(source).parse_schema()
}

fn next_significant(lexer: &mut Lexer<'_>, eof_at: usize) -> Token {
    lexer
        .find(|token| !token.ttype.is_trivia())
        .unwrap_or_else(|| Token::new(TokenType::Eof, eof_at, eof_at))
}

fn is_name(ttype: TokenType) -> bool {
    ttype == TokenType::Identifier || ttype.is_keyword()
}

/// Resolves escapes in a quoted literal. On failure returns the offending escape text.
fn unescape(raw: &str) -> Result<String, String> {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => value.push('"'),
            Some('\\') => value.push('\\'),
            Some('/') => value.push('/'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('t') => value.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => value.push(ch),
                    None => return Err(format!("\\u{hex}")),
                }
            }
            Some(other) => return Err(format!("\\{other}")),
            None => return Err("\\".to_string()),
        }
    }
    Ok(value)
}
