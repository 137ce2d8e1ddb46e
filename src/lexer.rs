use crate::source::{SourceText, Span};

/// Represents the different kinds of tokens that the lexer can produce.
/// Tokens never carry decoded text; the parser decodes a token's span when it consumes it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input file.
    Eof,
    /// Represents a sequence of one or more whitespace characters (spaces, tabs, newlines).
    Whitespace,
    /// A line comment starting with `//`, up to (not including) the line break.
    Comment,
    /// A documentation comment starting with `///`, up to (not including) the line break.
    DocComment,
    /// A `/* ... */` comment.
    BlockComment,
    /// Represents a token that could not be recognized by the lexer,
    /// including unterminated strings and block comments.
    Unknown,

    // == Literals ==
    /// A name: model, field, type, attribute or constant.
    Identifier,
    /// A double-quoted string literal. The span includes both quotes.
    String,
    /// An integer or decimal number literal, optionally negative.
    Number,

    // == Keywords ==
    Model,
    View,
    Type,
    Enum,
    Datasource,
    Generator,
    True,
    False,

    // == Punctuation & Operators ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Comma: `,`
    Comma,
    /// Colon: `:` (named attribute arguments)
    Colon,
    /// Equals: `=` (datasource and generator properties)
    Equals,
    /// Question mark: `?` (optional fields)
    Question,
    /// Dot: `.` (namespaced attributes such as `@db.VarChar`)
    Dot,
    /// At sign: `@` (field attributes)
    At,
    /// Double at sign: `@@` (block attributes)
    DoubleAt,
}

impl TokenType {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenType::Whitespace | TokenType::Comment | TokenType::BlockComment
        )
    }

    /// Keywords are only reserved at the start of a declaration and may be used as names elsewhere.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenType::Model
                | TokenType::View
                | TokenType::Type
                | TokenType::Enum
                | TokenType::Datasource
                | TokenType::Generator
                | TokenType::True
                | TokenType::False
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            TokenType::Eof => "end of file",
            TokenType::Whitespace => "whitespace",
            TokenType::Comment => "a comment",
            TokenType::DocComment => "a documentation comment",
            TokenType::BlockComment => "a block comment",
            TokenType::Unknown => "an unrecognized token",
            TokenType::Identifier => "an identifier",
            TokenType::String => "a string",
            TokenType::Number => "a number",
            TokenType::Model => "'model'",
            TokenType::View => "'view'",
            TokenType::Type => "'type'",
            TokenType::Enum => "'enum'",
            TokenType::Datasource => "'datasource'",
            TokenType::Generator => "'generator'",
            TokenType::True => "'true'",
            TokenType::False => "'false'",
            TokenType::LBrace => "'{'",
            TokenType::RBrace => "'}'",
            TokenType::LBracket => "'['",
            TokenType::RBracket => "']'",
            TokenType::LParen => "'('",
            TokenType::RParen => "')'",
            TokenType::Comma => "','",
            TokenType::Colon => "':'",
            TokenType::Equals => "'='",
            TokenType::Question => "'?'",
            TokenType::Dot => "'.'",
            TokenType::At => "'@'",
            TokenType::DoubleAt => "'@@'",
        }
    }
}

/// A token with its type and the span of source text it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub ttype: TokenType,
    pub span: Span,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            span: Span::new(pos_start, pos_end),
        }
    }
}

/// Converts a validated source into tokens, one at a time.
///
/// The lexer walks whole `char`s, so every span it records starts and ends on a
/// scalar value boundary. It is finite: after yielding `Eof` once, iteration ends.
/// To start over, construct a new lexer.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a SourceText) -> Self {
        let input = source.as_str();
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            finished: false,
        }
    }

    /// Collects every token, including trivia, up to and including `Eof`.
    pub fn lex(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }

    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;

        let ttype = if let Some(char) = self.advance() {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                '[' => TokenType::LBracket,
                ']' => TokenType::RBracket,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                ',' => TokenType::Comma,
                ':' => TokenType::Colon,
                '=' => TokenType::Equals,
                '?' => TokenType::Question,
                '.' => TokenType::Dot,
                '@' => {
                    if self.peek() == Some(&'@') {
                        self.advance();
                        TokenType::DoubleAt
                    } else {
                        TokenType::At
                    }
                }
                '/' => match self.peek() {
                    Some('/') => self.read_comment(),
                    Some('*') => self.read_block_comment(),
                    _ => TokenType::Unknown,
                },
                '"' => self.read_string(),
                c if c.is_whitespace() => self.read_whitespace(),
                c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(start_pos),
                c if c.is_ascii_digit()
                    || (c == '-' && self.peek().is_some_and(|c| c.is_ascii_digit())) =>
                {
                    self.read_number()
                }

                _ => TokenType::Unknown,
            }
        } else {
            TokenType::Eof
        };

        Token::new(ttype, start_pos, self.position)
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_comment(&mut self) -> TokenType {
        self.advance(); // Consume the second '/'
        let is_doc = self.peek() == Some(&'/');
        while let Some(c) = self.peek() {
            if *c == '\n' || *c == '\r' {
                break;
            }
            self.advance();
        }
        if is_doc {
            TokenType::DocComment
        } else {
            TokenType::Comment
        }
    }

    fn read_block_comment(&mut self) -> TokenType {
        self.advance(); // Consume the '*'
        while let Some(c) = self.advance() {
            if c == '*' && self.peek() == Some(&'/') {
                self.advance();
                return TokenType::BlockComment;
            }
        }
        TokenType::Unknown // Unclosed block comment
    }

    fn read_string(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            match *c {
                '"' => {
                    self.advance(); // Consume the closing quote
                    return TokenType::String;
                }
                '\n' => return TokenType::Unknown, // Strings do not span lines
                '\\' => {
                    self.advance(); // Consume the backslash
                    if self.advance().is_none() {
                        return TokenType::Unknown; // Unclosed escape sequence
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        TokenType::Unknown // Unclosed string
    }

    fn read_identifier(&mut self, start_pos: usize) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || *c == '_' || *c == '-' {
                self.advance();
            } else {
                break;
            }
        }

        match &self.input[start_pos..self.position] {
            "model" => TokenType::Model,
            "view" => TokenType::View,
            "type" => TokenType::Type,
            "enum" => TokenType::Enum,
            "datasource" => TokenType::Datasource,
            "generator" => TokenType::Generator,
            "true" => TokenType::True,
            "false" => TokenType::False,
            _ => TokenType::Identifier,
        }
    }

    fn read_number(&mut self) -> TokenType {
        let mut has_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if *c == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Number
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.ttype == TokenType::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
