//! Tokenizer for Cell program text.
//!
//! Produces one [`Spanned`] token per call to [`Lexer::next_token`] until
//! [`Token::Eof`]. `;` and newlines both become [`Token::StmtEnd`]; `#` starts
//! a comment running to the end of the line.

use std::fmt;

use crate::error::{CellError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Function,
    Return,

    // Word operators (string comparison)
    StrEq,
    StrNe,
    StrLt,
    StrLe,
    StrGt,
    StrGe,

    // Assignment family
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    ConcatAssign,

    // Numeric comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    And,
    Or,
    Not,
    Match,
    NotMatch,
    Incr,
    Decr,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    Dot,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,

    StmtEnd,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Number(n) => return write!(f, "number {}", crate::value::format_number(*n)),
            Token::Str(s) => return write!(f, "string {:?}", s),
            Token::Ident(name) => return write!(f, "identifier '{}'", name),
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::Do => "do",
            Token::For => "for",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Function => "function",
            Token::Return => "return",
            Token::StrEq => "eq",
            Token::StrNe => "ne",
            Token::StrLt => "lt",
            Token::StrLe => "le",
            Token::StrGt => "gt",
            Token::StrGe => "ge",
            Token::Assign => "=",
            Token::AddAssign => "+=",
            Token::SubAssign => "-=",
            Token::MulAssign => "*=",
            Token::DivAssign => "/=",
            Token::ModAssign => "%=",
            Token::PowAssign => "**=",
            Token::ConcatAssign => ".=",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::And => "&&",
            Token::Or => "||",
            Token::Not => "!",
            Token::Match => "~",
            Token::NotMatch => "!~",
            Token::Incr => "++",
            Token::Decr => "--",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Pow => "**",
            Token::Dot => ".",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::StmtEnd => "end of statement",
            Token::Eof => "end of input",
        };
        write!(f, "'{}'", s)
    }
}

/// A token with the source line it started on (1-based).
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

fn keyword(ident: &str) -> Option<Token> {
    let token = match ident {
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "do" => Token::Do,
        "for" => Token::For,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "function" => Token::Function,
        "return" => Token::Return,
        "eq" => Token::StrEq,
        "ne" => Token::StrNe,
        "lt" => Token::StrLt,
        "le" => Token::StrLe,
        "gt" => Token::StrGt,
        "ge" => Token::StrGe,
        _ => return None,
    };
    Some(token)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '@' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Consume `c` if it is next.
    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, message: String) -> CellError {
        CellError::Lex {
            line: self.line,
            message,
        }
    }

    fn skip_blanks_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || (c == '\r' && self.peek_at(1) == Some('\n')) {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token. Returns [`Token::Eof`] forever once input is exhausted.
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_blanks_and_comments();
        let line = self.line;
        let Some(c) = self.bump() else {
            return Ok(Spanned {
                token: Token::Eof,
                line,
            });
        };

        let token = match c {
            ';' | '\n' => Token::StmtEnd,
            '\r' => {
                self.eat('\n');
                Token::StmtEnd
            }
            '0'..='9' => self.number(c)?,
            '"' | '\'' => self.string(c)?,
            c if is_ident_start(c) => self.ident(c),
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            '~' => Token::Match,
            '^' => Token::Pow,
            '+' => {
                if self.eat('=') {
                    Token::AddAssign
                } else if self.eat('+') {
                    Token::Incr
                } else {
                    Token::Plus
                }
            }
            '-' => {
                if self.eat('=') {
                    Token::SubAssign
                } else if self.eat('-') {
                    Token::Decr
                } else {
                    Token::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        Token::PowAssign
                    } else {
                        Token::Pow
                    }
                } else if self.eat('=') {
                    Token::MulAssign
                } else {
                    Token::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    Token::DivAssign
                } else {
                    Token::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    Token::ModAssign
                } else {
                    Token::Percent
                }
            }
            '.' => {
                if self.eat('=') {
                    Token::ConcatAssign
                } else {
                    Token::Dot
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else if self.eat('~') {
                    Token::NotMatch
                } else {
                    Token::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                if !self.eat('&') {
                    return Err(self.error("'&' is not an operator, did you mean '&&'?".into()));
                }
                Token::And
            }
            '|' => {
                if !self.eat('|') {
                    return Err(self.error("'|' is not an operator, did you mean '||'?".into()));
                }
                Token::Or
            }
            other => return Err(self.error(format!("unexpected character '{}'", other))),
        };

        Ok(Spanned { token, line })
    }

    fn number(&mut self, first: char) -> Result<Token> {
        let mut text = String::from(first);
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' {
                if seen_dot {
                    return Err(self.error(format!("invalid number '{}.'", text)));
                }
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("invalid number '{}'", text)))
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        let mut s = String::new();
        // An unterminated string runs to end of input.
        while let Some(c) = self.bump() {
            if c == quote {
                break;
            }
            if c != '\\' {
                s.push(c);
                continue;
            }
            let Some(escaped) = self.bump() else {
                break;
            };
            let decoded = match escaped {
                'a' => '\x07',
                'b' => '\x08',
                'f' => '\x0c',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                'v' => '\x0b',
                '\\' => '\\',
                '"' => '"',
                '\'' => '\'',
                other => {
                    return Err(self.error(format!("unknown escape sequence '\\{}'", other)));
                }
            };
            s.push(decoded);
        }
        Ok(Token::Str(s))
    }

    fn ident(&mut self, first: char) -> Token {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        keyword(&name).unwrap_or(Token::Ident(name))
    }
}

/// Tokenize a whole program, including the trailing [`Token::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Spanned>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let spanned = lexer.next_token()?;
        let done = spanned.token == Token::Eof;
        tokens.push(spanned);
        if done {
            return Ok(tokens);
        }
    }
}
