//! Tokenizer for the declaration grammar.
//!
//! The lexer produces a flat token stream and a side list of comments.
//! Like the reference grammar, statement terminators are implicit: a
//! semicolon is inserted at the end of a line whose last token is an
//! identifier, a literal, one of the keywords `break`, `continue`,
//! `fallthrough`, `return`, or one of `++ -- ) ] }`.

use crate::error::{Error, Result};
use std::path::Path;

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// Integer, float or imaginary literal
    Number,
    /// Interpreted or raw string literal
    String,
    /// Rune literal
    Char,
    /// Operator or punctuation
    Op,
    /// Explicit `;` or one inserted at a line end
    Semi,
}

/// A single token borrowed from the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token category
    pub kind: TokenKind,
    /// Source text (`"\n"` for inserted semicolons)
    pub text: &'a str,
    /// 1-based line on which the token starts
    pub line: usize,
}

impl Token<'_> {
    /// True if this is the operator `op`
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    /// True if this is the identifier or keyword `word`
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    /// True for identifiers that are not reserved words
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Ident && !is_keyword(self.text)
    }
}

/// A comment and the line it starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment<'a> {
    /// Comment text including the `//` or `/*` markers
    pub text: &'a str,
    /// 1-based starting line
    pub line: usize,
}

/// Output of [`tokenize`]
#[derive(Debug, Default)]
pub struct Lexed<'a> {
    /// Tokens in source order
    pub tokens: Vec<Token<'a>>,
    /// Comments in source order
    pub comments: Vec<Comment<'a>>,
}

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Returns true if `word` is a reserved word
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

// Longest operators first so that greedy matching works.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ".", ":", "~",
];

/// Split `src` into tokens and comments.
///
/// `path` is only used for error messages. A leading byte order mark is
/// ignored.
pub fn tokenize<'a>(path: &Path, src: &'a str) -> Result<Lexed<'a>> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    Lexer::new(path, src).run()
}

struct Lexer<'a, 'p> {
    path: &'p Path,
    src: &'a str,
    pos: usize,
    line: usize,
    out: Lexed<'a>,
}

impl<'a, 'p> Lexer<'a, 'p> {
    fn new(path: &'p Path, src: &'a str) -> Self {
        Self {
            path,
            src,
            pos: 0,
            line: 1,
            out: Lexed::default(),
        }
    }

    fn error(&self, details: impl Into<String>) -> Error {
        Error::lex(self.path, self.line, details)
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize) {
        self.out.tokens.push(Token {
            kind,
            text: &self.src[start..self.pos],
            line,
        });
    }

    /// Whether a line break after the last token terminates a statement
    fn wants_semi(&self) -> bool {
        let Some(last) = self.out.tokens.last() else {
            return false;
        };
        match last.kind {
            TokenKind::Number | TokenKind::String | TokenKind::Char => true,
            TokenKind::Ident => {
                !is_keyword(last.text)
                    || matches!(last.text, "break" | "continue" | "fallthrough" | "return")
            }
            TokenKind::Op => matches!(last.text, "++" | "--" | ")" | "]" | "}"),
            TokenKind::Semi => false,
        }
    }

    fn insert_semi(&mut self, line: usize) {
        if self.wants_semi() {
            self.out.tokens.push(Token {
                kind: TokenKind::Semi,
                text: "\n",
                line,
            });
        }
    }

    fn run(mut self) -> Result<Lexed<'a>> {
        while let Some(c) = self.peek_char() {
            let start = self.pos;
            let line = self.line;
            match c {
                '\n' => {
                    self.insert_semi(line);
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_char_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_char_at(1) == Some('*') => self.block_comment()?,
                ';' => {
                    self.bump();
                    self.push(TokenKind::Semi, start, line);
                }
                '"' => {
                    self.quoted('"', "string literal not terminated")?;
                    self.push(TokenKind::String, start, line);
                }
                '\'' => {
                    self.quoted('\'', "rune literal not terminated")?;
                    self.push(TokenKind::Char, start, line);
                }
                '`' => {
                    self.raw_string()?;
                    self.push(TokenKind::String, start, line);
                }
                c if c.is_ascii_digit() => {
                    self.number();
                    self.push(TokenKind::Number, start, line);
                }
                '.' if self.peek_char_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    self.number();
                    self.push(TokenKind::Number, start, line);
                }
                c if c == '_' || c.is_alphabetic() => {
                    while self
                        .peek_char()
                        .is_some_and(|c| c == '_' || c.is_alphanumeric())
                    {
                        self.bump();
                    }
                    self.push(TokenKind::Ident, start, line);
                }
                _ => {
                    let rest = &self.src[self.pos..];
                    let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
                        return Err(self.error(format!("invalid character {:?}", c)));
                    };
                    self.pos += op.len();
                    self.push(TokenKind::Op, start, line);
                }
            }
        }
        let line = self.line;
        self.insert_semi(line);
        Ok(self.out)
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        let line = self.line;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.bump();
        }
        self.out.comments.push(Comment {
            text: &self.src[start..self.pos],
            line,
        });
    }

    fn block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        let line = self.line;
        self.pos += 2;
        let Some(end) = self.src[self.pos..].find("*/") else {
            return Err(self.error("comment not terminated"));
        };
        let body = &self.src[self.pos..self.pos + end];
        let newlines = body.matches('\n').count();
        self.pos += end + 2;
        self.out.comments.push(Comment {
            text: &self.src[start..self.pos],
            line,
        });
        // A comment spanning lines acts like a newline.
        if newlines > 0 {
            self.insert_semi(line);
            self.line += newlines;
        }
        Ok(())
    }

    fn quoted(&mut self, quote: char, unterminated: &str) -> Result<()> {
        self.bump();
        loop {
            match self.peek_char() {
                None | Some('\n') => return Err(self.error(unterminated)),
                Some('\\') => {
                    self.bump();
                    if self.bump().is_none() {
                        return Err(self.error(unterminated));
                    }
                }
                Some(c) => {
                    self.bump();
                    if c == quote {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn raw_string(&mut self) -> Result<()> {
        let line = self.line;
        self.bump();
        loop {
            match self.bump() {
                None => {
                    return Err(Error::lex(
                        self.path,
                        line,
                        "raw string literal not terminated",
                    ))
                }
                Some('`') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn number(&mut self) {
        let mut prev = '\0';
        while let Some(c) = self.peek_char() {
            let exponent_sign = (c == '+' || c == '-') && matches!(prev, 'e' | 'E' | 'p' | 'P');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                prev = c;
                self.bump();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str) -> Vec<String> {
        tokenize(Path::new("test.go"), src)
            .unwrap()
            .tokens
            .iter()
            .map(|t| match t.kind {
                TokenKind::Semi => ";".to_string(),
                _ => t.text.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(
            texts("package market\n\ntype Foo struct{}\n"),
            vec!["package", "market", ";", "type", "Foo", "struct", "{", "}", ";"]
        );
        // No semicolon after an operator or a non-terminating keyword.
        assert_eq!(
            texts("var x = 1 +\n2"),
            vec!["var", "x", "=", "1", "+", "2", ";"]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            texts("a <-chan b ... c &^= d"),
            vec!["a", "<-", "chan", "b", "...", "c", "&^=", "d", ";"]
        );
    }

    #[test]
    fn test_literals() {
        let lexed = tokenize(
            Path::new("t.go"),
            "x := \"a\\\"b\" + `raw\nstring` + 'c' + 1.5e-3",
        )
        .unwrap();
        let kinds: Vec<_> = lexed.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Op,
                TokenKind::String,
                TokenKind::Op,
                TokenKind::String,
                TokenKind::Op,
                TokenKind::Char,
                TokenKind::Op,
                TokenKind::Number,
                TokenKind::Semi,
            ]
        );
        assert_eq!(lexed.tokens[8].text, "1.5e-3");
        assert_eq!(lexed.tokens[8].line, 2);
    }

    #[test]
    fn test_comments_are_collected() {
        let lexed = tokenize(
            Path::new("t.go"),
            "// header\nFoo() error //perm:read\n/* a\nb */ x",
        )
        .unwrap();
        assert_eq!(lexed.comments.len(), 3);
        assert_eq!(lexed.comments[1].text, "//perm:read");
        assert_eq!(lexed.comments[1].line, 2);
        assert_eq!(lexed.tokens.last().unwrap().line, 4);
    }

    #[test]
    fn test_unterminated_literals() {
        let err = tokenize(Path::new("bad.go"), "var s = \"oops\n").unwrap_err();
        assert!(err.to_string().contains("bad.go:1"));
        assert!(tokenize(Path::new("bad.go"), "x := `never closed").is_err());
        assert!(tokenize(Path::new("bad.go"), "/* open").is_err());
    }

    #[test]
    fn test_leading_byte_order_mark() {
        assert_eq!(texts("\u{feff}package p\n"), vec!["package", "p", ";"]);
        // Only at the very start of the file.
        assert!(tokenize(Path::new("bom.go"), "package p\n\u{feff}").is_err());
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize(Path::new("bad.go"), "package p\n@").unwrap_err();
        assert!(err.to_string().contains("bad.go:2"));
    }
}
