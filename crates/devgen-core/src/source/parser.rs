//! Declaration-level parser.
//!
//! Only the top level of a file is interpreted. Function bodies, value
//! initialisers and type expressions that the generators do not inspect are
//! skipped by bracket matching; interface bodies are parsed in full because
//! the proxy generator needs their method sets.

use super::lexer::{tokenize, Comment, Token, TokenKind};
use super::{
    Decl, Field, FuncDecl, ImportSpec, InterfaceType, Method, SourceFile, TypeShape, TypeSpec,
    ValueKind, ValueSpec,
};
use crate::error::{Error, Result};
use std::path::Path;

/// Parse a single source file.
pub fn parse_file(path: &Path, src: &str) -> Result<SourceFile> {
    let lexed = tokenize(path, src)?;
    let mut parser = Parser {
        path,
        tokens: lexed.tokens,
        comments: lexed.comments,
        pos: 0,
    };
    parser.file()
}

struct Parser<'a, 'p> {
    path: &'p Path,
    tokens: Vec<Token<'a>>,
    comments: Vec<Comment<'a>>,
    pos: usize,
}

impl<'a, 'p> Parser<'a, 'p> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error(&self, details: impl Into<String>) -> Error {
        Error::parse(self.path, self.line(), details)
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            None => "end of file".to_string(),
            Some(t) if t.kind == TokenKind::Semi => "newline".to_string(),
            Some(t) => format!("'{}'", t.text),
        }
    }

    fn at_op(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_op(op))
    }

    fn at_semi(&self) -> bool {
        self.peek().is_some_and(|t| t.kind == TokenKind::Semi)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {}", op, self.describe_next())))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(t) if t.is_name() => {
                let name = t.text.to_string();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!("expected {}, found {}", what, self.describe_next()))),
        }
    }

    fn skip_semis(&mut self) {
        while self.at_semi() {
            self.pos += 1;
        }
    }

    /// A declaration must be followed by a terminator or the end of input.
    fn expect_terminator(&mut self) -> Result<()> {
        if self.peek().is_none() || self.at_semi() {
            self.skip_semis();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected end of declaration, found {}",
                self.describe_next()
            )))
        }
    }

    fn file(&mut self) -> Result<SourceFile> {
        self.skip_semis();
        match self.peek() {
            Some(t) if t.is_word("package") => self.pos += 1,
            _ => {
                return Err(self.error(format!(
                    "expected 'package', found {}",
                    self.describe_next()
                )))
            }
        }
        let package = self.expect_name("package name")?;
        self.expect_terminator()?;

        let mut decls = Vec::new();
        while let Some(tok) = self.next() {
            match tok.text {
                "import" if tok.kind == TokenKind::Ident => {
                    self.group(&mut decls, |p| p.import_spec().map(Decl::Import))?
                }
                "type" if tok.kind == TokenKind::Ident => {
                    self.group(&mut decls, |p| p.type_spec().map(Decl::Type))?
                }
                "const" if tok.kind == TokenKind::Ident => {
                    self.group(&mut decls, |p| p.value_spec(ValueKind::Const).map(Decl::Value))?
                }
                "var" if tok.kind == TokenKind::Ident => {
                    self.group(&mut decls, |p| p.value_spec(ValueKind::Var).map(Decl::Value))?
                }
                "func" if tok.kind == TokenKind::Ident => {
                    let decl = self.func_decl(tok.line)?;
                    decls.push(Decl::Func(decl));
                }
                _ => {
                    self.pos -= 1;
                    return Err(self.error(format!(
                        "expected declaration, found {}",
                        self.describe_next()
                    )));
                }
            }
            self.expect_terminator()?;
        }

        Ok(SourceFile {
            path: self.path.to_path_buf(),
            package,
            decls,
        })
    }

    /// Parses either a single spec or a parenthesized list of specs.
    fn group<F>(&mut self, decls: &mut Vec<Decl>, mut spec: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<Decl>,
    {
        if !self.eat_op("(") {
            decls.push(spec(self)?);
            return Ok(());
        }
        loop {
            self.skip_semis();
            if self.eat_op(")") {
                return Ok(());
            }
            if self.peek().is_none() {
                return Err(self.error("unexpected end of file in declaration group"));
            }
            decls.push(spec(self)?);
            if !self.at_semi() && !self.at_op(")") {
                return Err(self.error(format!(
                    "expected ';' or ')', found {}",
                    self.describe_next()
                )));
            }
        }
    }

    fn import_spec(&mut self) -> Result<ImportSpec> {
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Ident || t.is_op(".") => {
                let name = t.text.to_string();
                self.pos += 1;
                Some(name)
            }
            _ => None,
        };
        match self.peek() {
            Some(t) if t.kind == TokenKind::String => {
                let path = unquote(t.text);
                self.pos += 1;
                Ok(ImportSpec { name, path })
            }
            _ => Err(self.error(format!(
                "expected import path, found {}",
                self.describe_next()
            ))),
        }
    }

    fn type_spec(&mut self) -> Result<TypeSpec> {
        let line = self.line();
        let name = self.expect_name("type name")?;
        let generic = self.at_type_params();
        if generic {
            self.skip_balanced()?;
        }
        let alias = self.eat_op("=");
        let shape = self.type_shape()?;
        Ok(TypeSpec {
            name,
            alias,
            generic,
            shape,
            line,
        })
    }

    /// Distinguishes `type T[P any] ...` from the array type `type T [N]E`.
    ///
    /// `[P *C]` reads as an array length unless the operand after `*` is a
    /// type literal or the list has a top-level comma (`[P *C,]`).
    fn at_type_params(&self) -> bool {
        if !self.at_op("[") {
            return false;
        }
        let (Some(first), Some(second)) = (self.peek_at(1), self.peek_at(2)) else {
            return false;
        };
        if !first.is_name() {
            return false;
        }
        if second.is_op("*") {
            let operand_is_type = self.peek_at(3).is_some_and(|t| {
                t.is_op("[")
                    || t.is_op("*")
                    || ["map", "chan", "func", "struct", "interface"]
                        .iter()
                        .any(|w| t.is_word(w))
            });
            return operand_is_type || self.bracket_has_comma();
        }
        second.kind == TokenKind::Ident
            || second.is_op(",")
            || second.is_op("~")
            || second.is_op("[")
    }

    /// True if the bracket opening at the current token holds a comma at its
    /// own nesting level.
    fn bracket_has_comma(&self) -> bool {
        let mut depth = 0usize;
        for tok in &self.tokens[self.pos..] {
            match opener_closer(tok) {
                Some(Bracket::Open(_)) => depth += 1,
                Some(Bracket::Close) => {
                    depth -= 1;
                    if depth == 0 {
                        return false;
                    }
                }
                None if depth == 1 && tok.is_op(",") => return true,
                None => {}
            }
        }
        false
    }

    fn type_shape(&mut self) -> Result<TypeShape> {
        let Some(tok) = self.peek().copied() else {
            return Err(self.error("expected type, found end of file"));
        };
        if tok.is_word("struct") {
            self.pos += 1;
            if !self.at_op("{") {
                return Err(self.error(format!(
                    "expected '{{', found {}",
                    self.describe_next()
                )));
            }
            self.skip_balanced()?;
            return Ok(TypeShape::Struct);
        }
        if tok.is_word("interface") {
            self.pos += 1;
            return self.interface_body().map(TypeShape::Interface);
        }
        if tok.is_name() {
            let qualified = self
                .peek_at(1)
                .is_some_and(|t| t.is_op(".") || t.is_op("["));
            if !qualified {
                self.pos += 1;
                return Ok(TypeShape::Ident(tok.text.to_string()));
            }
        }
        let start = self.pos;
        self.skip_expr()?;
        if self.pos == start {
            return Err(self.error(format!("expected type, found {}", self.describe_next())));
        }
        Ok(TypeShape::Other)
    }

    fn interface_body(&mut self) -> Result<InterfaceType> {
        self.expect_op("{")?;
        let mut iface = InterfaceType::default();
        loop {
            self.skip_semis();
            if self.eat_op("}") {
                return Ok(iface);
            }
            let Some(tok) = self.peek().copied() else {
                return Err(self.error("unexpected end of file in interface"));
            };
            let next = self.peek_at(1).copied();
            match next {
                Some(n) if tok.is_name() && n.is_op("(") => {
                    let method = self.method()?;
                    iface.methods.push(method);
                }
                Some(n) if tok.is_name() && n.is_op(".") => {
                    self.pos += 2;
                    let name = self.expect_name("embedded interface name")?;
                    iface.embeds.push(format!("{}.{}", tok.text, name));
                    if self.at_op("[") {
                        self.skip_balanced()?;
                    }
                }
                Some(n) if tok.is_name() && (n.kind == TokenKind::Semi || n.is_op("}")) => {
                    self.pos += 1;
                    iface.embeds.push(tok.text.to_string());
                }
                _ => {
                    // Type-set elements such as `~int | ~string`.
                    self.skip_expr()?;
                }
            }
            if !self.at_semi() && !self.at_op("}") {
                return Err(self.error(format!(
                    "expected ';' or '}}', found {}",
                    self.describe_next()
                )));
            }
        }
    }

    fn method(&mut self) -> Result<Method> {
        let line = self.line();
        let name = self.expect_name("method name")?;
        let params = self.params()?;
        let results = if self.at_op("(") {
            self.params()?
        } else if self.peek().is_none() || self.at_semi() || self.at_op("}") {
            Vec::new()
        } else {
            let start = self.pos;
            self.skip_expr()?;
            vec![Field {
                names: Vec::new(),
                ty: render_tokens(&self.tokens[start..self.pos]),
            }]
        };
        let last_line = self.tokens[self.pos - 1].line;
        let perm = self.perm_tag(line, last_line);
        Ok(Method {
            name,
            params,
            results,
            perm,
            line,
        })
    }

    /// Parses a parenthesized parameter or result list.
    fn params(&mut self) -> Result<Vec<Field>> {
        self.expect_op("(")?;
        let mut entries = Vec::new();
        loop {
            if self.eat_op(")") {
                break;
            }
            let start = self.pos;
            self.skip_expr_until_comma()?;
            if self.pos > start {
                entries.push(start..self.pos);
            }
            if !self.eat_op(",") {
                self.expect_op(")")?;
                break;
            }
        }

        let tokens = &self.tokens;
        let named = entries.iter().any(|range| {
            let entry = &tokens[range.clone()];
            entry.len() >= 2 && entry[0].is_name() && !entry[1].is_op(".")
        });

        if !named {
            return Ok(entries
                .into_iter()
                .map(|range| Field {
                    names: Vec::new(),
                    ty: render_tokens(&tokens[range]),
                })
                .collect());
        }

        let mut fields = Vec::new();
        let mut pending = Vec::new();
        for range in entries {
            let entry = &tokens[range];
            if entry.len() == 1 && entry[0].is_name() {
                pending.push(entry[0].text.to_string());
                continue;
            }
            if !entry[0].is_name() {
                return Err(Error::parse(
                    self.path,
                    entry[0].line,
                    "mixed named and unnamed parameters",
                ));
            }
            pending.push(entry[0].text.to_string());
            fields.push(Field {
                names: std::mem::take(&mut pending),
                ty: render_tokens(&entry[1..]),
            });
        }
        if !pending.is_empty() {
            return Err(self.error("mixed named and unnamed parameters"));
        }
        Ok(fields)
    }

    /// Finds a `perm:<tag>` comment trailing the method (on its first or
    /// last line) or anywhere in the comment group directly above it.
    fn perm_tag(&self, first: usize, last: usize) -> Option<String> {
        let on_line = |l: usize| {
            self.comments
                .iter()
                .filter(move |c| c.line == l)
                .find_map(|c| extract_perm(c.text))
        };
        if let Some(tag) = on_line(last).or_else(|| on_line(first)) {
            return Some(tag);
        }
        let has_code = |l: usize| {
            self.tokens
                .iter()
                .any(|t| t.line == l && t.kind != TokenKind::Semi)
        };
        let has_comment = |l: usize| self.comments.iter().any(|c| c.line == l);

        let mut above = first.checked_sub(1)?;
        while above > 0 && !has_code(above) && has_comment(above) {
            if let Some(tag) = on_line(above) {
                return Some(tag);
            }
            above -= 1;
        }
        None
    }

    fn func_decl(&mut self, line: usize) -> Result<FuncDecl> {
        let receiver = if self.at_op("(") {
            let fields = self.params()?;
            match fields.as_slice() {
                [field] if field.names.len() <= 1 => Some(field.ty.clone()),
                _ => return Err(self.error("method has multiple receivers")),
            }
        } else {
            None
        };
        let name = self.expect_name("function name")?;
        self.skip_expr()?;
        Ok(FuncDecl {
            name,
            receiver,
            line,
        })
    }

    fn value_spec(&mut self, kind: ValueKind) -> Result<ValueSpec> {
        let line = self.line();
        let mut names = vec![self.expect_name("identifier")?];
        while self.eat_op(",") {
            names.push(self.expect_name("identifier")?);
        }
        self.skip_expr()?;
        Ok(ValueSpec { kind, names, line })
    }

    /// Skips one bracketed group starting at the current `(`, `[` or `{`.
    fn skip_balanced(&mut self) -> Result<()> {
        let mut stack = Vec::new();
        loop {
            let Some(tok) = self.next() else {
                return Err(self.error("unexpected end of file, unclosed bracket"));
            };
            match opener_closer(&tok) {
                Some(Bracket::Open(close)) => stack.push(close),
                Some(Bracket::Close) => {
                    if stack.pop() != Some(tok.text) {
                        return Err(Error::parse(
                            self.path,
                            tok.line,
                            format!("mismatched '{}'", tok.text),
                        ));
                    }
                    if stack.is_empty() {
                        return Ok(());
                    }
                }
                None if stack.is_empty() => {
                    return Err(Error::parse(
                        self.path,
                        tok.line,
                        format!("expected bracket, found '{}'", tok.text),
                    ))
                }
                None => {}
            }
        }
    }

    /// Skips tokens up to a terminator or an unmatched closing bracket.
    fn skip_expr(&mut self) -> Result<()> {
        self.skip_until(|_| false)
    }

    fn skip_expr_until_comma(&mut self) -> Result<()> {
        self.skip_until(|t| t.is_op(","))
    }

    fn skip_until(&mut self, stop: impl Fn(&Token<'a>) -> bool) -> Result<()> {
        let mut stack: Vec<&'static str> = Vec::new();
        while let Some(tok) = self.peek().copied() {
            if stack.is_empty() && (tok.kind == TokenKind::Semi || stop(&tok)) {
                return Ok(());
            }
            match opener_closer(&tok) {
                Some(Bracket::Open(close)) => stack.push(close),
                Some(Bracket::Close) => {
                    if stack.is_empty() {
                        return Ok(());
                    }
                    if stack.pop() != Some(tok.text) {
                        return Err(self.error(format!("mismatched '{}'", tok.text)));
                    }
                }
                None => {}
            }
            self.pos += 1;
        }
        if stack.is_empty() {
            Ok(())
        } else {
            Err(self.error("unexpected end of file, unclosed bracket"))
        }
    }
}

enum Bracket {
    Open(&'static str),
    Close,
}

fn opener_closer(tok: &Token<'_>) -> Option<Bracket> {
    if tok.kind != TokenKind::Op {
        return None;
    }
    match tok.text {
        "(" => Some(Bracket::Open(")")),
        "[" => Some(Bracket::Open("]")),
        "{" => Some(Bracket::Open("}")),
        ")" | "]" | "}" => Some(Bracket::Close),
        _ => None,
    }
}

fn extract_perm(comment: &str) -> Option<String> {
    let idx = comment.find("perm:")?;
    let tag: String = comment[idx + "perm:".len()..]
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    (!tag.is_empty()).then_some(tag)
}

fn unquote(lit: &str) -> String {
    lit.trim_matches(|c| c == '"' || c == '`').to_string()
}

/// Renders a token run the way the canonical printer spaces type expressions.
pub(crate) fn render_tokens(tokens: &[Token<'_>]) -> String {
    let word = |t: &Token<'_>| {
        matches!(
            t.kind,
            TokenKind::Ident | TokenKind::Number | TokenKind::String | TokenKind::Char
        )
    };
    let mut out = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 {
            let prev = &tokens[i - 1];
            let space = if prev.is_op(",") {
                true
            } else if prev.is_op(")") {
                !matches!(tok.text, ")" | "," | "]" | "}" | ".") || word(tok)
            } else if prev.is_word("chan") {
                !tok.is_op("<-")
            } else if prev.is_op("<-") {
                i >= 2 && tokens[i - 2].is_word("chan")
            } else {
                word(prev) && word(tok)
            };
            if space {
                out.push(' ');
            }
        }
        out.push_str(tok.text);
    }
    out
}
