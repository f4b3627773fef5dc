//! Canonicalization of generated source.
//!
//! The built-in pass re-parses the assembled text (a parse failure is the
//! formatting failure), drops imports no declaration refers to, sorts the
//! import block into a standard-library group and a third-party group, and
//! normalizes whitespace. [`Formatter::External`] additionally pipes the
//! result through a program such as `gofmt`.

use crate::error::{Error, Result};
use crate::render::default_import_name;
use crate::source::{parse_file, tokenize, ImportSpec, TokenKind};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// Pseudo path used in messages about generated text
const GENERATED: &str = "<generated>";

/// How generated source is canonicalized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Formatter {
    /// Built-in canonicalization only
    #[default]
    Builtin,
    /// Built-in canonicalization followed by an external program reading
    /// stdin and writing stdout
    External(String),
}

impl Formatter {
    /// Canonicalizes `src`
    pub fn format(&self, src: &str) -> Result<String> {
        let canonical = canonicalize(src)?;
        match self {
            Self::Builtin => Ok(canonical),
            Self::External(program) => run_external(program, &canonical),
        }
    }
}

fn run_external(program: &str, src: &str) -> Result<String> {
    debug!("Piping generated source through {}", program);
    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::formatter(program, e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(src.as_bytes())
            .map_err(|e| Error::formatter(program, e.to_string()))?;
    }
    let output = child
        .wait_with_output()
        .map_err(|e| Error::formatter(program, e.to_string()))?;
    if !output.status.success() {
        return Err(Error::formatter(
            program,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| Error::formatter(program, format!("non-UTF-8 output: {}", e)))
}

/// The built-in canonicalization pass
pub fn canonicalize(src: &str) -> Result<String> {
    let path = Path::new(GENERATED);
    let file = parse_file(path, src).map_err(|e| Error::format(e.to_string()))?;
    let lexed = tokenize(path, src).map_err(|e| Error::format(e.to_string()))?;

    // Qualifiers in use: every `name.` outside the import declarations.
    let mut import_lines = BTreeSet::new();
    let mut used = BTreeSet::new();
    let tokens = &lexed.tokens;
    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.is_word("import") {
            let start = tok.line;
            let mut end = start;
            let mut depth = 0usize;
            i += 1;
            while i < tokens.len() {
                let t = &tokens[i];
                end = t.line;
                if t.is_op("(") {
                    depth += 1;
                } else if t.is_op(")") {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                } else if t.kind == TokenKind::Semi && depth == 0 {
                    end = tokens[i - 1].line;
                    break;
                }
                i += 1;
            }
            import_lines.extend(start..=end);
        } else if tok.kind == TokenKind::Ident
            && tokens.get(i + 1).is_some_and(|t| t.is_op("."))
        {
            used.insert(tok.text);
        }
        i += 1;
    }

    let mut kept: Vec<&ImportSpec> = Vec::new();
    for spec in file.imports() {
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| default_import_name(&spec.path));
        if name == "_" || name == "." || used.contains(name.as_str()) {
            if !kept.contains(&spec) {
                kept.push(spec);
            }
        } else {
            trace!("Pruning unused import {}", spec.path);
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut block_written = false;
    for (idx, line) in src.lines().enumerate() {
        if import_lines.contains(&(idx + 1)) {
            if !block_written {
                out.push_str(&import_block(&kept));
                block_written = true;
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    Ok(normalize_whitespace(&out))
}

fn is_std(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

fn import_line(spec: &ImportSpec) -> String {
    match &spec.name {
        Some(name) => format!("\t{} \"{}\"\n", name, spec.path),
        None => format!("\t\"{}\"\n", spec.path),
    }
}

fn import_block(imports: &[&ImportSpec]) -> String {
    if imports.is_empty() {
        return String::new();
    }
    let (mut stdlib, mut rest): (Vec<&ImportSpec>, Vec<&ImportSpec>) =
        imports.iter().copied().partition(|s| is_std(&s.path));
    stdlib.sort_by(|a, b| a.path.cmp(&b.path));
    rest.sort_by(|a, b| a.path.cmp(&b.path));

    let mut block = String::from("import (\n");
    for spec in &stdlib {
        block.push_str(&import_line(spec));
    }
    if !stdlib.is_empty() && !rest.is_empty() {
        block.push('\n');
    }
    for spec in &rest {
        block.push_str(&import_line(spec));
    }
    block.push_str(")\n");
    block
}

/// Strips trailing whitespace, collapses blank-line runs and leaves exactly
/// one trailing newline.
fn normalize_whitespace(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut blank_run = false;
    for line in src.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !out.is_empty() {
                blank_run = true;
            }
            continue;
        }
        if blank_run {
            out.push('\n');
            blank_run = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
