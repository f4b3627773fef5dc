//! Source front end: lexer, declaration parser and package directory scanner.
//!
//! ## Model
//!
//! A parsed file is a flat list of [`Decl`] values. The set of variants is
//! closed: imports, type declarations, function declarations and value
//! (`const`/`var`) declarations. Grouped declarations are flattened so every
//! spec appears exactly once.
//!
//! ## Scanning a package
//!
//! [`parse_dir`] lists the source files directly inside a package
//! directory, drops the ones matching an exclusion pattern, and parses the
//! rest. The first error aborts the scan.

mod lexer;
mod parser;

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

pub use lexer::{is_keyword, tokenize, Comment, Lexed, Token, TokenKind};
pub use parser::parse_file;

/// Extension of the source files considered part of a package
pub const SOURCE_EXTENSION: &str = "go";

/// A parsed source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path the file was read from
    pub path: PathBuf,
    /// Name from the package clause
    pub package: String,
    /// Top-level declarations in source order
    pub decls: Vec<Decl>,
}

impl SourceFile {
    /// Iterates the import specs of this file
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Import(spec) => Some(spec),
            _ => None,
        })
    }
}

/// A top-level declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// `import name "path"`
    Import(ImportSpec),
    /// `type Name ...`
    Type(TypeSpec),
    /// `func [recv] Name(...) ...`
    Func(FuncDecl),
    /// `const` or `var` spec
    Value(ValueSpec),
}

/// One import spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name (`_`, `.` or an identifier)
    pub name: Option<String>,
    /// Unquoted import path
    pub path: String,
}

/// One type spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// Declared name
    pub name: String,
    /// True for `type A = B`
    pub alias: bool,
    /// True when the declaration has type parameters
    pub generic: bool,
    /// Shape of the right-hand side
    pub shape: TypeShape,
    /// Line of the declaration
    pub line: usize,
}

/// The shape of a declared type's right-hand side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// `struct { ... }`
    Struct,
    /// A bare, unqualified identifier such as `int64` or `Foo`
    Ident(String),
    /// `interface { ... }`
    Interface(InterfaceType),
    /// Anything else: qualified names, slices, maps, pointers, functions
    Other,
}

/// Method set and embeds of an interface type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceType {
    /// Methods in declaration order
    pub methods: Vec<Method>,
    /// Embedded interfaces, possibly package-qualified
    pub embeds: Vec<String>,
}

/// An interface method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Method name
    pub name: String,
    /// Parameter groups
    pub params: Vec<Field>,
    /// Result groups
    pub results: Vec<Field>,
    /// Permission tag from a `perm:<tag>` comment
    pub perm: Option<String>,
    /// Line of the declaration
    pub line: usize,
}

/// A parameter or result group: `a, b int` or a bare `int`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Names sharing the type; empty for unnamed fields
    pub names: Vec<String>,
    /// Rendered type, with a `...` prefix for variadic parameters
    pub ty: String,
}

impl Field {
    /// Number of parameters this group stands for
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }

    /// True for a trailing `...T` parameter
    pub fn is_variadic(&self) -> bool {
        self.ty.starts_with("...")
    }
}

/// A function or method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Function name
    pub name: String,
    /// Receiver type for methods
    pub receiver: Option<String>,
    /// Line of the declaration
    pub line: usize,
}

/// `const` or `var`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Constant declaration
    Const,
    /// Variable declaration
    Var,
}

/// One value spec, possibly declaring several names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    /// `const` or `var`
    pub kind: ValueKind,
    /// Declared names
    pub names: Vec<String>,
    /// Line of the declaration
    pub line: usize,
}

/// Returns true if `name` is visible outside its package (starts upper-case)
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// A parsed package directory
#[derive(Debug, Clone)]
pub struct Package {
    /// Directory that was scanned
    pub dir: PathBuf,
    /// Parsed files, ordered by file name
    pub files: Vec<SourceFile>,
}

impl Package {
    /// Iterates every declaration of every file
    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.files.iter().flat_map(|f| f.decls.iter())
    }
}

/// Returns true if a file named `name` passes the exclusion patterns
pub fn include_file(name: &str, excluded: &[String]) -> bool {
    !excluded.iter().any(|pattern| name.contains(pattern.as_str()))
}

/// Parse every non-excluded source file directly inside `dir`.
///
/// A file is skipped when its name contains any of the `excluded`
/// substrings. Files are parsed in name order; the first lexer or parser
/// error aborts the scan.
pub fn parse_dir(dir: &Path, excluded: &[String]) -> Result<Package> {
    if !dir.is_dir() {
        return Err(Error::directory_read(dir, "not a directory"));
    }
    debug!("Scanning package directory: {}", dir.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::directory_read(dir, e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == SOURCE_EXTENSION);
        if !is_source {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !include_file(&name, excluded) {
            trace!("Skipping excluded file: {}", path.display());
            continue;
        }

        let src = fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let file = parse_file(path, &src)?;
        trace!(
            "Parsed {} ({} declarations)",
            path.display(),
            file.decls.len()
        );
        files.push(file);
    }

    debug!("Parsed {} files in {}", files.len(), dir.display());
    Ok(Package {
        dir: dir.to_path_buf(),
        files,
    })
}
