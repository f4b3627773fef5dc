//! Declaration classification and name collection.
//!
//! Every declaration goes through [`classify`], which returns a
//! [`Decision`] per declared name. Types and functions are opt-out (skip
//! sets); values are opt-in (allow-list).

use crate::config::GenConfig;
use crate::source::{is_exported, Decl, Package, TypeShape};
use tracing::trace;

/// Category of an included name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// Type alias
    Type,
    /// Function forwarded through a variable
    Func,
    /// Constant or variable re-declaration
    Value,
}

/// Why a name was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Not visible outside its package
    Unexported,
    /// Listed in a skip set
    Skipped,
    /// Type whose right-hand side is neither a struct nor a bare identifier
    Shape,
    /// Function with a receiver
    Method,
    /// Value missing from the allow-list
    NotAllowed,
    /// Import specs never produce output
    Import,
}

/// Outcome of classifying one declared name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Record the name in the given list
    Include(NameKind),
    /// Ignore the name
    Exclude(Exclusion),
}

/// Classify every name declared by `decl`.
pub fn classify<'d>(decl: &'d Decl, config: &GenConfig) -> Vec<(&'d str, Decision)> {
    match decl {
        Decl::Import(spec) => vec![(spec.path.as_str(), Decision::Exclude(Exclusion::Import))],
        Decl::Type(spec) => {
            let decision = if !is_exported(&spec.name) {
                Decision::Exclude(Exclusion::Unexported)
            } else if !matches!(spec.shape, TypeShape::Struct | TypeShape::Ident(_)) {
                Decision::Exclude(Exclusion::Shape)
            } else if config.skip_types.contains(&spec.name) {
                Decision::Exclude(Exclusion::Skipped)
            } else {
                Decision::Include(NameKind::Type)
            };
            vec![(spec.name.as_str(), decision)]
        }
        Decl::Func(func) => {
            let decision = if !is_exported(&func.name) {
                Decision::Exclude(Exclusion::Unexported)
            } else if func.receiver.is_some() {
                Decision::Exclude(Exclusion::Method)
            } else if config.skip_funcs.contains(&func.name) {
                Decision::Exclude(Exclusion::Skipped)
            } else {
                Decision::Include(NameKind::Func)
            };
            vec![(func.name.as_str(), decision)]
        }
        Decl::Value(spec) => spec
            .names
            .iter()
            .map(|name| {
                let decision = if !is_exported(name) {
                    Decision::Exclude(Exclusion::Unexported)
                } else if config.allowed_values.contains(name) {
                    Decision::Include(NameKind::Value)
                } else {
                    Decision::Exclude(Exclusion::NotAllowed)
                };
                (name.as_str(), decision)
            })
            .collect(),
    }
}

/// Names collected from one package, each list sorted and unique
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageNames {
    /// Logical package name (the qualifier in generated code)
    pub package: String,
    /// Type names
    pub types: Vec<String>,
    /// Function names
    pub funcs: Vec<String>,
    /// Allow-listed constant or variable names
    pub values: Vec<String>,
}

impl PackageNames {
    /// Creates an empty record for `package`
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    /// Total number of collected names
    pub fn len(&self) -> usize {
        self.types.len() + self.funcs.len() + self.values.len()
    }

    /// True if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, kind: NameKind, name: &str) {
        let list = match kind {
            NameKind::Type => &mut self.types,
            NameKind::Func => &mut self.funcs,
            NameKind::Value => &mut self.values,
        };
        list.push(name.to_string());
    }

    /// Sorts each list and drops duplicates (e.g. from per-platform files)
    fn finish(&mut self) {
        for list in [&mut self.types, &mut self.funcs, &mut self.values] {
            list.sort();
            list.dedup();
        }
    }
}

/// Walk every declaration of `package` and collect the included names.
pub fn collect_names(name: &str, package: &Package, config: &GenConfig) -> PackageNames {
    let mut names = PackageNames::new(name);
    for decl in package.decls() {
        for (ident, decision) in classify(decl, config) {
            match decision {
                Decision::Include(kind) => names.insert(kind, ident),
                Decision::Exclude(reason) => trace!("{}: excluding {} ({:?})", name, ident, reason),
            }
        }
    }
    names.finish();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_file;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    fn package(files: &[&str]) -> Package {
        Package {
            dir: PathBuf::from("pkg"),
            files: files
                .iter()
                .map(|src| parse_file(Path::new("pkg/file.go"), src).unwrap())
                .collect(),
        }
    }

    fn config() -> GenConfig {
        GenConfig::new()
            .skip_types(["State"])
            .skip_funcs(["ConstructState"])
            .allow_values(["NoAllocationID"])
    }

    #[test]
    fn test_classify_types() {
        let file = parse_file(
            Path::new("t.go"),
            "package p\ntype Foo struct{}\ntype State struct{}\ntype bar struct{}\ntype List []Foo\ntype Epoch int64\n",
        )
        .unwrap();
        let decisions: Vec<_> = file
            .decls
            .iter()
            .flat_map(|d| classify(d, &config()))
            .collect();
        assert_eq!(
            decisions,
            vec![
                ("Foo", Decision::Include(NameKind::Type)),
                ("State", Decision::Exclude(Exclusion::Skipped)),
                ("bar", Decision::Exclude(Exclusion::Unexported)),
                ("List", Decision::Exclude(Exclusion::Shape)),
                ("Epoch", Decision::Include(NameKind::Type)),
            ]
        );
    }

    #[test]
    fn test_classify_values_is_opt_in() {
        let file = parse_file(
            Path::new("t.go"),
            "package p\nconst NoAllocationID = 0\nconst Baz = 1\nvar noAllocation = 2\n",
        )
        .unwrap();
        let decisions: Vec<_> = file
            .decls
            .iter()
            .flat_map(|d| classify(d, &config()))
            .collect();
        assert_eq!(
            decisions,
            vec![
                ("NoAllocationID", Decision::Include(NameKind::Value)),
                ("Baz", Decision::Exclude(Exclusion::NotAllowed)),
                ("noAllocation", Decision::Exclude(Exclusion::Unexported)),
            ]
        );
    }

    #[test]
    fn test_collect_names_sorted_and_unique() {
        let pkg = package(&[
            r#"package market

import "fmt"

type Zeta struct{}
type Alpha struct{}
type State struct{}

func ConstructState() {}
func NewAlpha() *Alpha { return nil }
func (a *Alpha) Method() {}
func helper() {}

const NoAllocationID = 0
const Baz = 1
"#,
            // A second per-platform file redeclaring a type.
            "package market\n\ntype Alpha struct{}\nfunc Bar() {}\n",
        ]);

        let names = collect_names("market", &pkg, &config());
        assert_eq!(names.package, "market");
        assert_eq!(names.types, vec!["Alpha", "Zeta"]);
        assert_eq!(names.funcs, vec!["Bar", "NewAlpha"]);
        assert_eq!(names.values, vec!["NoAllocationID"]);
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_sort_is_case_sensitive() {
        let pkg = package(&[
            "package p\ntype B struct{}\ntype A struct{}\ntype Ab struct{}\ntype AB struct{}\n",
        ]);
        let names = collect_names("p", &pkg, &GenConfig::new());
        assert_eq!(names.types, vec!["A", "AB", "Ab", "B"]);
    }
}
