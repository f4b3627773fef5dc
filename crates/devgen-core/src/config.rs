//! Generator configuration.
//!
//! All hand-maintained tables (package list, skip sets, allow-list, rename
//! table, file exclusion patterns) live in one immutable [`GenConfig`] value
//! built at startup. [`GenConfig::state_types`] returns the tables used to
//! generate the builtin-actor type aliases.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Import path prefix of the builtin actor packages
pub const STATE_TYPES_PREFIX: &str = "github.com/filecoin-project/go-state-types/builtin";

/// Module that hosts the builtin actor packages
pub const STATE_TYPES_MODULE: &str = "github.com/filecoin-project/go-state-types";

/// Latest actors version known to this tool
pub const LATEST_ACTORS_VERSION: u32 = 9;

/// Header line identifying the state type generator
pub const STATE_TYPE_GEN: &str = "github.com/filecoin-project/venus/venus-devtool/state-type-gen";

/// Header line identifying the proxy generator
pub const API_GEN: &str = "github.com/filecoin-project/venus/venus-devtool/api-gen";

/// File name patterns never parsed: generated encoders, tests, invariant
/// checks and method tables.
pub const DEFAULT_EXCLUDED_FILES: [&str; 4] =
    ["cbor_gen.go", "_test.go", "invariants.go", "methods.go"];

/// A package waiting to be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPackage {
    /// Logical name, also used as the qualifier in generated code
    pub name: String,
    /// Import path
    pub path: String,
    /// Actors version the import path points at
    pub version: u32,
}

impl PendingPackage {
    /// Creates a builtin actor package descriptor for `name` at `version`
    pub fn builtin(name: impl Into<String>, version: u32) -> Self {
        let name = name.into();
        Self {
            path: format!("{}/v{}/{}", STATE_TYPES_PREFIX, version, name),
            name,
            version,
        }
    }
}

impl fmt::Display for PendingPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Configuration for the alias generator
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Package clause of the generated file
    pub target_package: String,
    /// Generator identity written into the header comment
    pub generator: String,
    /// Packages to scan
    pub packages: Vec<PendingPackage>,
    /// Substrings that exclude a file from parsing
    pub excluded_files: Vec<String>,
    /// Exported types that are never aliased
    pub skip_types: BTreeSet<String>,
    /// Exported functions that are never forwarded
    pub skip_funcs: BTreeSet<String>,
    /// Exported values that are re-declared; all others are ignored
    pub allowed_values: BTreeSet<String>,
    /// `(type name, package)` pairs emitted under a different name
    pub renames: BTreeMap<(String, String), String>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            target_package: "types".to_string(),
            generator: STATE_TYPE_GEN.to_string(),
            packages: Vec::new(),
            excluded_files: DEFAULT_EXCLUDED_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_types: BTreeSet::new(),
            skip_funcs: BTreeSet::new(),
            allowed_values: BTreeSet::new(),
            renames: BTreeMap::new(),
        }
    }
}

impl GenConfig {
    /// Creates an empty config with the default exclusion patterns
    pub fn new() -> Self {
        Self::default()
    }

    /// The tables for the builtin actor state types.
    ///
    /// `paych` is pinned to actors v8; the other packages follow `latest`.
    pub fn state_types(latest: u32) -> Self {
        let mut config = Self::new().package(PendingPackage::builtin("paych", 8));
        for name in ["market", "miner", "verifreg"] {
            config = config.package(PendingPackage::builtin(name, latest));
        }
        config
            .skip_types(["State", "MinerInfo", "ConstructState", "Partition", "Deadline"])
            .skip_funcs(["ConstructState"])
            .allow_values(["NoAllocationID"])
            .rename("WithdrawBalanceParams", "market", "MarketWithdrawBalanceParams")
            .rename("WithdrawBalanceParams", "miner", "MinerWithdrawBalanceParams")
    }

    /// Sets the package clause of the generated file
    pub fn target_package(mut self, name: impl Into<String>) -> Self {
        self.target_package = name.into();
        self
    }

    /// Sets the generator identity used in the header
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Adds a package to scan
    pub fn package(mut self, package: PendingPackage) -> Self {
        self.packages.push(package);
        self
    }

    /// Replaces the file exclusion patterns
    pub fn excluded_files<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_files = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds type names to the skip set
    pub fn skip_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_types.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds function names to the skip set
    pub fn skip_funcs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_funcs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds value names to the allow-list
    pub fn allow_values<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values.extend(names.into_iter().map(Into::into));
        self
    }

    /// Emits type `name` from `package` as `new_name`
    pub fn rename(
        mut self,
        name: impl Into<String>,
        package: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        self.renames
            .insert((name.into(), package.into()), new_name.into());
        self
    }

    /// Looks up the emitted name for type `name` declared in `package`
    pub fn rename_for(&self, name: &str, package: &str) -> Option<&str> {
        self.renames
            .get(&(name.to_string(), package.to_string()))
            .map(String::as_str)
    }

    /// Packages in logical-name order
    pub fn sorted_packages(&self) -> Vec<&PendingPackage> {
        let mut packages: Vec<_> = self.packages.iter().collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages
    }

    /// Finds a package by logical name
    pub fn find_package(&self, name: &str) -> Option<&PendingPackage> {
        self.packages.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_package_path() {
        let pkg = PendingPackage::builtin("market", 9);
        assert_eq!(
            pkg.path,
            "github.com/filecoin-project/go-state-types/builtin/v9/market"
        );
        assert_eq!(pkg.version, 9);
    }

    #[test]
    fn test_state_types_tables() {
        let config = GenConfig::state_types(LATEST_ACTORS_VERSION);
        let names: Vec<_> = config
            .sorted_packages()
            .iter()
            .map(|p| (p.name.as_str(), p.version))
            .collect();
        assert_eq!(
            names,
            vec![("market", 9), ("miner", 9), ("paych", 8), ("verifreg", 9)]
        );
        assert!(config.skip_types.contains("MinerInfo"));
        assert!(config.skip_funcs.contains("ConstructState"));
        assert!(config.allowed_values.contains("NoAllocationID"));
        assert_eq!(config.excluded_files.len(), 4);
    }

    #[test]
    fn test_rename_is_keyed_by_package() {
        let config = GenConfig::state_types(LATEST_ACTORS_VERSION);
        assert_eq!(
            config.rename_for("WithdrawBalanceParams", "market"),
            Some("MarketWithdrawBalanceParams")
        );
        assert_eq!(
            config.rename_for("WithdrawBalanceParams", "miner"),
            Some("MinerWithdrawBalanceParams")
        );
        assert_eq!(config.rename_for("WithdrawBalanceParams", "paych"), None);
    }
}
