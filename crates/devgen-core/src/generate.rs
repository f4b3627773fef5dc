//! End-to-end generators.
//!
//! Each generator runs the same straight line: locate and parse sources,
//! collect what to emit, render, format, then write. Any error aborts the
//! run before the destination is touched.

use crate::collect::{collect_names, PackageNames};
use crate::config::{GenConfig, API_GEN, DEFAULT_EXCLUDED_FILES};
use crate::error::{Error, Result};
use crate::format::Formatter;
use crate::locate::PackageLocator;
use crate::output::{check_output, write_output, WriteOutcome};
use crate::render::{AliasRenderer, ProxyInterface, ProxyRenderer};
use crate::source::{is_exported, parse_dir, Decl, ImportSpec, Package, TypeShape};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Conventional name of the generated proxy file, never scanned itself
pub const PROXY_OUTPUT_FILE: &str = "proxy_gen.go";

/// Generates the consolidated alias file for the configured packages
pub struct StateTypeGenerator {
    config: GenConfig,
    locator: Box<dyn PackageLocator>,
    formatter: Formatter,
}

impl StateTypeGenerator {
    /// Creates a generator using the built-in formatter
    pub fn new(config: GenConfig, locator: impl PackageLocator + 'static) -> Self {
        Self {
            config,
            locator: Box::new(locator),
            formatter: Formatter::default(),
        }
    }

    /// Sets the formatter applied before writing
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// The configuration this generator runs with
    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Locates, parses and collects every configured package, in
    /// logical-name order
    pub fn collect(&self) -> Result<Vec<PackageNames>> {
        let mut collected = Vec::with_capacity(self.config.packages.len());
        for pending in self.config.sorted_packages() {
            debug!("Resolving {}", pending);
            let dir = self.locator.locate(pending)?;
            let package = parse_dir(&dir, &self.config.excluded_files)?;
            let names = collect_names(&pending.name, &package, &self.config);
            info!(
                "{}: {} types, {} functions, {} values",
                pending.name,
                names.types.len(),
                names.funcs.len(),
                names.values.len()
            );
            collected.push(names);
        }
        Ok(collected)
    }

    /// Produces the formatted file contents
    pub fn render(&self) -> Result<String> {
        let packages = self.collect()?;
        let raw = AliasRenderer::new(&self.config, &packages).render();
        self.formatter.format(&raw)
    }

    /// Generates and writes `dst`
    pub fn generate(&self, dst: &Path) -> Result<WriteOutcome> {
        let contents = self.render()?;
        write_output(dst, &contents)
    }

    /// Generates and fails with [`Error::Stale`] if `dst` differs
    pub fn check(&self, dst: &Path) -> Result<()> {
        let contents = self.render()?;
        check_output(dst, &contents)
    }
}

/// Generates proxy structs for the exported interfaces of one package
#[derive(Debug, Clone)]
pub struct ApiGenerator {
    src: PathBuf,
    package: Option<String>,
    generator: String,
    excluded_files: Vec<String>,
    formatter: Formatter,
}

impl ApiGenerator {
    /// Creates a generator scanning the package in `src`
    pub fn new(src: impl Into<PathBuf>) -> Self {
        let mut excluded_files: Vec<String> =
            DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect();
        excluded_files.push(PROXY_OUTPUT_FILE.to_string());
        Self {
            src: src.into(),
            package: None,
            generator: API_GEN.to_string(),
            excluded_files,
            formatter: Formatter::default(),
        }
    }

    /// Overrides the package clause; defaults to the scanned package's
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Sets the generator identity used in the header
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Sets the formatter applied before writing
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Produces the formatted file contents
    pub fn render(&self) -> Result<String> {
        let package = parse_dir(&self.src, &self.excluded_files)?;
        let package_name = match &self.package {
            Some(name) => name.clone(),
            None => package
                .files
                .first()
                .map(|f| f.package.clone())
                .ok_or_else(|| Error::directory_read(&self.src, "no source files"))?,
        };

        let imports = gather_imports(&package);
        let interfaces = proxy_interfaces(&package);
        info!(
            "{}: {} interfaces, {} imports",
            package_name,
            interfaces.len(),
            imports.len()
        );

        let raw = ProxyRenderer::new(&self.generator, &package_name, &imports, &interfaces)
            .render()?;
        self.formatter.format(&raw)
    }

    /// Generates and writes `dst`
    pub fn generate(&self, dst: &Path) -> Result<WriteOutcome> {
        let contents = self.render()?;
        write_output(dst, &contents)
    }

    /// Generates and fails with [`Error::Stale`] if `dst` differs
    pub fn check(&self, dst: &Path) -> Result<()> {
        let contents = self.render()?;
        check_output(dst, &contents)
    }
}

/// Every import of every file, first occurrence wins
fn gather_imports(package: &Package) -> Vec<ImportSpec> {
    let mut imports: Vec<ImportSpec> = Vec::new();
    for spec in package.files.iter().flat_map(|f| f.imports()) {
        if !imports.contains(spec) {
            imports.push(spec.clone());
        }
    }
    imports
}

/// Exported, non-generic interfaces with at least one member, in
/// declaration order
fn proxy_interfaces(package: &Package) -> Vec<ProxyInterface> {
    package
        .decls()
        .filter_map(|decl| match decl {
            Decl::Type(spec) if is_exported(&spec.name) && !spec.generic => match &spec.shape {
                TypeShape::Interface(iface)
                    if !iface.methods.is_empty() || !iface.embeds.is_empty() =>
                {
                    Some(ProxyInterface {
                        name: spec.name.clone(),
                        iface: iface.clone(),
                    })
                }
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PendingPackage, STATE_TYPES_MODULE};
    use crate::locate::CheckoutLocator;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn generator(root: &Path, config: GenConfig) -> StateTypeGenerator {
        StateTypeGenerator::new(config, CheckoutLocator::new(STATE_TYPES_MODULE, root))
    }

    #[test]
    fn test_struct_function_and_method() {
        let root = TempDir::new().unwrap();
        write_file(
            root.path(),
            "builtin/v9/market/market.go",
            r#"package market

import "github.com/filecoin-project/go-state-types/abi"

type Foo struct {
	Amount abi.TokenAmount
}

type State struct{}

func Bar() {}

func (s *State) Baz() {}
"#,
        );
        let config = GenConfig::new()
            .package(PendingPackage::builtin("market", 9))
            .skip_types(["State"]);

        let out = generator(root.path(), config).render().unwrap();
        assert_eq!(
            out,
            r#"// Code generated by github.com/filecoin-project/venus/venus-devtool/state-type-gen. DO NOT EDIT.
package types

import (
	"github.com/filecoin-project/go-state-types/builtin/v9/market"
)

////////// market //////////
type Foo = market.Foo
var Bar = market.Bar
"#
        );
    }

    #[test]
    fn test_renamed_types_never_appear_bare() {
        let root = TempDir::new().unwrap();
        let params = "type WithdrawBalanceParams struct {\n\tAmount int64\n}\n";
        write_file(
            root.path(),
            "builtin/v9/market/types.go",
            &format!("package market\n\n{}", params),
        );
        write_file(
            root.path(),
            "builtin/v9/miner/types.go",
            &format!("package miner\n\n{}", params),
        );
        let config = GenConfig::new()
            .package(PendingPackage::builtin("miner", 9))
            .package(PendingPackage::builtin("market", 9))
            .rename("WithdrawBalanceParams", "market", "MarketWithdrawBalanceParams")
            .rename("WithdrawBalanceParams", "miner", "MinerWithdrawBalanceParams");

        let out = generator(root.path(), config).render().unwrap();
        assert!(out.contains("type MarketWithdrawBalanceParams = market.WithdrawBalanceParams\n"));
        assert!(out.contains("type MinerWithdrawBalanceParams = miner.WithdrawBalanceParams\n"));
        assert!(!out.contains("type WithdrawBalanceParams ="));
        assert!(out.find("////////// market").unwrap() < out.find("////////// miner").unwrap());
    }

    #[test]
    fn test_values_and_excluded_files() {
        let root = TempDir::new().unwrap();
        write_file(
            root.path(),
            "builtin/v9/verifreg/verifreg.go",
            "package verifreg\n\nconst (\n\tNoAllocationID = AllocationId(0)\n\tMaxAllocationID = AllocationId(1<<63 - 1)\n)\n\ntype AllocationId uint64\n",
        );
        write_file(
            root.path(),
            "builtin/v9/verifreg/cbor_gen.go",
            "package verifreg\n\ntype Generated struct{}\n",
        );
        write_file(
            root.path(),
            "builtin/v9/verifreg/verifreg_test.go",
            "package verifreg\n\nfunc TestHelper() {}\n",
        );
        write_file(
            root.path(),
            "builtin/v9/verifreg/invariants.go",
            "package verifreg\n\nfunc CheckStateInvariants() {}\n",
        );
        write_file(
            root.path(),
            "builtin/v9/verifreg/verifreg_methods.go",
            "package verifreg\n\ntype MethodTable struct{}\n",
        );
        let config = GenConfig {
            packages: vec![PendingPackage::builtin("verifreg", 9)],
            ..GenConfig::state_types(9)
        };

        let out = generator(root.path(), config).render().unwrap();
        assert!(out.contains("type AllocationId = verifreg.AllocationId\n"));
        assert!(out.contains("const NoAllocationID = verifreg.NoAllocationID\n"));
        assert!(!out.contains("MaxAllocationID"));
        assert!(!out.contains("Generated"));
        assert!(!out.contains("TestHelper"));
        assert!(!out.contains("CheckStateInvariants"));
        assert!(!out.contains("MethodTable"));
    }

    #[cfg(unix)]
    #[test]
    fn test_format_failure_leaves_destination_untouched() {
        let root = TempDir::new().unwrap();
        write_file(
            root.path(),
            "builtin/v9/market/market.go",
            "package market\n\ntype Foo struct{}\n",
        );
        let dst = root.path().join("types_gen.go");
        fs::write(&dst, "previous\n").unwrap();

        let err = generator(
            root.path(),
            GenConfig::new().package(PendingPackage::builtin("market", 9)),
        )
        .formatter(Formatter::External("false".into()))
        .generate(&dst)
        .unwrap_err();
        assert!(matches!(err, Error::Formatter { .. }));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "previous\n");
    }

    #[test]
    fn test_parse_failure_leaves_destination_untouched() {
        let root = TempDir::new().unwrap();
        write_file(
            root.path(),
            "builtin/v8/paych/paych.go",
            "package paych\n\ntype Broken struct {\n",
        );
        let dst = root.path().join("types_gen.go");
        fs::write(&dst, "previous\n").unwrap();

        let config = GenConfig::new().package(PendingPackage::builtin("paych", 8));
        let err = generator(root.path(), config).generate(&dst).unwrap_err();
        assert!(matches!(err, Error::Lex { .. } | Error::Parse { .. }));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "previous\n");
    }

    #[test]
    fn test_missing_package_is_resolution_error() {
        let root = TempDir::new().unwrap();
        let dst = root.path().join("types_gen.go");
        let config = GenConfig::new().package(PendingPackage::builtin("miner", 9));
        let err = generator(root.path(), config).generate(&dst).unwrap_err();
        assert!(matches!(err, Error::PackageNotFound { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let root = TempDir::new().unwrap();
        write_file(
            root.path(),
            "builtin/v9/miner/b.go",
            "package miner\n\ntype Zeta struct{}\n\nfunc NewZeta() *Zeta { return nil }\n",
        );
        write_file(
            root.path(),
            "builtin/v9/miner/a.go",
            "package miner\n\ntype Alpha = Zeta\n",
        );
        let dst = root.path().join("types_gen.go");
        let gen = generator(
            root.path(),
            GenConfig::new().package(PendingPackage::builtin("miner", 9)),
        );

        assert_eq!(gen.generate(&dst).unwrap(), WriteOutcome::Created);
        let first = fs::read_to_string(&dst).unwrap();
        assert_eq!(gen.generate(&dst).unwrap(), WriteOutcome::Unchanged);
        assert!(gen.check(&dst).is_ok());
        assert_eq!(gen.render().unwrap(), first);
        assert!(first.contains(
            "type Alpha = miner.Alpha\ntype Zeta = miner.Zeta\nvar NewZeta = miner.NewZeta\n"
        ));
    }

    #[test]
    fn test_check_reports_stale() {
        let root = TempDir::new().unwrap();
        write_file(
            root.path(),
            "builtin/v9/market/market.go",
            "package market\n\ntype Foo struct{}\n",
        );
        let dst = root.path().join("types_gen.go");
        fs::write(&dst, "stale\n").unwrap();
        let gen = generator(
            root.path(),
            GenConfig::new().package(PendingPackage::builtin("market", 9)),
        );
        assert!(matches!(gen.check(&dst), Err(Error::Stale { .. })));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "stale\n");
    }

    #[test]
    fn test_api_generator() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "gateway.go",
            r#"package gateway

import (
	"context"
	"io"

	"github.com/filecoin-project/go-address"
)

type IProofClient interface {
	ListConnectedMiners(ctx context.Context) ([]address.Address, error) //perm:admin
}

type IGateway interface {
	IProofClient
}

type empty interface {
	Close() error
}
"#,
        );
        write_file(
            dir.path(),
            PROXY_OUTPUT_FILE,
            "package gateway\n\ntype Stale interface {\n\tOld() //perm:read\n}\n",
        );

        let out = ApiGenerator::new(dir.path()).render().unwrap();
        assert_eq!(
            out,
            r#"// Code generated by github.com/filecoin-project/venus/venus-devtool/api-gen. DO NOT EDIT.
package gateway

import (
	"context"

	"github.com/filecoin-project/go-address"
)

type IProofClientStruct struct {
	Internal struct {
		ListConnectedMiners func(ctx context.Context) ([]address.Address, error) `perm:"admin"`
	}
}

func (s *IProofClientStruct) ListConnectedMiners(p0 context.Context) ([]address.Address, error) {
	return s.Internal.ListConnectedMiners(p0)
}

type IGatewayStruct struct {
	IProofClientStruct
}
"#
        );
    }

    #[test]
    fn test_api_generator_missing_perm() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "api.go",
            "package api\n\ntype IFoo interface {\n\tBar() error\n}\n",
        );
        let dst = dir.path().join(PROXY_OUTPUT_FILE);
        let err = ApiGenerator::new(dir.path())
            .package("client")
            .generate(&dst)
            .unwrap_err();
        assert!(matches!(err, Error::MissingPermission { .. }));
        assert!(!dst.exists());
    }
}
