//! Alias declarations for collected package names.

use super::{default_import_name, write_header};
use crate::collect::PackageNames;
use crate::config::GenConfig;
use std::fmt::Write as FmtWrite;

/// Renders one group of alias declarations per package.
///
/// The output is laid out as: header, package clause, a single import block
/// naming every source package, then per package a separator comment
/// followed by `type`, `var` and `const` lines in collected order.
#[derive(Debug)]
pub struct AliasRenderer<'a> {
    config: &'a GenConfig,
    packages: &'a [PackageNames],
}

impl<'a> AliasRenderer<'a> {
    /// Creates a renderer over collected names, in the order given
    pub fn new(config: &'a GenConfig, packages: &'a [PackageNames]) -> Self {
        Self { config, packages }
    }

    /// Renders to a string
    pub fn render(&self) -> String {
        let mut output = String::new();
        self.write_to(&mut output).expect("String write cannot fail");
        output
    }

    /// Writes the unformatted source to `w`
    pub fn write_to(&self, w: &mut impl FmtWrite) -> std::fmt::Result {
        write_header(w, &self.config.generator, &self.config.target_package)?;
        self.write_imports(w)?;
        for names in self.packages {
            self.write_group(w, names)?;
        }
        Ok(())
    }

    fn write_imports(&self, w: &mut impl FmtWrite) -> std::fmt::Result {
        writeln!(w, "import (")?;
        for names in self.packages {
            let Some(package) = self.config.find_package(&names.package) else {
                continue;
            };
            if default_import_name(&package.path) == package.name {
                writeln!(w, "\t\"{}\"", package.path)?;
            } else {
                writeln!(w, "\t{} \"{}\"", package.name, package.path)?;
            }
        }
        writeln!(w, ")")?;
        writeln!(w)
    }

    fn write_group(&self, w: &mut impl FmtWrite, names: &PackageNames) -> std::fmt::Result {
        let pkg = names.package.as_str();
        writeln!(w, "////////// {} //////////", pkg)?;

        for ty in &names.types {
            let emitted = self.config.rename_for(ty, pkg).unwrap_or(ty.as_str());
            writeln!(w, "type {} = {}.{}", emitted, pkg, ty)?;
        }
        for func in &names.funcs {
            writeln!(w, "var {} = {}.{}", func, pkg, func)?;
        }
        for value in &names.values {
            writeln!(w, "const {} = {}.{}", value, pkg, value)?;
        }

        writeln!(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PendingPackage;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_groups() {
        let config = GenConfig::new()
            .generator("example.com/gen")
            .package(PendingPackage::builtin("market", 9))
            .package(PendingPackage {
                name: "other".into(),
                path: "example.com/other/v2/impl".into(),
                version: 2,
            })
            .rename("WithdrawBalanceParams", "market", "MarketWithdrawBalanceParams");
        let packages = vec![
            PackageNames {
                package: "market".into(),
                types: vec!["DealProposal".into(), "WithdrawBalanceParams".into()],
                funcs: vec!["NewLabel".into()],
                values: vec!["NoAllocationID".into()],
            },
            PackageNames {
                package: "other".into(),
                types: vec!["WithdrawBalanceParams".into()],
                ..PackageNames::default()
            },
        ];

        let out = AliasRenderer::new(&config, &packages).render();
        assert_eq!(
            out,
            r#"// Code generated by example.com/gen. DO NOT EDIT.
package types

import (
	"github.com/filecoin-project/go-state-types/builtin/v9/market"
	other "example.com/other/v2/impl"
)

////////// market //////////
type DealProposal = market.DealProposal
type MarketWithdrawBalanceParams = market.WithdrawBalanceParams
var NewLabel = market.NewLabel
const NoAllocationID = market.NoAllocationID

////////// other //////////
type WithdrawBalanceParams = other.WithdrawBalanceParams

"#
        );
    }
}
