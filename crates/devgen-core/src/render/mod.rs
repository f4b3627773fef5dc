//! Source text renderers.
//!
//! Renderers produce unformatted text; every result goes through
//! [`crate::format::Formatter`] before it is written anywhere.
//!
//! - [`AliasRenderer`]: alias declarations for collected package names
//! - [`ProxyRenderer`]: RPC proxy structs with forwarding methods

mod alias;
mod proxy;

use std::fmt::Write as FmtWrite;

pub use alias::AliasRenderer;
pub use proxy::{ProxyInterface, ProxyRenderer, PROXY_SUFFIX};

/// Writes the generated-file header and the package clause
fn write_header(w: &mut impl FmtWrite, generator: &str, package: &str) -> std::fmt::Result {
    writeln!(w, "// Code generated by {}. DO NOT EDIT.", generator)?;
    writeln!(w, "package {}", package)?;
    writeln!(w)
}

/// The name an import is referred to by when it has no explicit alias.
///
/// Major-version suffixes (`/v2`, `.v3`) and the conventional `go-`/`-go`
/// affixes are dropped; for dashed names the last segment wins
/// (`go-state-types` is referred to as `types`).
pub fn default_import_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }
    if let Some((base, suffix)) = last.rsplit_once('.') {
        if is_major_version(suffix) {
            last = base;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.strip_suffix("-go").unwrap_or(last);
    let last = last.rsplit(['-', '.']).next().unwrap_or(last);
    last.to_string()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_import_name() {
        assert_eq!(default_import_name("context"), "context");
        assert_eq!(default_import_name("encoding/json"), "json");
        assert_eq!(
            default_import_name("github.com/filecoin-project/go-state-types/builtin/v9/market"),
            "market"
        );
        assert_eq!(
            default_import_name("github.com/filecoin-project/go-address"),
            "address"
        );
        assert_eq!(default_import_name("github.com/ipfs/go-cid"), "cid");
        assert_eq!(default_import_name("github.com/urfave/cli/v2"), "cli");
        assert_eq!(default_import_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(
            default_import_name("github.com/filecoin-project/go-state-types"),
            "types"
        );
    }

    #[test]
    fn test_write_header() {
        let mut out = String::new();
        write_header(&mut out, "example.com/gen", "types").unwrap();
        assert_eq!(
            out,
            "// Code generated by example.com/gen. DO NOT EDIT.\npackage types\n\n"
        );
    }
}
