//! Mapping import paths to package directories.
//!
//! [`PackageLocator`] is the seam between the generator and wherever the
//! upstream sources live. Two implementations are provided: a plain
//! checkout of the upstream module, and a module download cache laid out as
//! `<cache>/<escaped module path>@<version>/...`.

use crate::config::PendingPackage;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolves a pending package to the directory holding its sources
pub trait PackageLocator {
    /// Returns the directory of `package`
    fn locate(&self, package: &PendingPackage) -> Result<PathBuf>;
}

/// Returns the import path relative to `module`, or `None` if it lies outside
fn module_relative<'a>(module: &str, import_path: &'a str) -> Option<&'a str> {
    let rest = import_path.strip_prefix(module)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn existing_dir(import_path: &str, dir: PathBuf) -> Result<PathBuf> {
    if dir.is_dir() {
        debug!("Located {} at {}", import_path, dir.display());
        Ok(dir)
    } else {
        Err(Error::package_not_found(
            import_path,
            format!("'{}' is not a directory", dir.display()),
        ))
    }
}

/// Packages inside a local checkout of one module
#[derive(Debug, Clone)]
pub struct CheckoutLocator {
    module: String,
    root: PathBuf,
}

impl CheckoutLocator {
    /// `root` is the checkout directory of `module`
    pub fn new(module: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            root: root.into(),
        }
    }
}

impl PackageLocator for CheckoutLocator {
    fn locate(&self, package: &PendingPackage) -> Result<PathBuf> {
        let rest = module_relative(&self.module, &package.path).ok_or_else(|| {
            Error::package_not_found(
                &package.path,
                format!("not part of module {}", self.module),
            )
        })?;
        existing_dir(&package.path, self.root.join(rest))
    }
}

/// Packages inside a module download cache
#[derive(Debug, Clone)]
pub struct ModuleCacheLocator {
    cache_dir: PathBuf,
    module: String,
    version: Option<String>,
}

impl ModuleCacheLocator {
    /// Looks up `module` under `cache_dir`, picking the newest cached version
    pub fn new(cache_dir: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            module: module.into(),
            version: None,
        }
    }

    /// Pins the module version instead of picking the newest one
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Directory of the module at the configured or newest cached version
    pub fn module_dir(&self) -> Result<PathBuf> {
        let escaped = escape_module_path(&self.module);
        if let Some(version) = &self.version {
            return Ok(self.cache_dir.join(format!("{}@{}", escaped, version)));
        }

        let (parent, base) = match escaped.rsplit_once('/') {
            Some((parent, base)) => (self.cache_dir.join(parent), base.to_string()),
            None => (self.cache_dir.clone(), escaped.clone()),
        };
        let prefix = format!("{}@", base);
        let newest = newest_version(&parent, &prefix).ok_or_else(|| {
            Error::package_not_found(
                &self.module,
                format!("no cached version in {}", parent.display()),
            )
        })?;
        debug!("Using {}@{} from module cache", self.module, newest);
        Ok(parent.join(format!("{}{}", prefix, newest)))
    }
}

impl PackageLocator for ModuleCacheLocator {
    fn locate(&self, package: &PendingPackage) -> Result<PathBuf> {
        let rest = module_relative(&self.module, &package.path).ok_or_else(|| {
            Error::package_not_found(
                &package.path,
                format!("not part of module {}", self.module),
            )
        })?;
        let module_dir = self.module_dir()?;
        existing_dir(&package.path, module_dir.join(rest))
    }
}

fn newest_version(parent: &Path, prefix: &str) -> Option<String> {
    WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            let version = name.strip_prefix(prefix)?;
            let parsed = ModuleVersion::parse(version)?;
            Some((parsed, version.to_string()))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, version)| version)
}

/// Escapes upper-case letters the way the module cache stores paths
/// (`Azure` becomes `!azure`).
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// A `vMAJOR.MINOR.PATCH[-pre][+build]` module version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Option<String>,
}

impl ModuleVersion {
    /// Parses a version string such as `v0.9.8` or `v1.2.0-rc1`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('v')?;
        let s = s.split_once('+').map_or(s, |(v, _)| v);
        let (core, pre) = match s.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (s, None),
        };
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
