//! # devgen-core
//!
//! Source generators for the venus developer tooling.
//!
//! This crate provides the core functionality for:
//! - Parsing the declarations of upstream source packages
//! - Collecting exported type, function and constant names into alias files
//! - Generating RPC proxy structs from annotated interfaces
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`source`]: Lexer, declaration parser and package scanning
//! - [`collect`]: Declaration classification and name collection
//! - [`locate`]: Import path to directory resolution
//! - [`render`]: Alias and proxy renderers
//! - [`format`]: Canonicalization of generated text
//! - [`output`]: Atomic, change-aware file writes
//! - [`generate`]: The end-to-end generators
//! - [`config`]: Generator tables
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use devgen_core::{CheckoutLocator, GenConfig, StateTypeGenerator, LATEST_ACTORS_VERSION};
//! use std::path::Path;
//!
//! let locator = CheckoutLocator::new(
//!     "github.com/filecoin-project/go-state-types",
//!     "../go-state-types",
//! );
//! let generator =
//!     StateTypeGenerator::new(GenConfig::state_types(LATEST_ACTORS_VERSION), locator);
//! generator.generate(Path::new("venus-shared/types/state_types_gen.go"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`PackageLocator`]: Customize where package sources are found
//! - [`Formatter`]: Choose the canonicalization applied before writing

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod collect;
pub mod config;
pub mod error;
pub mod format;
pub mod generate;
pub mod locate;
pub mod output;
pub mod render;
pub mod source;

// Re-export primary types for convenience
pub use collect::{classify, collect_names, Decision, Exclusion, NameKind, PackageNames};
pub use config::{GenConfig, PendingPackage, LATEST_ACTORS_VERSION};
pub use error::{Error, ErrorKind, Result};
pub use format::Formatter;
pub use generate::{ApiGenerator, StateTypeGenerator};
pub use locate::{CheckoutLocator, ModuleCacheLocator, PackageLocator};
pub use output::WriteOutcome;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
