//! api-gen - Generate RPC proxy structs from annotated interfaces
//!
//! Every exported interface of the scanned package becomes a struct whose
//! `Internal` field holds one function per method, tagged with the
//! method's `perm:` annotation, plus forwarding methods.

mod common;

use anyhow::{bail, Context, Result};
use clap::Parser;
use common::{report, OutputArgs};
use devgen_core::ApiGenerator;
use devgen_core::generate::PROXY_OUTPUT_FILE;
use std::path::PathBuf;
use tracing::info;

/// Generate RPC proxy structs
#[derive(Parser, Debug)]
#[command(name = "api-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Package directory holding the interfaces
    #[arg(long)]
    src: PathBuf,

    /// Destination file (default: proxy_gen.go inside --src)
    #[arg(long)]
    dst: Option<PathBuf>,

    /// Package clause of the generated file (default: the scanned package)
    #[arg(long)]
    package: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_tracing();

    if !cli.src.is_dir() {
        bail!("Source path is not a directory: {}", cli.src.display());
    }
    let dst = cli
        .dst
        .clone()
        .unwrap_or_else(|| cli.src.join(PROXY_OUTPUT_FILE));

    let mut generator = ApiGenerator::new(&cli.src).formatter(cli.output.formatter());
    if let Some(package) = &cli.package {
        generator = generator.package(package);
    }

    if cli.output.check {
        generator
            .check(&dst)
            .with_context(|| format!("Failed to check {}", dst.display()))?;
        info!("{} is up to date", dst.display());
        return Ok(());
    }

    let outcome = generator
        .generate(&dst)
        .with_context(|| format!("Failed to generate proxies into {}", dst.display()))?;
    report(&dst, outcome);
    Ok(())
}
