//! state-type-gen - Alias the builtin actor state types into one package
//!
//! Scans the builtin actor packages of go-state-types, collects their
//! exported types, functions and allow-listed constants, and writes one
//! file of alias declarations.

mod common;

use anyhow::{bail, Context, Result};
use clap::Parser;
use common::{report, OutputArgs};
use devgen_core::config::STATE_TYPES_MODULE;
use devgen_core::{
    CheckoutLocator, GenConfig, ModuleCacheLocator, StateTypeGenerator, LATEST_ACTORS_VERSION,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Generate alias declarations for the builtin actor state types
#[derive(Parser, Debug)]
#[command(name = "state-type-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Destination file
    #[arg(long)]
    dst: PathBuf,

    /// Local checkout of go-state-types (takes precedence over the module cache)
    #[arg(long)]
    source_root: Option<PathBuf>,

    /// Go module cache directory
    #[arg(long, env = "GOMODCACHE")]
    mod_cache: Option<PathBuf>,

    /// go-state-types version to read from the module cache (default: newest cached)
    #[arg(long, env = "DEVGEN_STATE_TYPES_VERSION")]
    module_version: Option<String>,

    /// Actors version for every package not pinned to an older one
    #[arg(long, default_value_t = LATEST_ACTORS_VERSION)]
    actors_version: u32,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_tracing();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = GenConfig::state_types(cli.actors_version);
    debug!(
        "Generating {} packages at actors v{}",
        config.packages.len(),
        cli.actors_version
    );

    let generator = match (&cli.source_root, &cli.mod_cache) {
        (Some(root), _) => {
            info!("Reading sources from checkout {}", root.display());
            StateTypeGenerator::new(config, CheckoutLocator::new(STATE_TYPES_MODULE, root))
        }
        (None, Some(cache)) => {
            info!("Reading sources from module cache {}", cache.display());
            let mut locator = ModuleCacheLocator::new(cache, STATE_TYPES_MODULE);
            if let Some(version) = &cli.module_version {
                locator = locator.version(version);
            }
            StateTypeGenerator::new(config, locator)
        }
        (None, None) => {
            bail!("Either --source-root or --mod-cache (GOMODCACHE) must be specified")
        }
    }
    .formatter(cli.output.formatter());

    if cli.output.check {
        generator
            .check(&cli.dst)
            .with_context(|| format!("Failed to check {}", cli.dst.display()))?;
        info!("{} is up to date", cli.dst.display());
        return Ok(());
    }

    let outcome = generator
        .generate(&cli.dst)
        .with_context(|| format!("Failed to generate {}", cli.dst.display()))?;
    report(&cli.dst, outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([
            "state-type-gen",
            "--dst",
            "types_gen.go",
            "--source-root",
            "/src",
        ])
        .unwrap();
        assert_eq!(cli.actors_version, LATEST_ACTORS_VERSION);
        assert!(!cli.output.check);
        assert!(matches!(
            cli.output.formatter(),
            devgen_core::Formatter::Builtin
        ));
    }

    #[test]
    fn test_run_against_checkout() {
        let root = TempDir::new().unwrap();
        let packages = [
            (8, "paych", "LaneState"),
            (9, "market", "WithdrawBalanceParams"),
            (9, "miner", "WithdrawBalanceParams"),
            (9, "verifreg", "AllocationRequest"),
        ];
        for (version, name, ty) in packages {
            let dir = root.path().join(format!("builtin/v{}/{}", version, name));
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("types.go"),
                format!("package {}\n\ntype {} struct{{}}\n", name, ty),
            )
            .unwrap();
        }
        let dst = root.path().join("state_types_gen.go");
        let args = |check: bool| {
            let mut args = vec![
                "state-type-gen".to_string(),
                "--dst".to_string(),
                dst.display().to_string(),
                "--source-root".to_string(),
                root.path().display().to_string(),
            ];
            if check {
                args.push("--check".to_string());
            }
            Cli::try_parse_from(args).unwrap()
        };

        run(&args(false)).unwrap();
        let out = fs::read_to_string(&dst).unwrap();
        assert!(out.contains("type MarketWithdrawBalanceParams = market.WithdrawBalanceParams\n"));
        assert!(out.contains("type MinerWithdrawBalanceParams = miner.WithdrawBalanceParams\n"));
        assert!(out.contains("type LaneState = paych.LaneState\n"));
        assert!(out.contains("type AllocationRequest = verifreg.AllocationRequest\n"));
        assert!(!out.contains("type WithdrawBalanceParams ="));

        run(&args(true)).unwrap();
        fs::write(&dst, "stale\n").unwrap();
        assert!(run(&args(true)).is_err());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "stale\n");
    }
}
