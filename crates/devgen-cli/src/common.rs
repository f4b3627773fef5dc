//! Flags and setup shared by the generator binaries.

use clap::{Args, ValueEnum};
use devgen_core::{Formatter, WriteOutcome};
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// How generated source is canonicalized
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatterChoice {
    /// Built-in import pruning and whitespace normalization
    Builtin,
    /// Built-in pass followed by an external formatter program
    Gofmt,
}

/// Output options common to every generator
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Formatter applied before writing
    #[arg(long, value_enum, default_value = "builtin")]
    pub formatter: FormatterChoice,

    /// Program run when --formatter=gofmt
    #[arg(long, env = "GOFMT", default_value = "gofmt")]
    pub gofmt: String,

    /// Fail if the destination is out of date instead of writing it
    #[arg(long)]
    pub check: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl OutputArgs {
    pub fn formatter(&self) -> Formatter {
        match self.formatter {
            FormatterChoice::Builtin => Formatter::Builtin,
            FormatterChoice::Gofmt => Formatter::External(self.gofmt.clone()),
        }
    }

    pub fn init_tracing(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
            .with_target(false)
            .init();
    }
}

pub fn report(dst: &Path, outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Created => info!("Created {}", dst.display()),
        WriteOutcome::Updated => info!("Updated {}", dst.display()),
        WriteOutcome::Unchanged => info!("{} unchanged", dst.display()),
    }
}
