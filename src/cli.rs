//! CLI surface (§6), built on `clap`'s derive API.
//!
//! The teacher's `Cargo.toml` already depends on `clap` but `main.rs` never
//! used it (a hardcoded `File::open("smb.nes")`); this is where it gets
//! wired up.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "nesdecomp", about = "Static analysis and decompilation of iNES ROM images")]
pub struct Cli {
    /// iNES ROM image to analyze.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory to write output files into.
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Emit an assembly listing (`<stem>.asm`).
    #[arg(short, long)]
    pub disassemble: bool,

    /// Emit decompiled C sources (`<stem>.c` / `<stem>.h`). On by default.
    #[arg(short = 'c', long, default_value_t = true, overrides_with = "no_decompile")]
    pub decompile: bool,

    /// Suppress C emission even though it defaults to on.
    #[arg(long)]
    pub no_decompile: bool,

    /// Increase log verbosity; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Resolved "should we decompile" flag, honoring `--no-decompile`.
    pub fn should_decompile(&self) -> bool {
        self.decompile && !self.no_decompile
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
