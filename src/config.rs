//! Command-line configuration.

use crate::bench::DEFAULT_ITERATIONS;
use crate::dispatch::DEFAULT_WORKERS;
use crate::errors::*;
use clap::error::ErrorKind as ClapErrorKind;
use clap::{Parser, ValueEnum};
use log::warn;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str =
    "Usage: <program name> <input bmp file name> <output bmp file name> <radius>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Row ranges on a fixed pool of host threads
    Threaded,
    /// One device thread per pixel
    Wide,
    /// Both, failing if their outputs differ
    Compare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKind {
    /// Device emulated on host threads
    Host,
    /// First CUDA GPU
    Cuda,
}

#[derive(Parser, Debug)]
#[command(name = "smooth-filter-bench", version)]
#[command(about = "Box-blur benchmark comparing threaded and per-pixel parallel dispatch")]
struct Cli {
    /// Input image
    input: PathBuf,

    /// Output image
    output: PathBuf,

    /// Neighborhood radius; anything but a non-negative integer means 0
    #[arg(allow_hyphen_values = true)]
    radius: String,

    #[arg(long, value_enum, default_value_t = Strategy::Threaded)]
    strategy: Strategy,

    /// Worker threads of the threaded strategy
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    threads: usize,

    /// Timed passes over the image
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Threads per block of the wide strategy [default: device maximum]
    #[arg(long)]
    block_size: Option<u32>,

    /// Device running the wide strategy
    #[arg(long, value_enum, default_value_t = DeviceKind::Host)]
    device: DeviceKind,

    /// Memory of the host-emulated device in bytes [default: unlimited]
    #[arg(long)]
    device_memory: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub radius: usize,
    pub strategy: Strategy,
    pub threads: usize,
    pub iterations: usize,
    pub block_size: Option<u32>,
    pub device: DeviceKind,
    pub device_memory: Option<usize>,
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Config),
    /// Print the text and exit successfully.
    Usage(String),
}

/// Radius from its command-line text. Anything that does not parse as a
/// non-negative whole number after trimming whitespace gives 0.
pub fn parse_radius(arg: &str) -> usize {
    arg.trim().parse().unwrap_or(0)
}

impl Config {
    pub fn new(input: PathBuf, output: PathBuf, radius: usize) -> Self {
        Self {
            input,
            output,
            radius,
            strategy: Strategy::Threaded,
            threads: DEFAULT_WORKERS,
            iterations: DEFAULT_ITERATIONS,
            block_size: None,
            device: DeviceKind::Host,
            device_memory: None,
        }
    }

    /// Parses program arguments, the first being the program name.
    ///
    /// A wrong number of positionals is not an error: it yields the usage
    /// line, which the program prints before exiting with status 0.
    pub fn from_args<I, T>(args: I) -> Invocation
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Invocation::Run(cli.into()),
            Err(e) => match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                    Invocation::Usage(e.to_string())
                }
                _ => {
                    warn!("{}", e.to_string().trim_end());
                    Invocation::Usage(USAGE.to_string())
                }
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            bail!(ErrorKind::InvalidConfig("--threads must be positive".into()));
        }
        if self.iterations == 0 {
            bail!(ErrorKind::InvalidConfig("--iterations must be positive".into()));
        }
        if self.block_size == Some(0) {
            bail!(ErrorKind::InvalidConfig("--block-size must be positive".into()));
        }
        Ok(())
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            radius: parse_radius(&cli.radius),
            strategy: cli.strategy,
            threads: cli.threads,
            iterations: cli.iterations,
            block_size: cli.block_size,
            device: cli.device,
            device_memory: cli.device_memory,
            ..Config::new(cli.input, cli.output, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Config {
        match Config::from_args(args) {
            Invocation::Run(config) => config,
            Invocation::Usage(text) => panic!("unexpected usage: {}", text),
        }
    }

    #[test]
    fn three_positionals() {
        let config = run(&["prog", "in.bmp", "out.bmp", "5"]);
        assert_eq!(
            config,
            Config::new("in.bmp".into(), "out.bmp".into(), 5)
        );
    }

    #[test]
    fn wrong_argument_count_shows_usage() {
        for args in [
            &["prog"][..],
            &["prog", "in.bmp", "out.bmp"][..],
            &["prog", "in.bmp", "out.bmp", "3", "extra"][..],
        ] {
            assert_eq!(
                Config::from_args(args),
                Invocation::Usage(USAGE.to_string())
            );
        }
    }

    #[test]
    fn malformed_radius_is_zero() {
        assert_eq!(run(&["prog", "a", "b", "abc"]).radius, 0);
        assert_eq!(run(&["prog", "a", "b", "-4"]).radius, 0);
        assert_eq!(run(&["prog", "a", "b", " 7"]).radius, 7);
        assert_eq!(run(&["prog", "a", "b", "5abc"]).radius, 0);
        assert_eq!(parse_radius("3.5"), 0);
    }

    #[test]
    fn options() {
        let config = run(&[
            "prog",
            "a",
            "b",
            "2",
            "--strategy",
            "wide",
            "--block-size",
            "128",
            "--iterations",
            "3",
            "--device-memory",
            "4096",
        ]);
        assert_eq!(config.strategy, Strategy::Wide);
        assert_eq!(config.block_size, Some(128));
        assert_eq!(config.iterations, 3);
        assert_eq!(config.device_memory, Some(4096));
        assert_eq!(config.threads, DEFAULT_WORKERS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_counts() {
        let mut config = Config::new("a".into(), "b".into(), 1);
        config.threads = 0;
        assert!(config.validate().is_err());
        config.threads = 4;
        config.iterations = 0;
        assert!(config.validate().is_err());
    }
}
