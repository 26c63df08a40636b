mod filter;
mod headers;
mod info;

use std::fs::File;
use std::io::stderr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use ch10::{FileMode, PacketStream};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show packet counts by data type and channel for a Chapter 10 file.
    Info {
        /// Input Chapter 10 file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
    /// List packet headers.
    Headers {
        /// Only list headers for these channel ids or channel id ranges, e.g., 1-4,8.
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        channels: Vec<String>,

        /// Output format. Json is written as one object per line.
        #[arg(short, long, default_value = "text")]
        format: info::Format,

        /// Input Chapter 10 file
        input: PathBuf,
    },
    /// Copy packets for selected channels to a new file.
    Filter {
        /// Include these channel ids or channel id ranges.
        ///
        /// This accepts a CSV of channel ids as well as ranges of the format <start>-<end>
        /// where start and end are inclusive. For example, you can specify
        /// --include 0,1,2,3,4,5,10 or --include 0-5,10
        ///
        /// If used with --exclude, values are first included, then excluded.
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        include: Vec<String>,

        /// Exclude these channel ids or channel id ranges.
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        exclude: Vec<String>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "filtered.ch10", value_name = "path")]
        output: PathBuf,

        /// Input Chapter 10 file.
        input: PathBuf,
    },
}

/// Parse a list of channel ids and inclusive `<start>-<end>` ranges.
fn parse_channels(list: &[String]) -> Result<Vec<u16>> {
    let rx = regex::Regex::new(r"^(?:(\d+)|(\d+)-(\d+))$").expect("regex to compile");
    let parse = |s: &str| {
        s.parse::<u16>()
            .map_err(|_| anyhow!("invalid channel id {s:?}; must be 0-{}", u16::MAX))
    };
    let mut values = Vec::default();
    for (i, s) in list.iter().enumerate() {
        let Some(cap) = rx.captures(s.trim()) else {
            bail!("invalid number or range {s:?} at {i}");
        };

        if let Some(x) = cap.get(1) {
            values.push(parse(x.as_str())?);
        } else {
            let start = parse(&cap[2])?;
            let end = parse(&cap[3])?;
            if start >= end {
                bail!("invalid range {s:?}")
            }
            values.extend(start..=end);
        }
    }

    Ok(values)
}

fn open(input: &Path) -> Result<PacketStream> {
    PacketStream::open(input, FileMode::Read).with_context(|| format!("opening {input:?}"))
}

/// Exit code for the first stream error in the chain of `err`, or 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<ch10::Error>())
        .map(|e| e.status().exit_code())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Info { input, format } => info::info(&mut open(input)?, input, format),
        Commands::Headers {
            channels,
            format,
            input,
        } => {
            let channels = parse_channels(channels)?;
            debug!("listing channels {:?}", channels);
            headers::headers(&mut open(input)?, &channels, format)
        }
        Commands::Filter {
            include,
            exclude,
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            let include = parse_channels(include)?;
            let exclude = parse_channels(exclude)?;
            debug!("including channels {:?}", include);
            debug!("excluding channels {:?}", exclude);

            let mut stream = open(input)?;
            let dest = File::create(output)
                .with_context(|| format!("failed to create output {output:?}"))?;
            let count = filter::filter(&mut stream, dest, &include, &exclude)?;
            info!("wrote {count} packets to {output:?}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("CH10_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(exit_code(&err))
        }
    }
}
