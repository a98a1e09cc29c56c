use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mshare",
    about = "Compact, URL-safe molecular structure sharing",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a molecule document into a share segment
    #[command(visible_alias = "e")]
    Encode(EncodeArgs),

    /// Decode a share segment back into a molecule document
    #[command(visible_alias = "d")]
    Decode(DecodeArgs),

    /// Show format and header metadata of a share segment
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Input molecule document (JSON), stdin if omitted
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Password-protect the segment
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Title to embed, overriding the document title
    #[arg(short, long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Drop bond records; decoders re-derive them by distance
    #[arg(long)]
    pub omit_bonds: bool,

    /// Disable spatial reordering and delta coding
    #[arg(long)]
    pub no_delta: bool,

    /// Low coordinate bits to discard for a smaller segment
    #[arg(long, value_name = "BITS", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=8))]
    pub precision_drop: u8,

    /// Print a full share URL with this base instead of the bare segment
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Share segment, or a full share URL containing one
    #[arg(value_name = "SEGMENT")]
    pub segment: String,

    /// Password for encrypted segments
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Share segment, or a full share URL containing one
    #[arg(value_name = "SEGMENT")]
    pub segment: String,

    /// Password for encrypted segments
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
