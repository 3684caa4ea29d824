//! Command line surfaces of the two viewers

use std::path::PathBuf;

use clap::{Args, Parser};
use log::LevelFilter;

/// Options shared by both viewers.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LevelFilter>,

    /// Layout height of images that have not been decoded yet
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub fallback_height: Option<u32>,
}

/// Scroll through comic pages as one continuous strip.
#[derive(Debug, Parser)]
#[command(name = "comic-viewer", version)]
pub struct ComicArgs {
    /// Converter turning an image on stdin into farbfeld on stdout
    #[arg(long, value_name = "PROGRAM")]
    pub converter: Option<PathBuf>,

    /// Image files, top to bottom
    #[arg(value_name = "ITEM", required = true)]
    pub items: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Scroll through web-comic panels decoded by a helper program.
#[derive(Debug, Parser)]
#[command(name = "webtoon-viewer", version)]
pub struct WebtoonArgs {
    /// Program called with one item handle, writing farbfeld to stdout
    #[arg(value_name = "HELPER")]
    pub helper: PathBuf,

    /// Item handles passed to the helper, top to bottom
    #[arg(value_name = "ITEM", required = true)]
    pub items: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}
