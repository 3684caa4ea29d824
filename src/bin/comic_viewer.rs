use anyhow::Result;
use clap::Parser;

use stripview::app::run_comic_viewer;
use stripview::cli::ComicArgs;

fn main() -> Result<()> {
    run_comic_viewer(ComicArgs::parse())
}
