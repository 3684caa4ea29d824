use anyhow::Result;
use clap::Parser;

use stripview::app::run_webtoon_viewer;
use stripview::cli::WebtoonArgs;

fn main() -> Result<()> {
    run_webtoon_viewer(WebtoonArgs::parse())
}
