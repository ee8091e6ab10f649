//! `wardrobe` command-line entry point.

use anyhow::Context;
use clap::Parser;

use wardrobe_desktop::cli::{self, Cli};
use wardrobe_desktop::{WardrobeApp, WardrobeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wardrobe_observability::init();

    let args = Cli::parse();

    let mut config = WardrobeConfig::from_env().context("failed to resolve configuration")?;
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    tracing::debug!(path = %config.db_path().display(), "opening closet");

    let app = WardrobeApp::open(&config).await;

    let mut stdout = std::io::stdout().lock();
    cli::run(args.command, &app, &mut stdout).await
}
