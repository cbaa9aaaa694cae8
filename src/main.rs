use std::path::PathBuf;

use clap::Parser;
use marmoset_bids::convert;
use marmoset_bids::layout::DatasetLayout;
use marmoset_bids::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;

    if !cli.dataset_root.is_dir() {
        return Err(ToolError::MissingInput(cli.dataset_root));
    }

    let layout = DatasetLayout::new(cli.dataset_root);
    convert::convert_dataset(&layout)?;
    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert the NA216 spreadsheet metadata into BIDS tabular files."
)]
struct Cli {
    /// Dataset root containing the `invivo/` and `exvivo/` directories.
    dataset_root: PathBuf,
}
