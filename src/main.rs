use anyhow::Result;
use clap::Parser;
use tracing::error;

use gradboard::{run, utils, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);

    utils::validate_args(&args)?;

    if let Err(e) = run(&args) {
        error!(action = "error", component = "main", error = %e, "Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
