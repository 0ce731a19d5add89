use anyhow::Result;
use clap::Parser;
use tracing::error;

use topviews::{app, utils, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    let engine = app::build_engine(&args)?;

    match app::run_command(&engine, &args).and_then(|result| app::render(&result, args.format)) {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!(action = "complete", component = "command", error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
