mod cli;

use anyhow::Result;
use cellexec::{batch::BatchRunner, config::Config};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // CLI path overrides the default rc location
    let cfg = match &args.config {
        Some(path) => Config::load_explicit(path)?,
        None => Config::load()?,
    };
    let pipeline = cfg.pipeline()?;

    BatchRunner::new(&pipeline).run()
}
