use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cellexec",
    about = "Run the fenced code found in workbook cells and record each result",
    version
)]
pub struct Cli {
    /// Settings file (KEY=VALUE lines). Defaults to the per-user config dir.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
