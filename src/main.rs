use anyhow::Result;
use clap::Parser;

use parley::{cli::Cli, runtime::Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let orchestrator = Orchestrator::new(cli)?;
    let code = orchestrator.run().await?;

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
