use anyhow::Result;
use clap::Parser;

use scanlink::cli::commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let code = cli.run()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
