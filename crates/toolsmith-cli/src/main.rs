use clap::Parser;
use toolsmith_cli::{CliArgs, ToolsmithCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let cli = ToolsmithCli::from_args("toolsmith", &args)?;
    cli.run(args).await?;
    Ok(())
}
