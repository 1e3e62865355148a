use clap::Parser;
use ims_air_cleaner::cli::{run, Cli};
use ims_air_cleaner::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
