use anyhow::Result;
use confide::cli::start;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments, initialize tracing, and get the action to run.
    let action = start()?;

    action.execute().await
}
