use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use transcript_actions::api::start_api_server;
use transcript_actions::cli::{Cli, Commands};
use transcript_actions::pipeline::model::ModelRegistry;
use transcript_actions::pipeline::ActionPipeline;

fn main() -> Result<()> {
    let cli = Cli::parse();
    transcript_actions::init_tracing(&cli.log_level);

    // The providers use a blocking HTTP client, which must be built and
    // dropped outside the async runtime.
    let config = cli.app_config()?;
    let pipeline = ActionPipeline::from_config(&config, &ModelRegistry::with_builtin())?;
    tracing::info!(
        provider = %pipeline.model_info().provider,
        model = %pipeline.model_info().model,
        "Pipeline configured"
    );

    match cli.command {
        Commands::Run { input } => {
            let summary = pipeline.run_input(&input)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Serve { addr } => {
            let pipeline = Arc::new(pipeline);
            tokio::runtime::Runtime::new()
                .context("Failed to start tokio runtime")?
                .block_on(serve(Arc::clone(&pipeline), addr))?;
        }
    }

    Ok(())
}

async fn serve(pipeline: Arc<ActionPipeline>, addr: SocketAddr) -> Result<()> {
    let mut server = start_api_server(pipeline, addr)
        .await
        .map_err(anyhow::Error::msg)?;
    println!("Listening on http://{}", server.addr());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    server.shutdown();
    server.wait().await;
    Ok(())
}
