use clap::Parser;
use tick_relay::cli::{Cli, Commands};
use tick_relay::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Missing or invalid configuration is a fatal startup error
    let config = Config::load(&cli.config)
        .map_err(|e| anyhow::anyhow!("could not load config from {}: {}", cli.config, e))?;

    tick_relay::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("starting transfer pipeline");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Source: {} stream={} start={}",
                config.source.endpoint, config.source.stream, config.source.start
            );
            println!("  Max batch size: {}", config.source.max_batch_size);
            println!(
                "  Sink: {} prefix={} registry={}",
                config.sink.endpoint, config.sink.key_prefix, config.sink.registry_key
            );
            println!("  Workers: {}", config.sink.workers);
            println!("  Channel capacity: {}", config.pipeline.channel_capacity);
        }
    }

    Ok(())
}
