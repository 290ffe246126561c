//! Run command implementation

use crate::config::Config;
use crate::pipeline;
use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured number of writer workers
    #[arg(long)]
    pub workers: Option<usize>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(workers) = self.workers {
            config.sink.workers = workers;
        }
        pipeline::run(&config).await
    }
}
