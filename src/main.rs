use clap::Parser;

use inference_shim::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    inference_shim::server::run(config).await
}
