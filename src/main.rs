use anyhow::Result;
use clap::Parser;
use exam_forge::app::{App, Args};
use exam_forge::Config;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置
    let config = Config::from_env();

    let app = App::initialize(config, &args)?;
    if let Err(err) = app.run(args.cmd).await {
        error!("❌ {:#}", err);
        std::process::exit(1);
    }

    Ok(())
}
