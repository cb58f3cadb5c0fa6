use clap::Parser;
use noon_menu_bot::Config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();
    let report = noon_menu_bot::run(&config).await?;

    if report.message_posted {
        info!(files = report.artifacts.len(), "menu posted");
    } else {
        info!("nothing posted");
    }
    Ok(())
}
