use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daq_daemon::config;
use daq_daemon::supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_log::LogTracer::init().expect("log-to-tracing bridge installs exactly once");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daq_daemon=info,daq_engine=info,daq_driver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = config::parse_args();
    tracing::info!(pid = std::process::id(), "daq_daemon starting");

    supervisor::run(&args, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("ctrl-c received");
    })
    .await?;

    tracing::info!("daq_daemon stopped gracefully");
    Ok(())
}
