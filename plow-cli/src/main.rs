//! plow - a concurrent HTTP benchmarking tool
//!
//! Wires the option table into a [`plow_common::Config`], builds a
//! `reqwest`-backed `Client`, and runs the Requester/Recorder/Aggregator
//! pipeline to completion while the terminal printer (and, if `listen` is
//! set, the charts server) consume the live snapshot.

mod args;
mod printer;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use args::Args;
use plow_client::ReqwestClient;
use plow_core::requester::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.into_config();

    if let Err(err) = config.validate() {
        eprintln!("plow: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(config).await {
        eprintln!("plow: {err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(config: plow_common::Config) -> anyhow::Result<()> {
    let client: Arc<dyn Client> =
        Arc::new(ReqwestClient::new(&config).context("failed to build HTTP client")?);

    let grace_window = config.grace_window();
    let bucket_width = config.interval.unwrap_or(Duration::from_secs(1));

    let (handle, requester_join) = plow_core::run(
        client,
        config.concurrency,
        config.requests,
        config.duration,
        grace_window,
        bucket_width,
        plow_core::rolling::DEFAULT_CAPACITY,
    )
    .await;

    if let Some(listen) = &config.listen {
        let addr = plow_charts::spawn(listen, handle.clone())
            .await
            .context("failed to start charts server")?;
        if config.auto_open_browser {
            let url = format!("http://{addr}/");
            if let Err(err) = open_browser(&url) {
                tracing::warn!(%err, %url, "failed to auto-open browser");
            }
        }
    }

    printer::run(
        handle,
        config.interval,
        config.summary,
        config.render_seconds,
        config.clean,
    )
    .await;

    requester_join.await.context("requester task panicked")?;
    Ok(())
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(target_os = "windows")]
    let program = "cmd";
    #[cfg(all(unix, not(target_os = "macos")))]
    let program = "xdg-open";

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new(program).args(["/C", "start", url]).spawn()?;
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::process::Command::new(program).arg(url).spawn()?;
    }
    Ok(())
}
