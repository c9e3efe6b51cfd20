//! Native-messaging host for the WhichLogin browser extension
//!
//! Started by the browser. Reads length-prefixed JSON requests on stdin and
//! writes responses on stdout until the browser closes the pipe. Logs go to
//! stderr.

use anyhow::Context;

use whichlogin::bridge::NativeHost;
use whichlogin::config::AppConfig;
use whichlogin::AppState;

fn main() -> anyhow::Result<()> {
    whichlogin::init_logging();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(run())
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let state = AppState::open(config).context("failed to open preference store")?;

    tracing::info!("Native host ready");

    let mut host = NativeHost::new(
        tokio::io::stdin(),
        tokio::io::stdout(),
        state.bridge.clone(),
    );
    let served = host.serve().await;

    state.shutdown();
    served.context("native messaging session failed")?;
    Ok(())
}
