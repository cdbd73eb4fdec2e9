use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use provgate_core::Context;
use tracing::debug;

/// Context with a deadline that is also cancelled on Ctrl-C.
pub fn command_context(timeout_secs: u64) -> Context {
    let (ctx, handle) = Context::with_cancel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            handle.cancel();
        }
    });
    ctx.with_timeout(Duration::from_secs(timeout_secs))
}

pub fn read_public_key(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read public key {}", path.display()))
}
