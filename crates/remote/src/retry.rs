use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::RemoteResult;

/// Run `call`, and if it reports not-found, wait `delay` and run it once more.
///
/// Reads issued right after a write may not see it yet. The second
/// answer is authoritative.
pub async fn retry_not_found<T, F, Fut>(delay: Duration, mut call: F) -> RemoteResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RemoteResult<T>>,
{
    match call().await {
        Err(e) if e.is_not_found() => {
            debug!(error = %e, delay_ms = delay.as_millis() as u64, "not found, retrying once");
            tokio::time::sleep(delay).await;
            call().await
        }
        other => other,
    }
}
