use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A "sleep then check" loop, but cancellable (§9 re-architecture note):
/// wakes early on `token` firing instead of always running the full
/// duration. Returns `false` if the sleep was cut short by cancellation.
pub async fn sleep_cancellable(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = token.cancelled() => false,
    }
}
