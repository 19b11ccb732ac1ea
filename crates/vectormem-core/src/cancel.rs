//! Cooperative cancellation for network-bound futures.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use vectormem_types::error::MemoryError;

/// Race `fut` against `token`.
///
/// If the token is (or becomes) cancelled first, `fut` is dropped -- which
/// abandons any in-flight request it owns -- and `MemoryError::Cancelled` is
/// returned. An already-cancelled token never polls `fut` at all.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, MemoryError>
where
    F: Future<Output = Result<T, MemoryError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(MemoryError::Cancelled),
        result = fut => result,
    }
}
