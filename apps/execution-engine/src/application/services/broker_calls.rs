//! Bounded broker calls.

use std::future::Future;
use std::time::Duration;

use crate::application::ports::BrokerError;

/// Await a broker call, failing with [`BrokerError::Timeout`] once `limit`
/// elapses.
///
/// The underlying request is dropped, not cancelled at the broker; callers
/// reconcile late completions through status checks.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, BrokerError>
where
    F: Future<Output = Result<T, BrokerError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(BrokerError::Timeout {
            seconds: limit.as_secs(),
        }))
}
