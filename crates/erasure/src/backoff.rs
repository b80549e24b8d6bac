//! Bounded exponential backoff for per-shard RPCs (spec §4.6: "Each
//! per-shard RPC retries on transient network failure with bounded
//! backoff").

use std::future::Future;
use std::time::Duration;

use crate::error::Error;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(50);

pub(crate) async fn with_retry<T, F, Fut>(mut attempt: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut last_err = None;
    for attempt_no in 0..MAX_ATTEMPTS {
        match attempt().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt_no + 1 < MAX_ATTEMPTS => {
                let delay = BASE_DELAY * 2u32.pow(attempt_no);
                tracing::warn!(
                    attempt = attempt_no + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "shard rpc failed, retrying"
                );
                tokio::time::sleep(delay).await;
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.expect("loop always attempts at least once before exhausting retries"))
}
