//! Remote store seam and bounded-retry fetching.

use driveaudit_core::{FetchError, ItemId, Permission, RemoteItem};
use tracing::debug;

/// Fetch-by-id access to the remote store.
///
/// Enumeration is not part of this trait; the run driver takes the
/// enumeration stream separately.
pub trait RemoteStore {
    /// Fetch one item record by id.
    fn fetch_item(&self, id: &ItemId) -> Result<RemoteItem, FetchError>;

    /// Fetch the full permission list of an item.
    fn fetch_permissions(&self, id: &ItemId) -> Result<Vec<Permission>, FetchError>;
}

/// Result of a retried fetch, with the number of attempts it took.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub result: Result<T, FetchError>,
    pub attempts: u32,
}

/// Run `op` up to `max_attempts` times (at least once).
///
/// Stops early on success or on an error that is not retryable. There is no
/// delay between attempts.
pub fn fetch_with_retry<T, F>(max_attempts: u32, mut op: F) -> FetchOutcome<T>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op() {
            Ok(value) => {
                if attempts > 1 {
                    debug!(attempts, "fetch succeeded after retry");
                }
                return FetchOutcome {
                    result: Ok(value),
                    attempts,
                };
            }
            Err(err) if err.is_retryable() && attempts < max_attempts => {
                debug!(attempts, error = %err, "fetch failed, retrying");
            }
            Err(err) => {
                return FetchOutcome {
                    result: Err(err),
                    attempts,
                };
            }
        }
    }
}
