// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic for calls that fail on a stale zone mapping.
//!
//! Zones can be deleted and recreated behind the provider's back, which gives
//! them a new id. A call made with the old id fails with
//! [`ProviderError::ZoneNotFound`]. This module rebuilds the zone directory once
//! and repeats the call once in that case; every other failure is returned as-is.

use crate::dns_errors::ProviderError;
use std::future::Future;
use tracing::{debug, error, warn};

/// Run `call`, rebuilding the zone directory and retrying once if a zone is gone.
///
/// There is no backoff and no other error class is retried. At most one rebuild
/// happens, followed by exactly one more attempt.
///
/// # Arguments
///
/// * `rebuild` - Async function reloading the zone directory
/// * `call` - Async function performing the remote operation
/// * `operation_name` - Human-readable name for logging (e.g., "apply changes")
///
/// # Example
///
/// ```rust,no_run
/// use ionos_webhook::dns_errors::ProviderError;
/// use ionos_webhook::reconcilers::retry::retry_on_zone_not_found;
///
/// # async fn reload() -> Result<(), ProviderError> { Ok(()) }
/// # async fn fetch() -> Result<Vec<String>, ProviderError> { Ok(vec![]) }
/// # async fn example() -> Result<(), ProviderError> {
/// let names = retry_on_zone_not_found(reload, fetch, "list records").await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`ProviderError::ZoneReload`] if the rebuild fails, otherwise the error
/// of the last call.
pub async fn retry_on_zone_not_found<T, R, RFut, C, CFut>(
    mut rebuild: R,
    mut call: C,
    operation_name: &str,
) -> Result<T, ProviderError>
where
    R: FnMut() -> RFut,
    RFut: Future<Output = Result<(), ProviderError>>,
    C: FnMut() -> CFut,
    CFut: Future<Output = Result<T, ProviderError>>,
{
    let err = match call().await {
        Err(e) if e.is_zone_not_found() => e,
        other => return other,
    };

    warn!(
        operation = operation_name,
        error = %err,
        "Zone no longer exists, reloading zones and retrying once"
    );

    if let Err(rebuild_err) = rebuild().await {
        error!(
            operation = operation_name,
            error = %rebuild_err,
            "Failed to reload zones, giving up"
        );
        return Err(ProviderError::ZoneReload(Box::new(rebuild_err)));
    }

    let result = call().await;
    match &result {
        Ok(_) => debug!(operation = operation_name, "Call succeeded after zone reload"),
        Err(e) => warn!(
            operation = operation_name,
            error = %e,
            "Call failed again after zone reload"
        ),
    }
    result
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
