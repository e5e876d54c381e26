// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of external-dns changesets against the remote DNS API.
//!
//! # Reconciliation Architecture
//!
//! external-dns computes the difference between the desired endpoints and the
//! records reported by the provider and posts it as a changeset. Each changeset
//! is handled in one pass:
//!
//! 1. **Flatten** - Turn update pairs into deletes and creates
//! 2. **Delete** - Remove every record matching an endpoint to delete
//! 3. **Create** - Add one record per target of every endpoint to create
//!
//! Steps 2 and 3 resolve each endpoint to its owning zone. A zone id that went
//! stale triggers one zone reload and one retry of that endpoint.
//!
//! # Modules
//!
//! - [`changes`] - The apply pass itself
//! - [`pagination`] - Offset-based reading of zone and record listings
//! - [`retry`] - One rebuild and one retry when a zone id went stale
//!
//! # Example: Applying a Changeset
//!
//! ```rust,no_run
//! use ionos_webhook::endpoint::Changes;
//! use ionos_webhook::reconcilers::Reconciler;
//! use ionos_webhook::zones::ZoneStore;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn apply(
//!     zones: &ZoneStore,
//!     changes: &Changes,
//! ) -> Result<(), ionos_webhook::dns_errors::ProviderError> {
//!     let cancel = CancellationToken::new();
//!     Reconciler::new(zones, &cancel, false).apply(changes).await?;
//!     Ok(())
//! }
//! ```

pub mod changes;
pub mod pagination;
pub mod retry;

pub use changes::{flatten_changes, ApplySummary, Reconciler};
pub use pagination::{list_all, PageLimits};
pub use retry::retry_on_zone_not_found;

use crate::dns_errors::ProviderError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race a remote call against a cancellation token.
///
/// If `cancel` fires first the call is dropped, which aborts the in-flight HTTP
/// request.
///
/// # Errors
///
/// Returns [`ProviderError::Cancelled`] on cancellation, otherwise the call's result.
pub async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = call => result,
    }
}
