// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helpers for offset-based remote list operations.
//!
//! The DNS APIs return zones and records in pages addressed by an offset and a
//! limit. This module reads every page of such a listing up to a hard cap so a
//! single huge account cannot exhaust memory.

use crate::constants::{RECORD_MAX_COUNT, RECORD_PAGE_SIZE, ZONE_MAX_COUNT, ZONE_PAGE_SIZE};
use crate::dns_errors::ProviderError;
use std::future::Future;
use tracing::debug;

/// Page size and hard cap of one kind of paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Items requested per page
    pub page_size: usize,
    /// Maximum number of items read in total; anything beyond is dropped
    pub max_count: usize,
}

impl PageLimits {
    /// Limits used when listing the records of a zone.
    pub const RECORDS: Self = Self::new(RECORD_PAGE_SIZE, RECORD_MAX_COUNT);

    /// Limits used when listing zones.
    pub const ZONES: Self = Self::new(ZONE_PAGE_SIZE, ZONE_MAX_COUNT);

    #[must_use]
    pub const fn new(page_size: usize, max_count: usize) -> Self {
        Self {
            page_size,
            max_count,
        }
    }
}

/// Read all items of a paginated listing.
///
/// `fetch_page` is called with increasing offsets (steps of `limits.page_size`)
/// until it returns a page shorter than the page size or `limits.max_count` items
/// have been read. Items past the cap are discarded without error.
///
/// # Arguments
///
/// * `limits` - Page size and cap of this listing
/// * `listing` - Human-readable name of the listing for logging (e.g., "zones")
/// * `fetch_page` - Async function fetching the page starting at the given offset
///
/// # Example
///
/// ```rust,no_run
/// use ionos_webhook::dns_service::DnsService;
/// use ionos_webhook::reconcilers::pagination::{list_all, PageLimits};
///
/// # async fn example(service: &dyn DnsService) -> Result<(), ionos_webhook::dns_errors::ProviderError> {
/// let limits = PageLimits::ZONES;
/// let zones = list_all(limits, "zones", |offset| service.list_zones(offset, limits.page_size)).await?;
/// println!("Found {} zones", zones.len());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the first error of `fetch_page`; items read so far are discarded.
pub async fn list_all<T, F, Fut>(
    limits: PageLimits,
    listing: &str,
    mut fetch_page: F,
) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ProviderError>>,
{
    let page_size = limits.page_size.max(1);
    let mut all_items = Vec::new();
    let mut offset = 0;
    let mut page_count = 0;

    loop {
        page_count += 1;
        let page = fetch_page(offset).await?;

        let item_count = page.len();
        all_items.extend(page);

        debug!(
            listing = listing,
            page = page_count,
            offset = offset,
            items_in_page = item_count,
            total_items = all_items.len(),
            "Fetched page from DNS API"
        );

        if all_items.len() >= limits.max_count {
            if all_items.len() > limits.max_count {
                debug!(
                    listing = listing,
                    max_count = limits.max_count,
                    dropped = all_items.len() - limits.max_count,
                    "Listing exceeds maximum item count, truncating"
                );
                all_items.truncate(limits.max_count);
            }
            break;
        }

        if item_count < page_size {
            break;
        }
        offset += page_size;
    }

    debug!(
        listing = listing,
        total_pages = page_count,
        total_items = all_items.len(),
        "Completed paginated list operation"
    );

    Ok(all_items)
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod pagination_tests;
