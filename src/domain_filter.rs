// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain filter deciding which zones and names this provider manages.
//!
//! The filter follows the controller's own semantics so that both sides agree on
//! ownership: plain include/exclude lists of domains, or a pair of regular
//! expressions. The filter is handed back to external-dns during negotiation.

use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Inclusion/exclusion rule restricting which names the provider manages.
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    include: Vec<String>,
    exclude: Vec<String>,
    regex: Option<Regex>,
    regex_exclusion: Option<Regex>,
}

/// Wire form of the filter returned by the negotiate endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DomainFilterJson<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclude: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regex_include: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regex_exclude: Option<&'a str>,
}

impl DomainFilter {
    /// Create a filter that includes the given domains and their subdomains.
    #[must_use]
    pub fn new(include: &[String]) -> Self {
        Self::with_exclusions(include, &[])
    }

    /// Create a filter from include and exclude domain lists.
    ///
    /// Entries are trimmed, lowercased and stripped of a trailing dot; empty
    /// entries are dropped.
    #[must_use]
    pub fn with_exclusions(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: prepare_filters(include),
            exclude: prepare_filters(exclude),
            regex: None,
            regex_exclusion: None,
        }
    }

    /// Create a filter from an inclusion regex and an optional exclusion regex.
    #[must_use]
    pub fn with_regex(regex: Option<Regex>, regex_exclusion: Option<Regex>) -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            regex: regex.filter(|r| !r.as_str().is_empty()),
            regex_exclusion: regex_exclusion.filter(|r| !r.as_str().is_empty()),
        }
    }

    /// Returns true if `domain` is managed by this provider.
    #[must_use]
    pub fn matches(&self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        if self.regex.is_some() || self.regex_exclusion.is_some() {
            let included = self.regex.as_ref().is_none_or(|r| r.is_match(&domain));
            let excluded = self
                .regex_exclusion
                .as_ref()
                .is_some_and(|r| r.is_match(&domain));
            return included && !excluded;
        }
        match_filter(&self.include, &domain, true) && !match_filter(&self.exclude, &domain, false)
    }

    /// Returns true if the filter restricts anything at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.regex.is_some() || !self.include.is_empty()
    }

    /// Serialize the filter into the JSON document sent to external-dns.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut include: Vec<&str> = self.include.iter().map(String::as_str).collect();
        let mut exclude: Vec<&str> = self.exclude.iter().map(String::as_str).collect();
        include.sort_unstable();
        exclude.sort_unstable();
        serde_json::to_string(&DomainFilterJson {
            include,
            exclude,
            regex_include: self.regex.as_ref().map(Regex::as_str),
            regex_exclude: self.regex_exclusion.as_ref().map(Regex::as_str),
        })
    }
}

impl fmt::Display for DomainFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.regex.is_some() || self.regex_exclusion.is_some() {
            return write!(
                f,
                "regex={:?} regex_exclusion={:?}",
                self.regex.as_ref().map(Regex::as_str),
                self.regex_exclusion.as_ref().map(Regex::as_str)
            );
        }
        write!(f, "include={:?} exclude={:?}", self.include, self.exclude)
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn prepare_filters(filters: &[String]) -> Vec<String> {
    filters
        .iter()
        .map(|f| normalize_domain(f))
        .filter(|f| !f.is_empty())
        .collect()
}

/// Match a normalized domain against a prepared filter list.
///
/// A filter with a leading dot matches any name ending in it. A filter with the
/// same number of labels as the domain must match exactly. Otherwise the domain
/// must be a subdomain of the filter.
fn match_filter(filters: &[String], domain: &str, empty_value: bool) -> bool {
    if filters.is_empty() {
        return empty_value;
    }
    filters.iter().any(|filter| {
        if filter.starts_with('.') {
            domain.ends_with(filter.as_str())
        } else if domain.matches('.').count() == filter.matches('.').count() {
            domain == filter
        } else {
            domain.ends_with(&format!(".{filter}"))
        }
    })
}

#[cfg(test)]
#[path = "domain_filter_tests.rs"]
mod domain_filter_tests;
