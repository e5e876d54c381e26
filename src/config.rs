// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.
//!
//! Every option can be given as a flag or through the environment variable named
//! next to it, which is how the webhook is normally configured when it runs as a
//! sidecar of external-dns.

use crate::constants::{
    DEFAULT_METRICS_HOST, DEFAULT_METRICS_PORT, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};
use crate::domain_filter::DomainFilter;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser};
use regex::Regex;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors detected while validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable IONOS_API_KEY should not be empty")]
    MissingApiKey,

    #[error("invalid IONOS_API_URL '{url}': {source}")]
    InvalidApiUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid regular expression in {option}: {source}")]
    InvalidRegex {
        option: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Webhook server configuration.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, rename_all = "kebab-case")]
pub struct Config {
    /// Host the webhook API listens on
    #[arg(long, env = "SERVER_HOST", default_value = DEFAULT_SERVER_HOST)]
    pub server_host: String,

    /// Port the webhook API listens on
    #[arg(long, env = "SERVER_PORT", default_value_t = DEFAULT_SERVER_PORT)]
    pub server_port: u16,

    /// Host the health and metrics server listens on
    #[arg(long, env = "METRICS_HOST", default_value = DEFAULT_METRICS_HOST)]
    pub metrics_host: String,

    /// Port the health and metrics server listens on
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Request read timeout in seconds
    #[arg(long, env = "SERVER_READ_TIMEOUT", value_name = "SECONDS")]
    pub server_read_timeout: Option<u64>,

    /// Response write timeout in seconds
    #[arg(long, env = "SERVER_WRITE_TIMEOUT", value_name = "SECONDS")]
    pub server_write_timeout: Option<u64>,

    /// Domains to manage (comma separated)
    #[arg(long, env = "DOMAIN_FILTER", value_delimiter = ',', value_name = "DOMAIN")]
    pub domain_filter: Vec<String>,

    /// Domains to leave alone (comma separated)
    #[arg(
        long,
        env = "EXCLUDE_DOMAIN_FILTER",
        value_delimiter = ',',
        value_name = "DOMAIN"
    )]
    pub exclude_domain_filter: Vec<String>,

    /// Regular expression selecting the domains to manage
    #[arg(long, env = "REGEXP_DOMAIN_FILTER", value_name = "REGEX")]
    pub regexp_domain_filter: Option<String>,

    /// Regular expression selecting domains to leave alone
    #[arg(long, env = "REGEXP_DOMAIN_FILTER_EXCLUSION", value_name = "REGEX")]
    pub regexp_domain_filter_exclusion: Option<String>,

    #[command(flatten)]
    pub ionos: IonosConfig,
}

/// Connection settings of the IONOS DNS API.
#[derive(Args, Debug, Clone)]
pub struct IonosConfig {
    /// API key; a JWT selects IONOS Cloud DNS, anything else IONOS Core DNS
    #[arg(
        long = "ionos-api-key",
        env = "IONOS_API_KEY",
        hide_env_values = true,
        default_value = ""
    )]
    pub api_key: String,

    /// Base URL of the DNS API (defaults depend on the backend)
    #[arg(long = "ionos-api-url", env = "IONOS_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Header carrying the API key (defaults depend on the backend)
    #[arg(long = "ionos-auth-header", env = "IONOS_AUTH_HEADER", value_name = "HEADER")]
    pub auth_header: Option<String>,

    /// Log request and response bodies of the DNS API
    #[arg(
        long = "ionos-debug",
        env = "IONOS_DEBUG",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub debug: bool,

    /// Log changes instead of applying them
    #[arg(
        long = "dry-run",
        env = "DRY_RUN",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub dry_run: bool,
}

impl Config {
    /// Check the settings that clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] if no API key is configured and
    /// [`ConfigError::InvalidApiUrl`] if the API URL does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ionos.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if let Some(api_url) = self.ionos.api_url.as_deref().filter(|u| !u.is_empty()) {
            Url::parse(api_url).map_err(|source| ConfigError::InvalidApiUrl {
                url: api_url.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Build the domain filter from the configured lists or regular expressions.
    ///
    /// Regular expressions take precedence over the domain lists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRegex`] if a regular expression does not compile.
    pub fn domain_filter(&self) -> Result<DomainFilter, ConfigError> {
        let regex = compile("REGEXP_DOMAIN_FILTER", self.regexp_domain_filter.as_deref())?;
        let regex_exclusion = compile(
            "REGEXP_DOMAIN_FILTER_EXCLUSION",
            self.regexp_domain_filter_exclusion.as_deref(),
        )?;

        if regex.is_some() || regex_exclusion.is_some() {
            return Ok(DomainFilter::with_regex(regex, regex_exclusion));
        }
        Ok(DomainFilter::with_exclusions(
            &self.domain_filter,
            &self.exclude_domain_filter,
        ))
    }

    /// Listen address of the webhook API.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Listen address of the health and metrics server.
    #[must_use]
    pub fn metrics_addr(&self) -> String {
        format!("{}:{}", self.metrics_host, self.metrics_port)
    }

    /// Upper bound for handling one webhook request, if any timeout is configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        let read = self.server_read_timeout.unwrap_or(0);
        let write = self.server_write_timeout.unwrap_or(0);
        match read + write {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn compile(option: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .filter(|p| !p.is_empty())
        .map(Regex::new)
        .transpose()
        .map_err(|source| ConfigError::InvalidRegex { option, source })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
