//! Transport API configuration with validation.
//!
//! Every field is required. A missing key is a startup error, never a
//! silently applied default.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Settings of the response template and its topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportApiConfig {
    /// Topic requests are consumed from.
    pub requests_topic: String,
    /// Topic responses go to when a request names no reply topic.
    pub responses_topic: String,
    /// Upper bound on requests awaiting a handler result.
    pub max_pending_requests: usize,
    /// Time after which an unanswered request gets the default response.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Interval of the completed-result sweep, and the request poll wait.
    #[serde(with = "humantime_serde")]
    pub request_poll_interval: Duration,
    /// Interval at which the request topic read position is committed.
    #[serde(with = "humantime_serde")]
    pub request_auto_commit_interval: Duration,
}

impl TransportApiConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic("requests_topic"));
        }
        if self.responses_topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic("responses_topic"));
        }
        if self.requests_topic == self.responses_topic {
            return Err(ConfigError::SameTopic(self.requests_topic.clone()));
        }
        if self.max_pending_requests == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_pending_requests cannot be 0".into(),
            ));
        }

        for (name, value) in [
            ("request_timeout", self.request_timeout),
            ("request_poll_interval", self.request_poll_interval),
            (
                "request_auto_commit_interval",
                self.request_auto_commit_interval,
            ),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidDuration(format!("{name} cannot be 0")));
            }
        }

        if self.request_timeout < self.request_poll_interval {
            return Err(ConfigError::InvalidDuration(format!(
                "request_timeout {:?} is shorter than request_poll_interval {:?}",
                self.request_timeout, self.request_poll_interval
            )));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptyTopic(&'static str),

    #[error("requests and responses share topic {0}")]
    SameTopic(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}
