//! Log severity.

use crate::proto::logging_type::LogSeverity;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity of a log entry.
///
/// Mirrors the service's `LogSeverity` levels, ordered from least to most
/// severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// No assigned severity level.
    #[default]
    Default,
    /// Debug or trace information.
    Debug,
    /// Routine information, such as ongoing status or performance.
    Info,
    /// Normal but significant events.
    Notice,
    /// Events that might cause problems.
    Warning,
    /// Events that are likely to cause problems.
    Error,
    /// Events that cause more severe problems or outages.
    Critical,
    /// A person must take an action immediately.
    Alert,
    /// One or more systems are unusable.
    Emergency,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Severity; 9] = [
        Self::Default,
        Self::Debug,
        Self::Info,
        Self::Notice,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::Alert,
        Self::Emergency,
    ];

    /// Returns the name used by the service and its filter language.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Alert => "ALERT",
            Self::Emergency => "EMERGENCY",
        }
    }

    /// Returns the numeric wire value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        LogSeverity::from(self) as i32
    }

    /// Maps a numeric wire value back to a severity.
    ///
    /// Unknown values map to [`Severity::Default`].
    #[must_use]
    pub fn from_i32(value: i32) -> Self {
        LogSeverity::try_from(value).map_or(Self::Default, Self::from)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown severity name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "WARN" => return Ok(Self::Warning),
            "FATAL" => return Ok(Self::Critical),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str() == upper)
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

impl From<Severity> for LogSeverity {
    fn from(sev: Severity) -> Self {
        match sev {
            Severity::Default => Self::Default,
            Severity::Debug => Self::Debug,
            Severity::Info => Self::Info,
            Severity::Notice => Self::Notice,
            Severity::Warning => Self::Warning,
            Severity::Error => Self::Error,
            Severity::Critical => Self::Critical,
            Severity::Alert => Self::Alert,
            Severity::Emergency => Self::Emergency,
        }
    }
}

impl From<LogSeverity> for Severity {
    fn from(sev: LogSeverity) -> Self {
        match sev {
            LogSeverity::Default => Self::Default,
            LogSeverity::Debug => Self::Debug,
            LogSeverity::Info => Self::Info,
            LogSeverity::Notice => Self::Notice,
            LogSeverity::Warning => Self::Warning,
            LogSeverity::Error => Self::Error,
            LogSeverity::Critical => Self::Critical,
            LogSeverity::Alert => Self::Alert,
            LogSeverity::Emergency => Self::Emergency,
        }
    }
}
