use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Service-reported state of a submitted transformation job.
///
/// Only [`Finished`](Status::Finished) and [`Fatal`](Status::Fatal) are
/// terminal; any word the service adds later lands in
/// [`Other`](Status::Other) and keeps the poll loop running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Queued or still processing (`"waiting"` / `"pending"` on the wire).
    Pending,
    /// The result is ready to download (`"finish"` on the wire).
    Finished,
    /// The job failed on the service side (`"fatal"` on the wire).
    Fatal,
    /// Any other service-reported word, treated as non-terminal.
    Other(String),
}

impl Status {
    pub(crate) fn parse(s: &str) -> Status {
        match s {
            "finish" => Status::Finished,
            "fatal" => Status::Fatal,
            "waiting" | "pending" => Status::Pending,
            other => Status::Other(other.to_string()),
        }
    }

    /// Finished or Fatal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Finished | Status::Fatal)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Status::Finished)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Status::Fatal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => f.write_str("pending"),
            Status::Finished => f.write_str("finish"),
            Status::Fatal => f.write_str("fatal"),
            Status::Other(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Status::parse(&s))
    }
}

/// Returned by [`Client::transform`](crate::Client::transform).
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Server-issued handle used for all subsequent progress and download
    /// calls. The client does not cache it; the caller owns it.
    pub trans_id: String,
    /// Status reported at submission time. `"finish"` here means the job
    /// completed synchronously.
    pub status: Status,
}

/// Polling config for [`Client::process`](crate::Client::process) and the
/// enlarge helpers.
pub struct ProcessOptions {
    /// Delay between progress checks. Default: 1s.
    pub poll_interval: Duration,
    /// Total wall-clock budget for the poll loop. The maximum number of
    /// checks is `timeout / poll_interval`; size this to your deployment's
    /// execution-time limits. Default: 30s.
    pub timeout: Duration,
    /// Webhook URL submitted with the job. When `None`, a placeholder is
    /// sent so the service stays pollable instead of waiting to push a
    /// completion callback.
    pub webhook: Option<String>,
    /// Where to write the result. Default: the system temp directory plus
    /// the source filename.
    pub output: Option<PathBuf>,
    /// Called with each polled status.
    #[allow(clippy::type_complexity)]
    pub on_progress: Option<Box<dyn Fn(&Status) + Send>>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            webhook: None,
            output: None,
            on_progress: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal deserialization helpers (not part of the public API surface)
// ---------------------------------------------------------------------------

/// Every JSON endpoint wraps its payload as `{data: ..., code: int}`. The
/// body `code` is not the error signal (the HTTP status is) and is ignored.
#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// POST upload response payload.
#[derive(Deserialize)]
pub(crate) struct UploadData {
    pub uid: String,
}

/// POST transform response payload. Both fields are decoded leniently so a
/// half-formed response surfaces as a typed error instead of a serde one.
#[derive(Deserialize)]
pub(crate) struct TransformData {
    #[serde(default)]
    pub trans_id: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

/// POST progress response payload.
#[derive(Deserialize)]
pub(crate) struct ProgressData {
    pub status: Status,
}
