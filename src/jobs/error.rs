//! Errors for the issuance pipeline
//!
//! Every kind here is recoverable. Source errors abort a cycle and are
//! retried; credential and invocation errors are contained to a single
//! job. None of them may escape the scheduling loop.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading the job file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The job file did not exist when the cycle started.
    /// Recovery: retry the cycle after the short delay.
    #[error("job file not found: {0}")]
    Unavailable(PathBuf),

    /// A row violated the expected schema (missing column, ragged
    /// record). Treated as systemic misconfiguration: aborts the cycle.
    #[error("malformed job row: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read job file: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised when a provider key resolves to a credential file that is
/// not on disk. The affected job is skipped; others still run.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("missing credentials for provider '{provider}' at {path}")]
    Missing { provider: String, path: PathBuf },
}

/// Errors raised around the subprocess itself, as opposed to the tool
/// reporting failure (that is an [`InvocationOutcome::Failed`]).
///
/// [`InvocationOutcome::Failed`]: super::InvocationOutcome::Failed
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("issuance tool did not finish within {}s", .0.as_secs())]
    TimedOut(Duration),
}
