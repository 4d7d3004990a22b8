//! CSV-backed job descriptor source
//!
//! The job file is the operator-facing surface: a header row naming
//! `fqdn`, `dns_provider` and `email`, then one data row per domain.
//! It is re-opened at the start of every cycle so edits (and
//! deletions) between cycles take effect without a restart.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::trace;

use super::error::SourceError;

/// One row of the job file: a single certificate job.
///
/// Descriptors are created fresh each cycle and discarded once the
/// cycle's invocation completes; no identity persists across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobDescriptor {
    /// Fully-qualified domain name to issue for
    pub fqdn: String,
    /// Provider key selecting the DNS plugin and credential file
    #[serde(rename = "dns_provider")]
    pub provider: String,
    /// Contact email passed to the issuance tool
    pub email: String,
}

/// Lazy, restartable source of job descriptors.
#[derive(Debug, Clone)]
pub struct JobSource {
    path: PathBuf,
}

impl JobSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the job file and iterate its rows in file order.
    ///
    /// Existence is checked at open time, never cached: a file that
    /// disappeared since the last cycle yields
    /// [`SourceError::Unavailable`] now. Surrounding whitespace in
    /// headers and fields is trimmed; a row missing a required column
    /// surfaces as a [`SourceError::Csv`] item.
    pub fn open(
        &self,
    ) -> Result<impl Iterator<Item = Result<JobDescriptor, SourceError>>, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::Unavailable(self.path.clone()));
        }

        trace!(path = %self.path.display(), "Opening job file");
        let file = File::open(&self.path)?;
        let reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

        Ok(reader
            .into_deserialize::<JobDescriptor>()
            .map(|row| row.map_err(SourceError::from)))
    }
}
