//! External issuance tool invocation and outcome classification
//!
//! Builds the fixed certbot command line for one job, runs it to
//! completion and classifies the result. A failing subprocess is data,
//! never an abort: the tool's stderr comes back inside
//! [`InvocationOutcome::Failed`] and the caller carries on.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::credentials::CredentialReference;
use super::error::InvokeError;
use super::source::JobDescriptor;

/// Marker certbot prints on stdout when the existing certificate is
/// still far from expiry. Not a stable contract on the tool's side;
/// kept in one place so classification can move to structured output
/// if certbot ever grows one.
const NOT_YET_DUE_MARKER: &str = "Certificate not yet due";

/// Outcome of a single issuance attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Existing certificate is still valid; the tool took no action
    AlreadyValid,
    /// A certificate was issued or renewed
    IssuedOrRenewed,
    /// The tool exited non-zero; diagnostic is its stderr, line by line
    Failed { diagnostic: Vec<String> },
}

/// Runs the issuance tool for one job at a time.
#[derive(Debug, Clone)]
pub struct IssuanceInvoker {
    program: PathBuf,
    hook: Option<PathBuf>,
    invoke_timeout: Option<Duration>,
}

impl IssuanceInvoker {
    /// Create an invoker.
    ///
    /// `hook` must already be validated (existing regular file); the
    /// invoker appends it verbatim and never re-checks it.
    pub fn new(
        program: impl Into<PathBuf>,
        hook: Option<PathBuf>,
        invoke_timeout: Option<Duration>,
    ) -> Self {
        Self {
            program: program.into(),
            hook,
            invoke_timeout,
        }
    }

    /// The fixed argument template for one job.
    pub fn build_args(&self, job: &JobDescriptor, creds: &CredentialReference) -> Vec<String> {
        let plugin = creds.plugin.id();

        let mut args = vec![
            "certonly".to_string(),
            "--non-interactive".to_string(),
            "--agree-tos".to_string(),
            "--email".to_string(),
            job.email.clone(),
            format!("--dns-{plugin}"),
            format!("--dns-{plugin}-credentials"),
            creds.path.display().to_string(),
            "--keep-until-expiring".to_string(),
            "-d".to_string(),
            job.fqdn.clone(),
        ];

        if let Some(hook) = &self.hook {
            args.push("--deploy-hook".to_string());
            args.push(format!("{} {}", hook.display(), job.fqdn));
        }

        args
    }

    /// Run the tool for one job and classify the result.
    ///
    /// Blocks the caller until the subprocess finishes or the
    /// configured timeout elapses. The only error paths are the
    /// subprocess failing to start or timing out; the tool itself
    /// failing is an [`InvocationOutcome::Failed`].
    pub async fn invoke(
        &self,
        job: &JobDescriptor,
        creds: &CredentialReference,
    ) -> Result<InvocationOutcome, InvokeError> {
        let args = self.build_args(job, creds);
        debug!(
            domain = %job.fqdn,
            program = %self.program.display(),
            args = ?args,
            "Invoking issuance tool"
        );

        let mut command = Command::new(&self.program);
        // Reap the child if the timeout abandons the in-flight future
        command.args(&args).kill_on_drop(true);

        let result = match self.invoke_timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| InvokeError::TimedOut(limit))?,
            None => command.output().await,
        };

        let output = result.map_err(|source| InvokeError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        Ok(classify(&output))
    }
}

/// Single home for the fragile stdout marker check.
fn classify(output: &Output) -> InvocationOutcome {
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains(NOT_YET_DUE_MARKER) {
            InvocationOutcome::AlreadyValid
        } else {
            InvocationOutcome::IssuedOrRenewed
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        InvocationOutcome::Failed {
            diagnostic: stderr.trim().lines().map(str::to_string).collect(),
        }
    }
}
