//! The resilient polling loop
//!
//! Alternates between two states forever: Running (one full pass over
//! the job file) and Sleeping (waiting out the configured frequency).
//! Every failure mode short of a termination signal is contained here:
//! a missing job file or a malformed row aborts only the current cycle
//! and is retried after a short fixed delay, per-job failures are
//! logged and the iteration moves on to the next job.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;

use super::credentials::CredentialResolver;
use super::error::SourceError;
use super::invoker::{InvocationOutcome, IssuanceInvoker};
use super::source::{JobDescriptor, JobSource};

/// Delay before retrying after a missing job file or a cycle-level
/// error. Deliberately independent of the configured cycle frequency:
/// a not-yet-mounted input file should be noticed in a minute, not an
/// hour.
const RETRY_DELAY: Duration = Duration::from_secs(60);

/// Per-cycle counters. Used only for the cycle-complete log line;
/// never persisted and nothing downstream depends on them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub already_valid: usize,
    pub issued: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl CycleStats {
    pub fn total(&self) -> usize {
        self.already_valid + self.issued + self.failed + self.skipped
    }
}

/// The process-wide cycle scheduler.
pub struct CycleScheduler {
    source: JobSource,
    resolver: CredentialResolver,
    invoker: IssuanceInvoker,
    frequency: Duration,
    shutdown: CancellationToken,
}

impl CycleScheduler {
    pub fn new(config: &Config, shutdown: CancellationToken) -> Self {
        Self {
            source: JobSource::new(&config.csv_path),
            resolver: CredentialResolver::new(&config.secrets_dir),
            invoker: IssuanceInvoker::new(
                &config.certbot_bin,
                config.hook.clone(),
                config.invoke_timeout,
            ),
            frequency: config.frequency,
            shutdown,
        }
    }

    /// Run cycles until the shutdown token fires.
    ///
    /// This never returns an error: cycle failures are logged and
    /// retried after [`RETRY_DELAY`]. The only exit is cancellation.
    pub async fn run(self) {
        info!(
            frequency_mins = self.frequency.as_secs() / 60,
            path = %self.source.path().display(),
            "Starting issuance scheduler"
        );

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match self.run_cycle().await {
                Ok(stats) => {
                    info!(
                        jobs = stats.total(),
                        valid = stats.already_valid,
                        issued = stats.issued,
                        failed = stats.failed,
                        skipped = stats.skipped,
                        sleep_mins = self.frequency.as_secs() / 60,
                        "Cycle complete"
                    );
                    if !self.sleep(self.frequency).await {
                        break;
                    }
                }
                Err(SourceError::Unavailable(path)) => {
                    error!(
                        path = %path.display(),
                        retry_secs = RETRY_DELAY.as_secs(),
                        "Job file missing; will retry"
                    );
                    if !self.sleep(RETRY_DELAY).await {
                        break;
                    }
                }
                Err(e) => {
                    error!(
                        error = %e,
                        retry_secs = RETRY_DELAY.as_secs(),
                        "Cycle aborted; will retry"
                    );
                    if !self.sleep(RETRY_DELAY).await {
                        break;
                    }
                }
            }
        }

        info!("Issuance scheduler stopped");
    }

    /// Execute one full pass over the job file.
    ///
    /// Row-level schema violations abort the cycle (they indicate
    /// systemic misconfiguration; jobs already processed this cycle
    /// stay processed). Per-job credential and invocation failures are
    /// contained: the remaining jobs still run.
    pub async fn run_cycle(&self) -> Result<CycleStats, SourceError> {
        info!(path = %self.source.path().display(), "Reading job file");

        let mut stats = CycleStats::default();
        for row in self.source.open()? {
            // Keep shutdown bounded on large fleets: a signal delivered
            // mid-cycle stops before the next job, not after the last.
            if self.shutdown.is_cancelled() {
                info!(
                    processed = stats.total(),
                    "Shutdown requested; leaving remaining jobs to the next start"
                );
                break;
            }

            let job = row?;
            self.process_job(&job, &mut stats).await;
        }

        Ok(stats)
    }

    /// Resolve credentials and invoke the tool for one job. Infallible
    /// by construction: every failure ends up in the log and in
    /// `stats`, never in the caller's control flow.
    async fn process_job(&self, job: &JobDescriptor, stats: &mut CycleStats) {
        let creds = match self.resolver.resolve(&job.provider) {
            Ok(creds) => creds,
            Err(e) => {
                warn!(domain = %job.fqdn, error = %e, "Skipping job");
                stats.skipped += 1;
                return;
            }
        };

        info!(domain = %job.fqdn, plugin = creds.plugin.id(), "Provisioning");

        match self.invoker.invoke(job, &creds).await {
            Ok(InvocationOutcome::AlreadyValid) => {
                info!(domain = %job.fqdn, "Certificate still valid; no action needed");
                stats.already_valid += 1;
            }
            Ok(InvocationOutcome::IssuedOrRenewed) => {
                info!(domain = %job.fqdn, "Certificate issued or renewed");
                stats.issued += 1;
            }
            Ok(InvocationOutcome::Failed { diagnostic }) => {
                error!(domain = %job.fqdn, "Issuance failed");
                for line in &diagnostic {
                    error!(domain = %job.fqdn, "  | {line}");
                }
                stats.failed += 1;
            }
            Err(e) => {
                error!(domain = %job.fqdn, error = %e, "Issuance tool could not be run");
                stats.failed += 1;
            }
        }
    }

    /// Cancellation-aware sleep. Returns `false` when shutdown fired
    /// before the interval elapsed.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn config(dir: &Path, certbot: &Path) -> Config {
        Config {
            csv_path: dir.join("jobs.csv"),
            hook: None,
            frequency: Duration::from_secs(3600),
            secrets_dir: dir.join("secrets"),
            certbot_bin: certbot.to_path_buf(),
            invoke_timeout: None,
        }
    }

    #[cfg(unix)]
    fn write_fake_certbot(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-certbot.sh");
        std::fs::write(&path, "#!/bin/sh\necho ok\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_job_file_is_source_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), Path::new("certbot"));
        let scheduler = CycleScheduler::new(&config, CancellationToken::new());

        let result = scheduler.run_cycle().await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn malformed_row_aborts_the_cycle() {
        let temp_dir = TempDir::new().unwrap();
        let certbot = write_fake_certbot(temp_dir.path());
        let config = config(temp_dir.path(), &certbot);

        std::fs::create_dir_all(&config.secrets_dir).unwrap();
        std::fs::write(
            &config.csv_path,
            "fqdn,dns_provider,email\na.example.com,route53\n",
        )
        .unwrap();

        let scheduler = CycleScheduler::new(&config, CancellationToken::new());
        assert!(matches!(
            scheduler.run_cycle().await,
            Err(SourceError::Csv(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_credentials_skip_without_aborting() {
        let temp_dir = TempDir::new().unwrap();
        let certbot = write_fake_certbot(temp_dir.path());
        let config = config(temp_dir.path(), &certbot);

        std::fs::create_dir_all(&config.secrets_dir).unwrap();
        std::fs::write(config.secrets_dir.join("route53.ini"), "key = x\n").unwrap();
        std::fs::write(
            &config.csv_path,
            "fqdn,dns_provider,email\n\
             a.example.com,unknown-provider,ops@example.com\n\
             b.example.com,route53,ops@example.com\n",
        )
        .unwrap();

        let scheduler = CycleScheduler::new(&config, CancellationToken::new());
        let stats = scheduler.run_cycle().await.unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.issued, 1);
        assert_eq!(stats.total(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_mid_cycle_stops_before_the_next_job() {
        let temp_dir = TempDir::new().unwrap();
        let certbot = write_fake_certbot(temp_dir.path());
        let config = config(temp_dir.path(), &certbot);

        std::fs::create_dir_all(&config.secrets_dir).unwrap();
        std::fs::write(config.secrets_dir.join("route53.ini"), "key = x\n").unwrap();
        std::fs::write(
            &config.csv_path,
            "fqdn,dns_provider,email\n\
             a.example.com,route53,ops@example.com\n\
             b.example.com,route53,ops@example.com\n",
        )
        .unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let scheduler = CycleScheduler::new(&config, token);
        let stats = scheduler.run_cycle().await.unwrap();
        assert_eq!(stats.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), Path::new("certbot"));
        let token = CancellationToken::new();
        let scheduler = CycleScheduler::new(&config, token.clone());

        // No job file: the loop enters its retry sleep immediately.
        let handle = tokio::spawn(scheduler.run());
        tokio::task::yield_now().await;

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler should stop promptly after cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_token_stops_the_loop_before_any_cycle() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), Path::new("certbot"));
        let token = CancellationToken::new();
        token.cancel();

        // Returns without touching the (missing) job file.
        CycleScheduler::new(&config, token).run().await;
    }
}
