//! Runtime configuration
//!
//! Built once from command-line arguments at startup and passed
//! explicitly into the scheduler and invoker; never read as ambient
//! global state after that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

/// Default directory holding one credential file per provider key,
/// named `<providerKey>.ini`.
pub const DEFAULT_SECRETS_DIR: &str = "/etc/letsencrypt/secrets";

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the CSV job file, re-read at the start of every cycle
    pub csv_path: PathBuf,
    /// Post-issuance hook, already verified to exist at startup
    pub hook: Option<PathBuf>,
    /// Interval between processing cycles
    pub frequency: Duration,
    /// Directory containing per-provider credential files
    pub secrets_dir: PathBuf,
    /// Issuance tool binary
    pub certbot_bin: PathBuf,
    /// Optional upper bound on a single tool invocation
    pub invoke_timeout: Option<Duration>,
}

impl Config {
    /// Assemble the configuration from parsed CLI values.
    ///
    /// The hook path is checked once, here: a hook that is missing or
    /// not a regular file is dropped for the remainder of the run, so
    /// no invocation ever carries a dangling deploy-hook argument.
    pub fn new(
        csv_path: PathBuf,
        hook: Option<PathBuf>,
        frequency_minutes: u64,
        secrets_dir: PathBuf,
        certbot_bin: PathBuf,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            csv_path,
            hook: hook.and_then(|p| verify_hook(&p)),
            frequency: Duration::from_secs(frequency_minutes.saturating_mul(60)),
            secrets_dir,
            certbot_bin,
            invoke_timeout: timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Validate the hook path at startup.
///
/// Returns the absolute path when it points at a regular file, `None`
/// otherwise. Only logged, never fatal.
fn verify_hook(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        warn!(
            hook = %path.display(),
            "Hook is missing or not a regular file; deploy-hook disabled"
        );
        return None;
    }

    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    info!(hook = %resolved.display(), "Deploy hook enabled");
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base_config(hook: Option<PathBuf>) -> Config {
        Config::new(
            PathBuf::from("/tmp/jobs.csv"),
            hook,
            60,
            PathBuf::from(DEFAULT_SECRETS_DIR),
            PathBuf::from("certbot"),
            None,
        )
    }

    #[test]
    fn frequency_is_minutes() {
        let config = base_config(None);
        assert_eq!(config.frequency, Duration::from_secs(3600));
    }

    #[test]
    fn absurd_frequency_saturates_instead_of_panicking() {
        let config = Config::new(
            PathBuf::from("/tmp/jobs.csv"),
            None,
            u64::MAX,
            PathBuf::from(DEFAULT_SECRETS_DIR),
            PathBuf::from("certbot"),
            None,
        );
        assert_eq!(config.frequency, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn missing_hook_is_dropped() {
        let config = base_config(Some(PathBuf::from("/nonexistent/hook.sh")));
        assert!(config.hook.is_none());
    }

    #[test]
    fn directory_hook_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let config = base_config(Some(temp_dir.path().to_path_buf()));
        assert!(config.hook.is_none());
    }

    #[test]
    fn existing_hook_is_kept_and_resolved() {
        let temp_dir = TempDir::new().unwrap();
        let hook_path = temp_dir.path().join("deploy.sh");
        std::fs::write(&hook_path, "#!/bin/sh\n").unwrap();

        let config = base_config(Some(hook_path.clone()));
        let kept = config.hook.expect("hook should be kept");
        assert!(kept.is_absolute());
        assert_eq!(kept.file_name().unwrap(), "deploy.sh");
    }
}
