//! Provider key to DNS plugin and credential path resolution
//!
//! Resolution is a pure function of the provider key and the
//! configured secrets directory; nothing is cached, so credentials
//! dropped onto disk between cycles are picked up automatically.

use std::path::PathBuf;

use super::error::CredentialError;

/// DNS-challenge plugin understood by the issuance tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsPlugin {
    Cloudflare,
    Rfc2136,
}

impl DnsPlugin {
    /// Select the plugin for a provider key. Any key containing
    /// `cloudflare` (case-insensitive) uses the Cloudflare plugin;
    /// everything else falls back to generic RFC 2136 dynamic updates.
    pub fn for_provider(provider: &str) -> Self {
        if provider.to_ascii_lowercase().contains("cloudflare") {
            DnsPlugin::Cloudflare
        } else {
            DnsPlugin::Rfc2136
        }
    }

    /// Identifier substituted into the tool's `--dns-<plugin>` flags.
    pub fn id(self) -> &'static str {
        match self {
            DnsPlugin::Cloudflare => "cloudflare",
            DnsPlugin::Rfc2136 => "rfc2136",
        }
    }
}

/// Resolved credentials for one job: which plugin to use and where its
/// credential file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialReference {
    pub plugin: DnsPlugin,
    pub path: PathBuf,
}

/// Maps provider keys to credential references against a fixed
/// secrets directory.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    secrets_dir: PathBuf,
}

impl CredentialResolver {
    pub fn new(secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            secrets_dir: secrets_dir.into(),
        }
    }

    /// Resolve a provider key to its plugin and credential file.
    ///
    /// Fails with [`CredentialError::Missing`] when
    /// `<secrets_dir>/<provider>.ini` is not a file on disk at
    /// resolution time. The caller decides whether to skip the job;
    /// this never aborts anything on its own.
    pub fn resolve(&self, provider: &str) -> Result<CredentialReference, CredentialError> {
        let path = self.secrets_dir.join(format!("{provider}.ini"));

        if !path.is_file() {
            return Err(CredentialError::Missing {
                provider: provider.to_string(),
                path,
            });
        }

        Ok(CredentialReference {
            plugin: DnsPlugin::for_provider(provider),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CredentialResolver) {
        let temp_dir = TempDir::new().unwrap();
        let resolver = CredentialResolver::new(temp_dir.path());
        (temp_dir, resolver)
    }

    #[test]
    fn cloudflare_substring_selects_cloudflare_plugin() {
        assert_eq!(
            DnsPlugin::for_provider("cloudflare-prod"),
            DnsPlugin::Cloudflare
        );
        assert_eq!(
            DnsPlugin::for_provider("CloudFlare_Staging"),
            DnsPlugin::Cloudflare
        );
        assert_eq!(DnsPlugin::for_provider("route53"), DnsPlugin::Rfc2136);
        assert_eq!(DnsPlugin::for_provider("bind-internal"), DnsPlugin::Rfc2136);
    }

    #[test]
    fn resolves_existing_credential_file() {
        let (temp_dir, resolver) = setup();
        let creds_path = temp_dir.path().join("cloudflare-prod.ini");
        std::fs::write(&creds_path, "dns_cloudflare_api_token = x\n").unwrap();

        let creds = resolver.resolve("cloudflare-prod").unwrap();
        assert_eq!(creds.plugin, DnsPlugin::Cloudflare);
        assert_eq!(creds.path, creds_path);
    }

    #[test]
    fn missing_credential_file_reports_not_raises() {
        let (temp_dir, resolver) = setup();

        match resolver.resolve("route53") {
            Err(CredentialError::Missing { provider, path }) => {
                assert_eq!(provider, "route53");
                assert_eq!(path, temp_dir.path().join("route53.ini"));
            }
            Ok(_) => panic!("expected CredentialError::Missing"),
        }
    }

    #[test]
    fn credential_dropped_onto_disk_is_picked_up() {
        let (temp_dir, resolver) = setup();
        assert!(resolver.resolve("bind-internal").is_err());

        std::fs::write(temp_dir.path().join("bind-internal.ini"), "key = x\n").unwrap();
        assert!(resolver.resolve("bind-internal").is_ok());
    }
}
