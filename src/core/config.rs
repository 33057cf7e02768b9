use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::core::errors::HealthCheckError;

/// Default confirmation wait, in milliseconds.
pub const DEFAULT_WAIT_MS: u64 = 5000;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "HEALTHCHECK_CONFIG";

/// One layer of configuration. Both the TOML file and the command line
/// produce one of these; later layers override earlier ones field by field.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub url: Option<String>,
    pub pk: Option<String>,
    pub waitms: Option<u64>,
    pub checker: Option<String>,
}

impl fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialConfig")
            .field("url", &self.url)
            .field("pk", &self.pk.as_ref().map(|_| "<redacted>"))
            .field("waitms", &self.waitms)
            .field("checker", &self.checker)
            .finish()
    }
}

impl PartialConfig {
    /// Load a layer from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, HealthCheckError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HealthCheckError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| HealthCheckError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns a layer where every field set in `upper` wins.
    pub fn overlay(self, upper: PartialConfig) -> PartialConfig {
        PartialConfig {
            url: upper.url.or(self.url),
            pk: upper.pk.or(self.pk),
            waitms: upper.waitms.or(self.waitms),
            checker: upper.checker.or(self.checker),
        }
    }

    /// Validate the merged layers and produce the run configuration.
    pub fn finish(self) -> Result<HealthCheckConfig, HealthCheckError> {
        let url = self.url.map(|u| u.trim().to_string()).unwrap_or_default();
        if url.is_empty() {
            return Err(HealthCheckError::Config("an endpoint URL is required (-url)".into()));
        }

        let pk = self.pk.map(|k| k.trim().to_string()).unwrap_or_default();
        if pk.is_empty() {
            return Err(HealthCheckError::Credential("no private key given (-pk)".into()));
        }

        // An empty checker address means "deploy a new contract".
        let checker = self.checker.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        Ok(HealthCheckConfig {
            url,
            private_key: SecretString::new(pk),
            wait: Duration::from_millis(self.waitms.unwrap_or(DEFAULT_WAIT_MS)),
            checker,
        })
    }
}

/// Fully resolved configuration of one run.
#[derive(Clone)]
pub struct HealthCheckConfig {
    pub url: String,
    pub private_key: SecretString,
    pub wait: Duration,
    pub checker: Option<String>,
}

impl fmt::Debug for HealthCheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheckConfig")
            .field("url", &self.url)
            .field("private_key", &"<redacted>")
            .field("wait", &self.wait)
            .field("checker", &self.checker)
            .finish()
    }
}
