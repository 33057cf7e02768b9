use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::core::config::{HealthCheckConfig, PartialConfig, CONFIG_PATH_ENV};
use crate::core::errors::HealthCheckError;

/// Long flags that may also be spelled with a single dash (`-url`, `-waitms=100`).
pub const SINGLE_DASH_FLAGS: [&str; 6] = ["url", "pk", "waitms", "checker", "config", "help"];

/// Deploys (or binds to) the HealthCheck contract, ticks it, and waits for
/// the tick to be mined. Exit status 0 means healthy, 1 means the check
/// failed, 2 means the check could not be set up. When a new contract is
/// deployed its address is the only thing written to stdout.
#[derive(Parser)]
#[command(name = "healthcheck", version, about = "Blockchain round-trip health check")]
pub struct Cli {
    /// URL of API endpoint to test
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Private key of an address with some gas to call the HealthCheck methods
    #[arg(long, value_name = "HEX")]
    pub pk: Option<String>,

    /// Number of milliseconds to wait before declaring check not healthy (default 5000)
    #[arg(long, value_name = "MS")]
    pub waitms: Option<u64>,

    /// Address of already deployed HealthCheck contract; empty deploys a new one
    #[arg(long, value_name = "ADDRESS")]
    pub checker: Option<String>,

    /// TOML file with url/pk/waitms/checker defaults; flags take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_single_dash_flags(std::env::args_os()))
    }

    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_single_dash_flags(args))
    }

    /// Merge the optional config file with the flags.
    pub fn resolve(self) -> Result<HealthCheckConfig, HealthCheckError> {
        let path = self.config.clone().or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        let file_layer = match path {
            Some(path) => PartialConfig::from_file(&path)?,
            None => PartialConfig::default(),
        };
        file_layer.overlay(self.into_layer()).finish()
    }

    fn into_layer(self) -> PartialConfig {
        PartialConfig { url: self.url, pk: self.pk, waitms: self.waitms, checker: self.checker }
    }
}

/// Rewrite `-url x` / `-waitms=5` into `--url x` / `--waitms=5`.
///
/// Only names in [`SINGLE_DASH_FLAGS`] are touched, the program name is left
/// alone, and everything after a bare `--` passes through unchanged.
pub fn normalize_single_dash_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else { return arg };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if SINGLE_DASH_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.into_string().unwrap()).collect()
    }

    #[test]
    fn single_dash_flags_are_rewritten() {
        let out = normalize_single_dash_flags([
            "healthcheck",
            "-url",
            "http://127.0.0.1:9650/ext/bc/C/rpc",
            "-waitms=100",
            "--pk",
            "abc",
            "-x",
        ]);
        assert_eq!(
            strings(out),
            vec![
                "healthcheck",
                "--url",
                "http://127.0.0.1:9650/ext/bc/C/rpc",
                "--waitms=100",
                "--pk",
                "abc",
                "-x"
            ]
        );
    }

    #[test]
    fn arguments_after_double_dash_are_untouched() {
        let out = normalize_single_dash_flags(["healthcheck", "--", "-url"]);
        assert_eq!(strings(out), vec!["healthcheck", "--", "-url"]);
    }

    #[test]
    fn go_style_invocation_parses() {
        let cli = Cli::try_parse_args([
            "healthcheck",
            "-url",
            "http://localhost:8545",
            "-pk",
            "aa",
            "-waitms",
            "250",
            "-checker",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
        ])
        .unwrap();
        let cfg = cli.resolve().unwrap();
        assert_eq!(cfg.url, "http://localhost:8545");
        assert_eq!(cfg.wait.as_millis(), 250);
        assert_eq!(cfg.checker.as_deref(), Some("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"));
    }

    #[test]
    fn negative_wait_is_rejected() {
        assert!(Cli::try_parse_args(["healthcheck", "-waitms", "-5"]).is_err());
    }
}
