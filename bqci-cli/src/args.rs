//! Arguments shared by both binaries

use bqci_core::{BigQueryConfig, ConfigError, DEFAULT_BIGQUERY_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS};
use clap::Args;

/// BigQuery connection flags. Each falls back to its `BQCI_*` variable.
#[derive(Clone, Args)]
pub struct BigQueryArgs {
    /// Billing project and default project of unqualified references.
    /// Falls back to GOOGLE_CLOUD_PROJECT
    #[arg(long, env = "BQCI_PROJECT")]
    pub project: Option<String>,

    /// Location jobs run in (e.g. US, EU)
    #[arg(long, env = "BQCI_LOCATION")]
    pub location: Option<String>,

    /// OAuth2 bearer token, e.g. from `gcloud auth print-access-token`
    #[arg(long, env = "BQCI_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "BQCI_API_BASE_URL", default_value = DEFAULT_BIGQUERY_API_BASE_URL)]
    pub api_base_url: String,

    /// HTTP timeout for a single API request
    #[arg(long, env = "BQCI_REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,
}

impl BigQueryArgs {
    pub fn into_config(self) -> Result<BigQueryConfig, ConfigError> {
        let project_id = self
            .project
            .or_else(|| std::env::var("GOOGLE_CLOUD_PROJECT").ok())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "project (--project or BQCI_PROJECT)".to_string(),
            })?;
        let access_token = self.access_token.ok_or_else(|| ConfigError::MissingRequired {
            field: "access token (--access-token or BQCI_ACCESS_TOKEN)".to_string(),
        })?;

        let mut config = BigQueryConfig::new(project_id, access_token);
        config.location = self.location;
        config.api_base_url = self.api_base_url;
        config.request_timeout_ms = self.request_timeout_ms;
        config.validate()?;
        Ok(config)
    }
}

impl std::fmt::Debug for BigQueryArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryArgs")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Args)]
pub struct LogArgs {
    /// Log at debug level, including every submitted query
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        bigquery: BigQueryArgs,
    }

    #[test]
    fn test_flags_build_config() {
        let args = Harness::try_parse_from([
            "bqci",
            "--project",
            "acme",
            "--access-token",
            "secret",
            "--location",
            "EU",
        ])
        .unwrap()
        .bigquery;
        let rendered = format!("{:?}", args);
        assert!(!rendered.contains("secret"));

        let config = args.into_config().unwrap();
        assert_eq!(config.project_id, "acme");
        assert_eq!(config.location.as_deref(), Some("EU"));
        assert_eq!(config.api_base_url, DEFAULT_BIGQUERY_API_BASE_URL);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let args = Harness::try_parse_from([
            "bqci",
            "--project",
            "acme",
            "--access-token",
            "secret",
            "--api-base-url",
            "ftp://example.test",
        ])
        .unwrap()
        .bigquery;
        assert!(matches!(
            args.into_config(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
