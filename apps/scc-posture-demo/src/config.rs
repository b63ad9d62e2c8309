//! Run configuration read from the process environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::Env;
use scc_auth::{IamAuthConfig, SecretString};
use scc_http::{HttpClientConfig, TransportSecurity};
use serde::{Deserialize, Deserializer};
use url::Url;

/// Variables read by [`figment`]. Names are matched case-insensitively.
pub const ENV_VARS: [&str; 9] = [
    "IAM_API_KEY",
    "IAM_APIKEY_URL",
    "ACCOUNT_ID",
    "API_URL",
    "CREDENTIAL_PATH",
    "PEM_PATH",
    "SCC_REQUEST_TIMEOUT",
    "SCC_PASS_PHRASE",
    "SCC_ALLOW_INSECURE_HTTP",
];

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PASS_PHRASE: &str = "secret";

/// Environment-only provider stack.
#[must_use]
pub fn figment() -> Figment {
    Figment::new().merge(Env::raw().only(&ENV_VARS))
}

/// Shape of the environment. `Env` turns numeric values into numbers, so
/// every free-form field goes through [`scalar_string`].
#[derive(Deserialize)]
struct RawConfig {
    #[serde(deserialize_with = "scalar_string")]
    iam_api_key: String,
    #[serde(deserialize_with = "scalar_string")]
    iam_apikey_url: String,
    #[serde(deserialize_with = "scalar_string")]
    account_id: String,
    #[serde(deserialize_with = "scalar_string")]
    api_url: String,
    credential_path: PathBuf,
    pem_path: PathBuf,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    scc_request_timeout: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    scc_pass_phrase: Option<String>,
    #[serde(default)]
    scc_allow_insecure_http: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Str(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::UInt(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn optional_scalar_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(deserializer).map(|v| v.map(String::from))
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub api_key: SecretString,
    pub iam_url: Url,
    pub account_id: String,
    pub api_url: String,
    pub credential_path: PathBuf,
    pub pem_path: PathBuf,
    pub request_timeout: Duration,
    pub pass_phrase: SecretString,
    pub allow_insecure_http: bool,
}

impl DemoConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if a required variable is missing or blank, or a value does not
    /// parse.
    pub fn from_env() -> Result<Self> {
        Self::from_figment(&figment())
    }

    /// Load from an arbitrary provider stack.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let raw: RawConfig = figment
            .extract()
            .context("failed to read configuration from the environment")?;

        for (name, value) in [
            ("IAM_API_KEY", raw.iam_api_key.as_str()),
            ("IAM_APIKEY_URL", raw.iam_apikey_url.as_str()),
            ("ACCOUNT_ID", raw.account_id.as_str()),
            ("API_URL", raw.api_url.as_str()),
        ] {
            if value.trim().is_empty() {
                bail!("{name} must not be empty");
            }
        }

        let iam_url = Url::parse(raw.iam_apikey_url.trim()).with_context(|| {
            format!("IAM_APIKEY_URL is not a valid URL: {}", raw.iam_apikey_url)
        })?;

        let request_timeout = match raw.scc_request_timeout.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_REQUEST_TIMEOUT,
            Some(value) => humantime::parse_duration(value)
                .with_context(|| format!("SCC_REQUEST_TIMEOUT is not a duration: {value}"))?,
        };
        if request_timeout.is_zero() {
            bail!("SCC_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(Self {
            api_key: SecretString::new(raw.iam_api_key),
            iam_url,
            account_id: raw.account_id.trim().to_owned(),
            api_url: raw.api_url.trim().to_owned(),
            credential_path: raw.credential_path,
            pem_path: raw.pem_path,
            request_timeout,
            pass_phrase: SecretString::new(
                raw.scc_pass_phrase
                    .unwrap_or_else(|| DEFAULT_PASS_PHRASE.to_owned()),
            ),
            allow_insecure_http: raw.scc_allow_insecure_http,
        })
    }

    /// HTTP settings shared by the IAM and API clients.
    #[must_use]
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            request_timeout: self.request_timeout,
            ..HttpClientConfig::default()
        };
        if self.allow_insecure_http {
            config.transport = TransportSecurity::AllowInsecureHttp;
        }
        config
    }

    #[must_use]
    pub fn iam_auth_config(&self) -> IamAuthConfig {
        IamAuthConfig {
            http_config: Some(HttpClientConfig {
                pool_max_idle_per_host: 0,
                ..self.http_config()
            }),
            ..IamAuthConfig::new(self.iam_url.clone(), self.api_key.clone())
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;

    fn set_required(jail: &mut Jail) {
        jail.set_env("IAM_API_KEY", "key-123");
        jail.set_env("IAM_APIKEY_URL", "https://iam.example.com/identity/token");
        jail.set_env("ACCOUNT_ID", "acc-1");
        jail.set_env("API_URL", "https://asap.example.com");
        jail.set_env("CREDENTIAL_PATH", "/tmp/cred.json");
        jail.set_env("PEM_PATH", "/tmp/key.pem");
    }

    #[test]
    fn defaults_apply() {
        Jail::expect_with(|jail| {
            set_required(jail);
            let config = DemoConfig::from_figment(&figment()).map_err(|e| e.to_string())?;

            assert_eq!(config.api_key.expose(), "key-123");
            assert_eq!(config.iam_url.host_str(), Some("iam.example.com"));
            assert_eq!(config.account_id, "acc-1");
            assert_eq!(config.credential_path, PathBuf::from("/tmp/cred.json"));
            assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
            assert_eq!(config.pass_phrase.expose(), DEFAULT_PASS_PHRASE);
            assert!(!config.allow_insecure_http);
            assert_eq!(config.http_config().transport, TransportSecurity::TlsOnly);
            Ok(())
        });
    }

    #[test]
    fn numeric_account_id_is_kept_as_text() {
        Jail::expect_with(|jail| {
            set_required(jail);
            jail.set_env("ACCOUNT_ID", "0012345");
            let config = DemoConfig::from_figment(&figment()).map_err(|e| e.to_string())?;
            assert!(config.account_id.ends_with("12345"));
            Ok(())
        });
    }

    #[test]
    fn optional_settings_override_defaults() {
        Jail::expect_with(|jail| {
            set_required(jail);
            jail.set_env("SCC_REQUEST_TIMEOUT", "1m 30s");
            jail.set_env("SCC_PASS_PHRASE", "hunter2");
            jail.set_env("SCC_ALLOW_INSECURE_HTTP", "true");
            let config = DemoConfig::from_figment(&figment()).map_err(|e| e.to_string())?;

            assert_eq!(config.request_timeout, Duration::from_secs(90));
            assert_eq!(config.pass_phrase.expose(), "hunter2");
            let http = config.http_config();
            assert_eq!(http.transport, TransportSecurity::AllowInsecureHttp);
            assert_eq!(http.request_timeout, Duration::from_secs(90));
            Ok(())
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        Jail::expect_with(|jail| {
            set_required(jail);
            jail.set_env("API_URL", "");
            let err = DemoConfig::from_figment(&figment()).unwrap_err();
            assert!(format!("{err:#}").to_lowercase().contains("api_url"));
            Ok(())
        });

        Jail::expect_with(|jail| {
            jail.set_env("IAM_API_KEY", "key-123");
            let err = DemoConfig::from_figment(&figment()).unwrap_err();
            assert!(format!("{err:#}").contains("missing field"));
            Ok(())
        });
    }

    #[test]
    fn bad_timeout_is_an_error() {
        Jail::expect_with(|jail| {
            set_required(jail);
            jail.set_env("SCC_REQUEST_TIMEOUT", "soon");
            let err = DemoConfig::from_figment(&figment()).unwrap_err();
            assert!(err.to_string().contains("SCC_REQUEST_TIMEOUT"));
            Ok(())
        });
    }

    #[test]
    fn debug_redacts_secrets() {
        Jail::expect_with(|jail| {
            set_required(jail);
            jail.set_env("SCC_PASS_PHRASE", "hunter2");
            let config = DemoConfig::from_figment(&figment()).map_err(|e| e.to_string())?;
            let rendered = format!("{config:?} {:?}", config.iam_auth_config());
            assert!(!rendered.contains("key-123"));
            assert!(!rendered.contains("hunter2"));
            Ok(())
        });
    }
}
