// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

/// Log relay server with automatic TLS certificates cached in redis.
///
/// Every option can also be given through the environment variable of the
/// same name.
#[derive(Parser, Debug, Clone)]
#[command(name = "betterlog-server", version, about)]
pub struct Config {
    /// Port of the log endpoint
    #[arg(long, env = "PORT", default_value_t = 5514)]
    pub port: u16,

    /// Port of the health check listener
    #[arg(long, env = "HEALTHZ_PORT", default_value_t = 5513)]
    pub healthz_port: u16,

    /// Address both listeners bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Basic auth realm
    #[arg(long, env = "HTTP_REALM", default_value = "betterlog")]
    pub http_realm: String,

    /// Basic auth credentials as user:password, enables access control
    #[arg(long, env = "HTTP_AUTH")]
    pub http_auth: Option<String>,

    /// Serve TLS with certificates obtained through ACME
    #[arg(long, env = "SSL", value_parser = BoolishValueParser::new())]
    pub ssl: bool,

    /// Namespace for certificate cache keys
    #[arg(long, env = "REDIS_PREFIX", default_value = "")]
    pub redis_prefix: String,

    /// Certificate cache store
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Hostnames to request certificates for
    #[arg(long, env = "DOMAINS", value_delimiter = ',')]
    pub domains: Vec<String>,

    /// ACME account contacts, e.g. mailto:ops@example.com
    #[arg(long, env = "ACME_CONTACT", value_delimiter = ',')]
    pub acme_contact: Vec<String>,

    /// Use the Let's Encrypt production directory instead of staging
    #[arg(long, env = "ACME_PRODUCTION", value_parser = BoolishValueParser::new())]
    pub acme_production: bool,

    /// Deadline of each certificate cache call, in seconds
    #[arg(long, env = "CACHE_TIMEOUT_SECS", default_value_t = 30)]
    pub cache_timeout_secs: u64,

    #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(auth) = &self.http_auth {
            if !auth.contains(':') {
                return Err(anyhow::anyhow!(
                    "HTTP_AUTH must have the form user:password"
                ));
            }
        }
        if self.ssl && self.domains.iter().all(|d| d.trim().is_empty()) {
            return Err(anyhow::anyhow!("SSL needs at least one domain in DOMAINS"));
        }
        if self.cache_timeout_secs == 0 {
            return Err(anyhow::anyhow!("CACHE_TIMEOUT_SECS must be positive"));
        }
        Ok(())
    }

    /// Basic auth credentials, split at the first `:`.
    pub fn credentials(&self) -> Option<Credentials> {
        let (username, password) = self.http_auth.as_deref()?.split_once(':')?;
        Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn listen(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn healthz_listen(&self) -> String {
        format!("{}:{}", self.host, self.healthz_port)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    pub fn domains(&self) -> Vec<String> {
        self.domains
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect()
    }

    pub fn empty() -> Self {
        Self {
            port: 5514,
            healthz_port: 5513,
            host: "0.0.0.0".to_string(),
            http_realm: "betterlog".to_string(),
            http_auth: None,
            ssl: false,
            redis_prefix: String::new(),
            redis_url: "redis://localhost:6379".to_string(),
            domains: Vec::new(),
            acme_contact: Vec::new(),
            acme_production: false,
            cache_timeout_secs: 30,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::{CommandFactory, FromArgMatches};

    use super::*;

    #[test]
    fn test_config_empty() {
        let config = Config::empty();
        assert_eq!(config.debug, false);
        assert_eq!(config.port, 5514);
        assert_eq!(config.healthz_port, 5513);
        assert_eq!(config.listen(), "0.0.0.0:5514");
        assert_eq!(config.healthz_listen(), "0.0.0.0:5513");
        assert!(config.credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_args() {
        let config = Config::try_parse_from([
            "betterlog-server",
            "--port",
            "8443",
            "--ssl",
            "--domains",
            "example.com, www.example.com",
            "--redis-prefix",
            "certs",
            "--http-auth",
            "ops:s3cr:et",
        ])
        .unwrap();
        assert_eq!(config.port, 8443);
        assert!(config.ssl);
        assert_eq!(config.redis_prefix, "certs");
        assert_eq!(config.domains(), vec!["example.com", "www.example.com"]);
        assert_eq!(
            config.credentials(),
            Some(Credentials {
                username: "ops".to_string(),
                password: "s3cr:et".to_string(),
            })
        );
        assert!(config.validate().is_ok());
    }

    /// Parses an empty command line with the environment read from
    /// `BETTERLOG_TEST_*` names, so parallel tests never see these values.
    fn parse_from_test_env() -> Config {
        let matches = Config::command()
            .mut_arg("ssl", |arg| arg.env("BETTERLOG_TEST_SSL"))
            .mut_arg("debug", |arg| arg.env("BETTERLOG_TEST_DEBUG"))
            .mut_arg("acme_production", |arg| {
                arg.env("BETTERLOG_TEST_ACME_PRODUCTION")
            })
            .mut_arg("domains", |arg| arg.env("BETTERLOG_TEST_DOMAINS"))
            .try_get_matches_from(["betterlog-server"])
            .unwrap();
        Config::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn test_config_boolish_env() {
        let command = Config::command();
        for (id, var) in [
            ("ssl", "SSL"),
            ("debug", "DEBUG"),
            ("acme_production", "ACME_PRODUCTION"),
        ] {
            let arg = command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .unwrap();
            assert_eq!(arg.get_env(), Some(OsStr::new(var)));
        }

        std::env::set_var("BETTERLOG_TEST_SSL", "1");
        std::env::set_var("BETTERLOG_TEST_DEBUG", "TRUE");
        std::env::set_var("BETTERLOG_TEST_ACME_PRODUCTION", "yes");
        std::env::set_var("BETTERLOG_TEST_DOMAINS", "example.com");
        let config = parse_from_test_env();
        assert!(config.ssl);
        assert!(config.debug);
        assert!(config.acme_production);
        assert!(config.validate().is_ok());

        std::env::set_var("BETTERLOG_TEST_SSL", "0");
        std::env::set_var("BETTERLOG_TEST_DEBUG", "off");
        std::env::set_var("BETTERLOG_TEST_ACME_PRODUCTION", "false");
        let config = parse_from_test_env();
        assert!(!config.ssl);
        assert!(!config.debug);
        assert!(!config.acme_production);

        for var in [
            "BETTERLOG_TEST_SSL",
            "BETTERLOG_TEST_DEBUG",
            "BETTERLOG_TEST_ACME_PRODUCTION",
            "BETTERLOG_TEST_DOMAINS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::empty();
        config.http_auth = Some("no-colon".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::empty();
        config.ssl = true;
        assert!(config.validate().is_err());
        config.domains = vec!["example.com".to_string()];
        assert!(config.validate().is_ok());

        config.cache_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
