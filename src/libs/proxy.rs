// Proxy configuration for constrained networks.
//
// Validated once at startup, then threaded through the run as part of the
// environment context: the HTTP agent, `git clone`, and every build-tool
// subprocess all see the same proxy state.

use std::time::Duration;

use colored::Colorize;

use crate::errors::Result;
use crate::libs::validation::validate_proxy_url;
use crate::{log_debug, log_success};

/// HTTP/HTTPS proxy state for one run. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    http_proxy: Option<String>,
    https_proxy: Option<String>,
}

impl ProxyConfig {
    /// A configuration with no proxy; downloads and subprocesses go direct.
    pub fn direct() -> Self {
        ProxyConfig::default()
    }

    /// Validates the given proxy URLs, stores them, and exports them into the
    /// current process environment (upper- and lowercase forms) so that child
    /// processes inherit them.
    pub fn configure(http_proxy: Option<String>, https_proxy: Option<String>) -> Result<Self> {
        if let Some(url) = &http_proxy {
            validate_proxy_url(url)?;
        }
        if let Some(url) = &https_proxy {
            validate_proxy_url(url)?;
        }

        let config = ProxyConfig {
            http_proxy,
            https_proxy,
        };

        if let Some(url) = &config.http_proxy {
            set_process_var("HTTP_PROXY", url);
            set_process_var("http_proxy", url);
            log_success!("HTTP proxy configured: {}", url.cyan());
        }
        if let Some(url) = &config.https_proxy {
            set_process_var("HTTPS_PROXY", url);
            set_process_var("https_proxy", url);
            log_success!("HTTPS proxy configured: {}", url.cyan());
        }

        Ok(config)
    }

    pub fn http(&self) -> Option<&str> {
        self.http_proxy.as_deref()
    }

    pub fn https(&self) -> Option<&str> {
        self.https_proxy.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.http_proxy.is_some() || self.https_proxy.is_some()
    }

    /// Builds the HTTP agent used for all downloads in this run, routed
    /// through the proxy when one is configured.
    pub fn agent(&self, timeout: Duration) -> ureq::Agent {
        let mut builder = ureq::AgentBuilder::new().timeout(timeout);
        if let Some(url) = self.https_proxy.as_deref().or(self.http_proxy.as_deref()) {
            match ureq::Proxy::new(url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => {
                    // Validation already passed; an unparseable proxy here is
                    // a bug worth surfacing, but a direct attempt beats none.
                    log_debug!("[Proxy] Agent proxy setup failed for {}: {}", url, err);
                }
            }
        }
        builder.build()
    }

    /// Environment variable pairs for subprocesses that honor the lowercase
    /// conventions (git, pip, npm).
    pub fn subprocess_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if let Some(url) = &self.http_proxy {
            env.push(("HTTP_PROXY".to_string(), url.clone()));
            env.push(("http_proxy".to_string(), url.clone()));
        }
        if let Some(url) = &self.https_proxy {
            env.push(("HTTPS_PROXY".to_string(), url.clone()));
            env.push(("https_proxy".to_string(), url.clone()));
        }
        env
    }
}

/// Splits a proxy URL into host and port, defaulting the port to `80`.
/// Used when a tool needs the pieces rather than the URL (Maven's
/// `settings.xml` proxies block).
pub fn proxy_host_and_port(proxy_url: &str) -> (String, String) {
    let without_scheme = proxy_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(proxy_url);
    let host_port = without_scheme.split('/').next().unwrap_or(without_scheme);
    match host_port.split_once(':') {
        Some((host, port)) => (host.to_string(), port.trim_end_matches('/').to_string()),
        None => (host_port.to_string(), "80".to_string()),
    }
}

fn set_process_var(name: &str, value: &str) {
    // SAFETY: the process environment is only mutated during single-threaded
    // startup, before any worker threads exist.
    unsafe { std::env::set_var(name, value) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_port_are_split_from_proxy_url() {
        assert_eq!(
            proxy_host_and_port("http://proxy.corp.example:8080"),
            ("proxy.corp.example".to_string(), "8080".to_string())
        );
    }

    #[test]
    fn port_defaults_to_80() {
        assert_eq!(
            proxy_host_and_port("http://proxy.corp.example"),
            ("proxy.corp.example".to_string(), "80".to_string())
        );
    }

    #[test]
    fn scheme_is_optional_when_splitting() {
        assert_eq!(
            proxy_host_and_port("proxy:3128"),
            ("proxy".to_string(), "3128".to_string())
        );
    }

    #[test]
    fn invalid_proxy_urls_are_rejected_before_any_mutation() {
        assert!(ProxyConfig::configure(Some("not a proxy".to_string()), None).is_err());
        assert!(ProxyConfig::configure(None, Some("http://:9090".to_string())).is_err());
    }

    #[test]
    fn direct_configuration_has_no_proxies() {
        let config = ProxyConfig::direct();
        assert!(!config.is_configured());
        assert!(config.subprocess_env().is_empty());
    }
}
