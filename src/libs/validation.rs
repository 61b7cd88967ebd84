// URL and name validation. Everything here runs before any I/O: a repository
// URL that fails a rule is rejected without a clone attempt, a proxy URL that
// fails is rejected before it touches the process environment.

use crate::constants::ALLOWED_URL_SCHEMES;
use crate::errors::{BootstrapError, Result};

/// Characters with shell meaning that must never appear in a repository URL.
/// URLs end up as `git clone` arguments and in subprocess environments, so
/// anything that could break out of an argument is rejected outright.
const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '[', ']'];

/// Validates a repository URL against the safety rules, in order:
/// non-empty and parseable, allow-listed scheme, plausible host, no shell
/// metacharacters / `..` / percent-encoding in the raw string, and a
/// non-trivial path.
///
/// Each violation fails with a reason naming the rule that triggered.
pub fn validate_repo_url(url: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(BootstrapError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        })
    };

    if url.trim().is_empty() {
        return invalid("URL is empty");
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return invalid("URL has no scheme separator");
    };

    if !ALLOWED_URL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return invalid("URL scheme is not in the allowed set (http, https, git)");
    }

    let (host_port, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let host = host_port.split(':').next().unwrap_or("");
    if host.len() < 3 {
        return invalid("URL host is missing or too short");
    }

    // The raw string is checked, not the parsed parts, so an injection hidden
    // in any component is caught.
    if url.contains(SHELL_METACHARACTERS) {
        return invalid("URL contains shell metacharacters");
    }
    if url.contains("..") {
        return invalid("URL contains a '..' sequence");
    }
    if contains_percent_encoding(url) {
        return invalid("URL contains percent-encoded octets");
    }

    if path.is_empty() || path == "/" {
        return invalid("URL has no repository path");
    }

    Ok(())
}

/// Validates a proxy URL: `http(s)://host[:port]` with a non-empty host that
/// does not start with `:`.
pub fn validate_proxy_url(url: &str) -> Result<()> {
    let invalid = || {
        Err(BootstrapError::InvalidProxyUrl {
            url: url.to_string(),
        })
    };

    if url.trim().is_empty() {
        return invalid();
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return invalid();
    };
    if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
        return invalid();
    }

    let host_port = rest.split('/').next().unwrap_or("");
    if host_port.is_empty() || host_port.starts_with(':') {
        return invalid();
    }
    if let Some((host, port)) = host_port.split_once(':') {
        if host.is_empty() || port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return invalid();
        }
    }

    Ok(())
}

/// Validates an environment variable name: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_env_var_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_first = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_rest = name.chars().skip(1).all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_first && valid_rest {
        Ok(())
    } else {
        Err(BootstrapError::InvalidEnvVarName {
            name: name.to_string(),
        })
    }
}

/// True when the string contains a `%` followed by two hex digits. Encoded
/// octets could smuggle characters past the other checks, so their mere
/// presence is a violation.
fn contains_percent_encoding(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.windows(3).any(|w| {
        w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_repository_urls() {
        assert!(validate_repo_url("https://github.com/user/repo.git").is_ok());
        assert!(validate_repo_url("http://gitlab.example.com/team/project").is_ok());
        assert!(validate_repo_url("git://host.example/team/tool").is_ok());
    }

    #[test]
    fn rejects_empty_url() {
        assert!(validate_repo_url("").is_err());
        assert!(validate_repo_url("   ").is_err());
    }

    #[test]
    fn rejects_disallowed_schemes() {
        assert!(validate_repo_url("ftp://host/path").is_err());
        assert!(validate_repo_url("file:///etc/passwd").is_err());
        assert!(validate_repo_url("github.com/user/repo").is_err());
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(validate_repo_url("https://github.com/user/repo;rm -rf /").is_err());
        assert!(validate_repo_url("https://github.com/user/repo|cat").is_err());
        assert!(validate_repo_url("https://github.com/user/$(whoami)").is_err());
        assert!(validate_repo_url("https://github.com/user/`id`").is_err());
    }

    #[test]
    fn rejects_traversal_and_percent_encoding() {
        assert!(validate_repo_url("https://github.com/user/../../etc").is_err());
        assert!(validate_repo_url("https://github.com/user/repo%2e%2e").is_err());
    }

    #[test]
    fn rejects_missing_host_or_path() {
        assert!(validate_repo_url("https:///repo").is_err());
        assert!(validate_repo_url("https://ab/repo").is_err());
        assert!(validate_repo_url("https://github.com").is_err());
        assert!(validate_repo_url("https://github.com/").is_err());
    }

    #[test]
    fn percent_sign_without_hex_digits_is_not_encoding() {
        // A bare '%' is not an encoded octet; the rule targets %XX forms.
        assert!(!contains_percent_encoding("100%"));
        assert!(contains_percent_encoding("a%2Fb"));
    }

    #[test]
    fn proxy_urls_require_scheme_and_host() {
        assert!(validate_proxy_url("http://proxy.corp.example:8080").is_ok());
        assert!(validate_proxy_url("https://proxy.corp.example").is_ok());
        assert!(validate_proxy_url("proxy.corp.example:8080").is_err());
        assert!(validate_proxy_url("http://:8080").is_err());
        assert!(validate_proxy_url("http://host:port").is_err());
        assert!(validate_proxy_url("").is_err());
    }

    #[test]
    fn env_var_names_follow_posix_rules() {
        assert!(validate_env_var_name("JAVA_HOME").is_ok());
        assert!(validate_env_var_name("_private").is_ok());
        assert!(validate_env_var_name("PATH2").is_ok());
        assert!(validate_env_var_name("").is_err());
        assert!(validate_env_var_name("2PATH").is_err());
        assert!(validate_env_var_name("MY-VAR").is_err());
        assert!(validate_env_var_name("A B").is_err());
    }
}
