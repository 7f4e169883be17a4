//! Where the chat service lives.
//!
//! An explicit URL always wins. Without one, the URL is derived from a host
//! name hint:
//!
//! 1. GitHub Codespaces style hosts (`<name>-<port>.app.github.dev`) get their
//!    forwarded-port segment rewritten to the backend port, over https.
//! 2. No host, or a loopback host, means the backend on this machine.
//! 3. Any other host is assumed to run the backend itself on the backend port.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use thiserror::Error;

pub const BACKEND_PORT: u16 = 5000;
const LOOPBACK_HOST: &str = "127.0.0.1";

const HOSTED_DEV_SUFFIX: &str = "github.dev";
const LOOPBACK_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "::1", "[::1]"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("backend URL is empty")]
    Empty,

    #[error("invalid backend URL `{url}`: {reason}")]
    Invalid { url: String, reason: String },

    #[error("backend URL `{0}` must use http or https")]
    UnsupportedScheme(String),
}

/// Which resolution rule produced an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Explicit,
    HostedDev,
    Loopback,
    SameHost,
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointSource::Explicit => "explicit configuration",
            EndpointSource::HostedDev => "hosted development domain",
            EndpointSource::Loopback => "loopback default",
            EndpointSource::SameHost => "same host",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    url: String,
    source: EndpointSource,
}

impl BackendEndpoint {
    /// Validate a user-supplied base URL.
    pub fn explicit(url: &str) -> Result<Self, EndpointError> {
        Self::validated(url, EndpointSource::Explicit)
    }

    pub fn resolve(explicit: Option<&str>, host: Option<&str>) -> Result<Self, EndpointError> {
        if let Some(url) = explicit.filter(|u| !u.trim().is_empty()) {
            return Self::explicit(url);
        }

        let host = host.map(str::trim).filter(|h| !h.is_empty());
        match host {
            Some(host) if is_hosted_dev(host) => Self::validated(
                &format!("https://{}", hosted_dev_backend_host(host)),
                EndpointSource::HostedDev,
            ),
            Some(host) if !is_loopback(host) => {
                let host = if host.contains(':') && !host.starts_with('[') {
                    format!("[{}]", host)
                } else {
                    host.to_string()
                };
                Self::validated(
                    &format!("http://{}:{}", host, BACKEND_PORT),
                    EndpointSource::SameHost,
                )
            }
            _ => Self::validated(&loopback_url(), EndpointSource::Loopback),
        }
    }

    /// A hosted-dev host that already names the backend port, used as is.
    pub fn forwarded(host: &str) -> Result<Self, EndpointError> {
        Self::validated(&format!("https://{}", host.trim()), EndpointSource::HostedDev)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> EndpointSource {
        self.source
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.url)
    }

    fn validated(url: &str, source: EndpointSource) -> Result<Self, EndpointError> {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(EndpointError::Empty);
        }

        let parsed = Url::parse(trimmed).map_err(|e| EndpointError::Invalid {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme(trimmed.to_string()));
        }
        if parsed.host_str().is_none() {
            return Err(EndpointError::Invalid {
                url: trimmed.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            url: trimmed.to_string(),
            source,
        })
    }
}

pub fn loopback_url() -> String {
    format!("http://{}:{}", LOOPBACK_HOST, BACKEND_PORT)
}

fn is_hosted_dev(host: &str) -> bool {
    host == HOSTED_DEV_SUFFIX || host.ends_with(&format!(".{}", HOSTED_DEV_SUFFIX))
}

fn is_loopback(host: &str) -> bool {
    LOOPBACK_HOSTS.contains(&host)
}

/// `name-3000.app.github.dev` -> `name-5000.app.github.dev`.
/// A first label with no port suffix gets one appended.
fn hosted_dev_backend_host(host: &str) -> String {
    static PORT_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let port_suffix = PORT_SUFFIX.get_or_init(|| Regex::new(r"-\d+$").expect("valid regex"));

    let (first, rest) = match host.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (host, None),
    };
    let base = port_suffix.replace(first, "");
    let label = format!("{}-{}", base, BACKEND_PORT);

    match rest {
        Some(rest) => format!("{}.{}", label, rest),
        None => label,
    }
}
