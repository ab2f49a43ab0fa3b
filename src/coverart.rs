//! Cover art download, the tightened-per-spec successor to
//! `downloadcoverart` in the original `metaaudio.py` (which did an
//! unchecked `requests.get` and trusted whatever the server sent back).
//!
//! This version refuses anything that isn't a plain `http(s)` URL
//! resolving to a public host, checks the response's declared
//! `Content-Type` before trusting the body, and caps how much it reads.

use std::fmt;
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use tempfile::NamedTempFile;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_BODY_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug)]
pub enum CoverArtError {
    UnsupportedScheme(String),
    NoHost,
    UnresolvableHost(String),
    PrivateHost(String),
    RequestFailed(String),
    UnexpectedContentType(String),
    TooLarge,
    WriteFailed(String),
}

impl fmt::Display for CoverArtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverArtError::UnsupportedScheme(scheme) => write!(f, "unsupported URL scheme: {}", scheme),
            CoverArtError::NoHost => write!(f, "cover art URL has no host"),
            CoverArtError::UnresolvableHost(host) => write!(f, "could not resolve host: {}", host),
            CoverArtError::PrivateHost(host) => write!(f, "refusing to fetch cover art from a non-public host: {}", host),
            CoverArtError::RequestFailed(detail) => write!(f, "cover art request failed: {}", detail),
            CoverArtError::UnexpectedContentType(content_type) => {
                write!(f, "expected image/jpeg, got Content-Type: {}", content_type)
            }
            CoverArtError::TooLarge => write!(f, "cover art exceeds the 5 MiB size cap"),
            CoverArtError::WriteFailed(detail) => write!(f, "failed to buffer cover art: {}", detail),
        }
    }
}

impl std::error::Error for CoverArtError {}

/// Download `url` to a temporary `.jpeg` file, or reject it. The caller is
/// responsible for the returned [`NamedTempFile`]'s lifetime: it is
/// removed from disk when dropped.
pub fn fetch_cover_art(url: &str) -> Result<NamedTempFile, CoverArtError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| CoverArtError::RequestFailed(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CoverArtError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = parsed.host_str().ok_or(CoverArtError::NoHost)?.to_string();
    let port = parsed.port_or_known_default().unwrap_or(443);

    let resolved: Vec<IpAddr> = (host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| CoverArtError::UnresolvableHost(format!("{}: {}", host, e)))?
        .map(|addr| addr.ip())
        .collect();

    if resolved.is_empty() {
        return Err(CoverArtError::UnresolvableHost(host));
    }

    if let Some(non_public) = resolved.iter().find(|ip| !is_public_ip(ip)) {
        return Err(CoverArtError::PrivateHost(format!("{} ({})", host, non_public)));
    }

    // Pin the connection to the IPs just validated as public, instead of
    // letting reqwest re-resolve the hostname at connect time: a second
    // lookup could return a different (attacker-controlled, private)
    // address than the one `is_public_ip` approved above.
    let pinned_addrs: Vec<SocketAddr> = resolved.iter().map(|ip| SocketAddr::new(*ip, port)).collect();
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .resolve_to_addrs(&host, &pinned_addrs)
        .build()
        .map_err(|e| CoverArtError::RequestFailed(e.to_string()))?;

    let response = client.get(parsed).send().map_err(|e| CoverArtError::RequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CoverArtError::RequestFailed(format!("HTTP {}", response.status().as_u16())));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.starts_with("image/jpeg") && !content_type.starts_with("image/jpg") {
        return Err(CoverArtError::UnexpectedContentType(content_type));
    }

    let mut limited_body = response.take(MAX_BODY_BYTES + 1);
    let mut buffer = Vec::new();
    limited_body
        .read_to_end(&mut buffer)
        .map_err(|e| CoverArtError::RequestFailed(e.to_string()))?;

    if buffer.len() as u64 > MAX_BODY_BYTES {
        return Err(CoverArtError::TooLarge);
    }

    let mut temp_file = tempfile::Builder::new()
        .suffix(".jpeg")
        .tempfile()
        .map_err(|e| CoverArtError::WriteFailed(e.to_string()))?;
    temp_file.write_all(&buffer).map_err(|e| CoverArtError::WriteFailed(e.to_string()))?;
    temp_file.flush().map_err(|e| CoverArtError::WriteFailed(e.to_string()))?;

    Ok(temp_file)
}

/// Conservative "is this a host we should make outbound requests to"
/// check: rejects loopback, private, link-local, multicast, unspecified
/// and other reserved ranges for both IPv4 and IPv6.
fn is_public_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast()
                || v4.is_unspecified())
        }
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_multicast() || v6.is_unspecified() || is_unique_local(v6) || is_unicast_link_local(v6)),
    }
}

fn is_unique_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}

fn is_unicast_link_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn rejects_loopback_and_private_hosts() {
        assert!(!is_public_ip(&IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(!is_public_ip(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
        assert!(!is_public_ip(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(!is_public_ip(&IpAddr::V4(Ipv4Addr::new(169, 254, 1, 1))));
        assert!(!is_public_ip(&IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(!is_public_ip(&IpAddr::V6(Ipv6Addr::UNSPECIFIED)));
    }

    #[test]
    fn accepts_a_plausible_public_address() {
        assert!(is_public_ip(&IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
    }

    #[test]
    fn rejects_a_non_http_scheme() {
        let err = fetch_cover_art("ftp://example.com/art.jpg").unwrap_err();
        assert!(matches!(err, CoverArtError::UnsupportedScheme(_)));
    }
}
