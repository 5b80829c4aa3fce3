//! Target sanitization: the SSRF gate.
//!
//! Turns a user-supplied string into a safe, fetchable https URL, or
//! rejects it. Internal-network targets are blocked three ways: by host
//! keyword, by literal address class, and by the address classes every
//! DNS answer resolves to (DNS-rebinding defense). DNS failures fail
//! closed: an unresolvable host is not scanned.

use crate::error::{Result, ScanError};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Host substrings that mark internal/corporate targets regardless of how
/// they resolve.
const BLOCKED_HOST_KEYWORDS: &[&str] = &["internal", "local", "corp", "intranet", "private"];

/// A validated, fetchable scan target. Scheme is always `https`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedTarget {
    /// Full normalized URL
    pub href: String,
    /// Scheme + host (+ port) origin string
    pub origin: String,
    /// Host component
    pub host: String,
}

/// Validate and normalize a raw user input into a `SanitizedTarget`.
///
/// # Errors
/// - `InvalidTarget` for empty/unparseable input or a non-https scheme
/// - `DisallowedTarget` for internal keywords, private/loopback/link-local/
///   multicast addresses (literal or DNS-resolved), and DNS failures
pub async fn sanitize(raw_input: &str) -> Result<SanitizedTarget> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidTarget("empty input".to_string()));
    }

    // Prepend https when no scheme is present; never downgrade.
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ScanError::InvalidTarget(format!("unparseable URL '{trimmed}': {e}")))?;

    if url.scheme() != "https" {
        return Err(ScanError::InvalidTarget(format!(
            "only https targets are supported, got scheme '{}'",
            url.scheme()
        )));
    }

    let host = url
        .host()
        .ok_or_else(|| ScanError::InvalidTarget("target has no host".to_string()))?;

    match host {
        Host::Ipv4(ip) => reject_disallowed_ip(IpAddr::V4(ip))?,
        Host::Ipv6(ip) => reject_disallowed_ip(IpAddr::V6(ip))?,
        Host::Domain(domain) => {
            check_keywords(domain)?;
            resolve_and_check(domain).await?;
        }
    }

    let host_str = url
        .host_str()
        .map(ToString::to_string)
        .unwrap_or_default();

    Ok(SanitizedTarget {
        href: url.to_string(),
        origin: url.origin().ascii_serialization(),
        host: host_str,
    })
}

fn check_keywords(domain: &str) -> Result<()> {
    let lowered = domain.to_ascii_lowercase();
    for keyword in BLOCKED_HOST_KEYWORDS {
        if lowered.contains(keyword) {
            return Err(ScanError::DisallowedTarget(format!(
                "host '{domain}' matches blocked keyword '{keyword}'"
            )));
        }
    }
    Ok(())
}

/// Resolve the domain and check every answer. Fail closed on resolution
/// failure; a transient DNS error simply fails the request (no retries).
async fn resolve_and_check(domain: &str) -> Result<()> {
    let addrs = tokio::net::lookup_host((domain, 443))
        .await
        .map_err(|e| {
            ScanError::DisallowedTarget(format!("host '{domain}' did not resolve: {e}"))
        })?;

    let mut resolved_any = false;
    for addr in addrs {
        resolved_any = true;
        reject_disallowed_ip(addr.ip()).map_err(|_| {
            ScanError::DisallowedTarget(format!(
                "host '{domain}' resolves to a blocked address {}",
                addr.ip()
            ))
        })?;
    }

    if resolved_any {
        Ok(())
    } else {
        Err(ScanError::DisallowedTarget(format!(
            "host '{domain}' did not resolve to any address"
        )))
    }
}

/// Per-hop vetting for HTTP redirects: a public host must not be able to
/// bounce the fetcher onto an internal target or downgrade the scheme.
/// Redirect handling is synchronous, so DNS answers are not re-checked
/// here; the scheme, literal address classes, and the keyword blocklist
/// are.
pub(crate) fn redirect_allowed(url: &Url) -> bool {
    if url.scheme() != "https" {
        return false;
    }
    match url.host() {
        Some(Host::Ipv4(ip)) => !is_disallowed_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => !is_disallowed_ip(IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => check_keywords(domain).is_ok(),
        None => false,
    }
}

fn reject_disallowed_ip(ip: IpAddr) -> Result<()> {
    if is_disallowed_ip(ip) {
        Err(ScanError::DisallowedTarget(format!(
            "address {ip} is not publicly routable"
        )))
    } else {
        Ok(())
    }
}

/// Address classes that must never be fetched: loopback, RFC1918 and
/// CGNAT ranges, link-local, multicast, unspecified, broadcast, and
/// their IPv6 equivalents (including IPv4-mapped forms).
fn is_disallowed_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_disallowed_v4(v4),
        IpAddr::V6(v6) => is_disallowed_v6(v6),
    }
}

fn is_disallowed_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_unspecified()
        // CGNAT 100.64.0.0/10
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        // 0.0.0.0/8 "this network"
        || octets[0] == 0
}

fn is_disallowed_v6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_disallowed_v4(mapped);
    }
    let segments = ip.segments();
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // Unique-local fc00::/7
        || (segments[0] & 0xfe00) == 0xfc00
        // Link-local fe80::/10
        || (segments[0] & 0xffc0) == 0xfe80
}
