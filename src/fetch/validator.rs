//! Address validation: the SSRF gate in front of every network fetch.
//!
//! A URL passes only if it is `http`/`https` with a host, and *every* address
//! the host resolves to is publicly routable. One internal answer among many
//! public ones is enough to reject the URL, so a record set that mixes a
//! private address into otherwise public answers is refused.
//!
//! Validation is a time-of-check decision. The HTTP client resolves the name
//! again when it connects, so a rebinding window between the two lookups
//! remains open; pinning the connection to the validated addresses is an
//! open hardening item.
//!
//! Redirects are a second one. The client refuses hops to internal IP
//! literals, but a hop to a host name is followed without passing through
//! this validator again.

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::{Host, Url};

use super::constants::DNS_TIMEOUT;
use super::error::FetchError;

/// Why an address is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressClass {
    /// RFC 1918, shared (CGNAT), unique-local, documentation and similar non-global ranges.
    Private,
    /// `127.0.0.0/8`, `::1`.
    Loopback,
    /// `169.254.0.0/16`, `fe80::/10`. Cloud metadata endpoints live here.
    LinkLocal,
    /// Unspecified, "this network", future-use, broadcast and IETF-reserved blocks.
    Reserved,
    /// `224.0.0.0/4`, `ff00::/8`.
    Multicast,
}

impl fmt::Display for AddressClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Private => "private",
            Self::Loopback => "loopback",
            Self::LinkLocal => "link-local",
            Self::Reserved => "reserved",
            Self::Multicast => "multicast",
        };
        f.write_str(name)
    }
}

/// Returns the blocking class of `ip`, or `None` for a public unicast address.
#[must_use]
pub fn classify_address(ip: IpAddr) -> Option<AddressClass> {
    match ip {
        IpAddr::V4(v4) => classify_ipv4(v4),
        IpAddr::V6(v6) => classify_ipv6(v6),
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> Option<AddressClass> {
    let [a, b, c, _] = ip.octets();

    if ip.is_loopback() {
        return Some(AddressClass::Loopback);
    }
    if ip.is_link_local() {
        return Some(AddressClass::LinkLocal);
    }
    if ip.is_multicast() {
        return Some(AddressClass::Multicast);
    }
    // 0.0.0.0/8 "this network", 240.0.0.0/4 future use (includes broadcast)
    if a == 0 || a >= 240 {
        return Some(AddressClass::Reserved);
    }
    if ip.is_private() || ip.is_documentation() {
        return Some(AddressClass::Private);
    }
    // 100.64.0.0/10 shared address space (carrier-grade NAT)
    if a == 100 && (b & 0xc0) == 64 {
        return Some(AddressClass::Private);
    }
    // 192.0.0.0/24 IETF protocol assignments
    if a == 192 && b == 0 && c == 0 {
        return Some(AddressClass::Private);
    }
    // 198.18.0.0/15 benchmarking
    if a == 198 && (b & 0xfe) == 18 {
        return Some(AddressClass::Private);
    }
    None
}

fn classify_ipv6(ip: Ipv6Addr) -> Option<AddressClass> {
    let segments = ip.segments();

    if ip.is_unspecified() {
        return Some(AddressClass::Reserved);
    }
    if ip.is_loopback() {
        return Some(AddressClass::Loopback);
    }
    if let Some(embedded) = embedded_ipv4(&segments) {
        return classify_ipv4(embedded);
    }
    if ip.is_multicast() {
        return Some(AddressClass::Multicast);
    }
    if ip.is_unicast_link_local() {
        return Some(AddressClass::LinkLocal);
    }
    if ip.is_unique_local() {
        return Some(AddressClass::Private);
    }
    // fec0::/10 deprecated site-local
    if (segments[0] & 0xffc0) == 0xfec0 {
        return Some(AddressClass::Reserved);
    }
    // 2001:db8::/32 documentation, 2001::/23 IETF protocol assignments (incl. Teredo)
    if (segments[0] == 0x2001 && segments[1] == 0x0db8)
        || (segments[0] == 0x2001 && segments[1] < 0x0200)
    {
        return Some(AddressClass::Private);
    }
    // Everything outside 2000::/3 global unicast that is not covered above is IETF-reserved
    if (segments[0] & 0xe000) != 0x2000 {
        return Some(AddressClass::Reserved);
    }
    None
}

/// Blocking verdict for a URL whose host is an IP literal; `None` for names and public literals.
pub(crate) fn classify_literal_host(url: &Url) -> Option<(String, IpAddr, AddressClass)> {
    let address = match url.host()? {
        Host::Ipv4(v4) => IpAddr::V4(v4),
        Host::Ipv6(v6) => IpAddr::V6(v6),
        Host::Domain(_) => return None,
    };
    classify_address(address).map(|class| (address.to_string(), address, class))
}

/// Extracts the IPv4 address carried by mapped, NAT64, and 6to4 IPv6 forms.
fn embedded_ipv4(segments: &[u16; 8]) -> Option<Ipv4Addr> {
    let from_pair = |hi: u16, lo: u16| {
        let [a, b] = hi.to_be_bytes();
        let [c, d] = lo.to_be_bytes();
        Ipv4Addr::new(a, b, c, d)
    };

    match segments {
        // ::ffff:0:0/96 IPv4-mapped
        [0, 0, 0, 0, 0, 0xffff, hi, lo] => Some(from_pair(*hi, *lo)),
        // 64:ff9b::/96 NAT64 well-known prefix
        [0x0064, 0xff9b, 0, 0, 0, 0, hi, lo] => Some(from_pair(*hi, *lo)),
        // 2002::/16 6to4
        [0x2002, hi, lo, ..] => Some(from_pair(*hi, *lo)),
        _ => None,
    }
}

/// Resolves a host name to every address it currently maps to.
///
/// Object safe so the validator can hold `Arc<dyn HostResolver>`; tests swap in
/// fixed answers without touching DNS.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Returns all addresses for `host`. An empty vector counts as a failure.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// Platform name resolution (`getaddrinfo` via tokio).
///
/// Unbounded on its own; [`AddressValidator`] applies the lookup timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// A URL that passed address validation.
///
/// Only [`AddressValidator::validate`] hands these out, so the fetcher cannot be
/// pointed at an unchecked URL by accident.
#[derive(Debug, Clone)]
pub struct ValidatedUrl {
    url: Url,
    addresses: Vec<IpAddr>,
}

impl ValidatedUrl {
    /// The parsed URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Addresses observed at validation time. Not re-checked at connect time.
    #[must_use]
    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// Wraps a URL without screening it. Lets unit tests reach a loopback mock server.
    #[cfg(test)]
    pub(crate) fn assume_validated(url: &str) -> Self {
        Self {
            url: Url::parse(url).unwrap_or_else(|e| panic!("test URL {url} must parse: {e}")),
            addresses: Vec::new(),
        }
    }
}

/// Screens URLs before any connection is attempted.
#[derive(Clone)]
pub struct AddressValidator {
    resolver: Arc<dyn HostResolver>,
    dns_timeout: Duration,
}

impl fmt::Debug for AddressValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressValidator")
            .field("dns_timeout", &self.dns_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for AddressValidator {
    fn default() -> Self {
        Self::new(Arc::new(SystemResolver))
    }
}

impl AddressValidator {
    /// Creates a validator backed by `resolver` with the default lookup timeout.
    #[must_use]
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            resolver,
            dns_timeout: DNS_TIMEOUT,
        }
    }

    /// Bounds each host name lookup. A lookup that outlives it fails closed.
    #[must_use]
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// The current lookup bound.
    #[must_use]
    pub fn dns_timeout(&self) -> Duration {
        self.dns_timeout
    }

    /// Parses `raw` and checks every address its host resolves to.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidScheme`] for non-`http(s)` or hostless input
    /// - [`FetchError::DnsResolutionFailed`] when the name cannot be resolved
    /// - [`FetchError::BlockedHost`] when any resolved address is internal
    #[instrument(skip(self, raw), fields(url = %raw))]
    pub async fn validate(&self, raw: &str) -> Result<ValidatedUrl, FetchError> {
        let url = Url::parse(raw).map_err(|_| FetchError::invalid_scheme(raw))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::invalid_scheme(raw));
        }
        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(v4)) => {
                return screen(url.clone(), &v4.to_string(), vec![IpAddr::V4(v4)]);
            }
            Some(Host::Ipv6(v6)) => {
                return screen(url.clone(), &v6.to_string(), vec![IpAddr::V6(v6)]);
            }
            _ => return Err(FetchError::invalid_scheme(raw)),
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let lookup = tokio::time::timeout(self.dns_timeout, self.resolver.resolve(&host, port));
        let addresses = match lookup.await {
            Ok(Ok(addresses)) if addresses.is_empty() => {
                warn!(host = %host, "name resolved to no addresses");
                let reason = "no addresses returned";
                return Err(FetchError::dns_resolution_failed(host, reason));
            }
            Ok(Ok(addresses)) => addresses,
            Ok(Err(e)) => {
                warn!(host = %host, error = %e, "name resolution failed");
                return Err(FetchError::dns_resolution_failed(host, e.to_string()));
            }
            Err(_) => {
                warn!(host = %host, timeout = ?self.dns_timeout, "name resolution timed out");
                let reason = format!("timed out after {:?}", self.dns_timeout);
                return Err(FetchError::dns_resolution_failed(host, reason));
            }
        };
        debug!(host = %host, addresses = ?addresses, "resolved host");

        screen(url, &host, addresses)
    }
}

fn screen(url: Url, host: &str, addresses: Vec<IpAddr>) -> Result<ValidatedUrl, FetchError> {
    for &address in &addresses {
        if let Some(class) = classify_address(address) {
            warn!(host = %host, address = %address, class = %class, "blocked host");
            return Err(FetchError::blocked_host(host, address, class));
        }
    }
    Ok(ValidatedUrl { url, addresses })
}
