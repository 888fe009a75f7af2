//! CIDR/IP matcher and its blocklist
//!
//! Exact addresses live in a set keyed by their lower-cased literal; ranges
//! keep insertion order so that the first matching range is deterministic.
//! Containment uses `ipnet` prefix masking for both families.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{debug, info};

/// Reason reported for an exact-address match
pub const EXACT_MATCH_REASON: &str = "IP address is in blocklist";

/// Result of checking an address against the blocklist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCheck {
    pub blocked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// The address that matched, as normalized for lookup
    #[serde(rename = "matchedIP", skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
}

impl BlockCheck {
    fn clear() -> Self {
        Self::default()
    }

    fn hit(ip: String, reason: String) -> Self {
        Self {
            blocked: true,
            reason: Some(reason),
            matched: Some(ip),
        }
    }
}

/// Snapshot of the blocklist contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlocklistEntries {
    /// Exact addresses, sorted
    pub addresses: Vec<String>,

    /// Ranges, in insertion order
    pub ranges: Vec<String>,
}

#[derive(Debug, Clone)]
struct BlockedRange {
    cidr: String,
    net: IpNet,
}

#[derive(Debug, Default)]
struct Blocklist {
    addresses: HashSet<String>,
    ranges: Vec<BlockedRange>,
}

/// Thread-safe IP/CIDR matcher.
///
/// Reads take a shared lock for the whole check, so a concurrent update is
/// observed either entirely or not at all.
#[derive(Debug, Default)]
pub struct IpMatcher {
    inner: RwLock<Blocklist>,
}

impl IpMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `ip` is a dotted-quad IPv4 address, a full eight-group IPv6
    /// address, or one of the literals `::` and `::1`
    pub fn validate_address(ip: &str) -> bool {
        parse_address(ip).is_some()
    }

    /// Whether `cidr` is `address/prefix` with a prefix in range for the family
    pub fn validate_range(cidr: &str) -> bool {
        parse_range(cidr).is_some()
    }

    /// Block an exact address. Returns false when the address is invalid.
    pub fn add_address(&self, ip: &str) -> bool {
        if !Self::validate_address(ip) {
            return false;
        }

        let normalized = ip.to_ascii_lowercase();
        info!(ip = %normalized, "Address blocked");
        self.inner.write().addresses.insert(normalized);
        true
    }

    /// Unblock an exact address. Returns false when it was not blocked.
    pub fn remove_address(&self, ip: &str) -> bool {
        let removed = self.inner.write().addresses.remove(&ip.to_ascii_lowercase());
        if removed {
            info!(ip, "Address unblocked");
        }
        removed
    }

    /// Block a range. Adding a range that is already present is a no-op.
    pub fn add_range(&self, cidr: &str) -> bool {
        let Some(net) = parse_range(cidr) else {
            return false;
        };

        let cidr = cidr.to_ascii_lowercase();
        let mut inner = self.inner.write();
        if !inner.ranges.iter().any(|r| r.cidr == cidr) {
            info!(cidr = %cidr, "Range blocked");
            inner.ranges.push(BlockedRange { cidr, net });
        }
        true
    }

    /// Unblock a range. Returns false when it was not blocked.
    pub fn remove_range(&self, cidr: &str) -> bool {
        let cidr = cidr.to_ascii_lowercase();
        let mut inner = self.inner.write();
        let before = inner.ranges.len();
        inner.ranges.retain(|r| r.cidr != cidr);

        let removed = inner.ranges.len() != before;
        if removed {
            info!(cidr = %cidr, "Range unblocked");
        }
        removed
    }

    /// Check an address; invalid input is never blocked
    pub fn check(&self, ip: &str) -> BlockCheck {
        let Some(addr) = parse_address(ip) else {
            if !ip.is_empty() {
                debug!(ip, "Skipping block check for invalid address");
            }
            return BlockCheck::clear();
        };

        let normalized = ip.to_ascii_lowercase();
        let inner = self.inner.read();

        if inner.addresses.contains(&normalized) {
            return BlockCheck::hit(normalized, EXACT_MATCH_REASON.to_string());
        }

        inner
            .ranges
            .iter()
            .find(|range| range.net.contains(&addr))
            .map(|range| {
                BlockCheck::hit(
                    normalized.clone(),
                    format!("IP address is in blocked range {}", range.cidr),
                )
            })
            .unwrap_or_else(BlockCheck::clear)
    }

    /// Current contents
    pub fn list(&self) -> BlocklistEntries {
        let inner = self.inner.read();
        let mut addresses: Vec<String> = inner.addresses.iter().cloned().collect();
        addresses.sort();

        BlocklistEntries {
            addresses,
            ranges: inner.ranges.iter().map(|r| r.cidr.clone()).collect(),
        }
    }

    /// Remove every address and range
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.addresses.clear();
        inner.ranges.clear();
        info!("Blocklist cleared");
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.addresses.is_empty() && inner.ranges.is_empty()
    }
}

fn parse_address(ip: &str) -> Option<IpAddr> {
    if ip.contains('.') {
        parse_ipv4(ip).map(IpAddr::V4)
    } else if ip.contains(':') {
        parse_ipv6(ip).map(IpAddr::V6)
    } else {
        None
    }
}

/// Four dot-separated decimal octets, leading zeros allowed
fn parse_ipv4(ip: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = ip.split('.');

    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse::<u16>().ok().and_then(|v| u8::try_from(v).ok())?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}

/// Eight colon-separated groups of one to four hex digits, or `::` / `::1`
fn parse_ipv6(ip: &str) -> Option<Ipv6Addr> {
    match ip {
        "::" => return Some(Ipv6Addr::UNSPECIFIED),
        "::1" => return Some(Ipv6Addr::LOCALHOST),
        _ => {}
    }

    let mut segments = [0u16; 8];
    let mut parts = ip.split(':');

    for segment in segments.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 4 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        *segment = u16::from_str_radix(part, 16).ok()?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(Ipv6Addr::from(segments))
}

fn parse_range(cidr: &str) -> Option<IpNet> {
    let (address, prefix) = cidr.split_once('/')?;
    if prefix.contains('/') || prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let prefix: u8 = prefix.parse().ok()?;

    match parse_address(address)? {
        IpAddr::V4(addr) => Ipv4Net::new(addr, prefix).ok().map(IpNet::V4),
        IpAddr::V6(addr) => Ipv6Net::new(addr, prefix).ok().map(IpNet::V6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ipv4() {
        assert!(IpMatcher::validate_address("192.168.1.1"));
        assert!(IpMatcher::validate_address("0.0.0.0"));
        assert!(IpMatcher::validate_address("255.255.255.255"));
        assert!(IpMatcher::validate_address("010.001.000.009"));

        assert!(!IpMatcher::validate_address("256.1.1.1"));
        assert!(!IpMatcher::validate_address("192.168.1"));
        assert!(!IpMatcher::validate_address("192.168.1.1.1"));
        assert!(!IpMatcher::validate_address("192.168.1.x"));
        assert!(!IpMatcher::validate_address("1234.1.1.1"));
        assert!(!IpMatcher::validate_address("localhost"));
        assert!(!IpMatcher::validate_address(""));
    }

    #[test]
    fn test_validate_ipv6() {
        assert!(IpMatcher::validate_address("2001:0db8:85a3:0000:0000:8a2e:0370:7334"));
        assert!(IpMatcher::validate_address("2001:db8:0:0:0:0:0:1"));
        assert!(IpMatcher::validate_address("::"));
        assert!(IpMatcher::validate_address("::1"));

        assert!(!IpMatcher::validate_address("2001:db8::1"));
        assert!(!IpMatcher::validate_address("2001:db8:0:0:0:0:0"));
        assert!(!IpMatcher::validate_address("2001:db8:0:0:0:0:0:g"));
        assert!(!IpMatcher::validate_address("2001:db8:0:0:0:0:0:12345"));
    }

    #[test]
    fn test_validate_range() {
        assert!(IpMatcher::validate_range("192.168.1.0/24"));
        assert!(IpMatcher::validate_range("10.0.0.0/0"));
        assert!(IpMatcher::validate_range("10.0.0.1/32"));
        assert!(IpMatcher::validate_range("2001:db8:0:0:0:0:0:0/32"));
        assert!(IpMatcher::validate_range("::/0"));

        assert!(!IpMatcher::validate_range("192.168.1.0/33"));
        assert!(!IpMatcher::validate_range("192.168.1.0"));
        assert!(!IpMatcher::validate_range("192.168.1.0/"));
        assert!(!IpMatcher::validate_range("192.168.1.0/24/8"));
        assert!(!IpMatcher::validate_range("192.168.1.0/-1"));
        assert!(!IpMatcher::validate_range("2001:db8:0:0:0:0:0:0/129"));
        assert!(!IpMatcher::validate_range("bogus/8"));
    }

    #[test]
    fn test_block_then_unblock_address() {
        let matcher = IpMatcher::new();
        assert!(matcher.add_address("192.168.1.100"));
        assert!(matcher.check("192.168.1.100").blocked);

        assert!(matcher.remove_address("192.168.1.100"));
        assert!(!matcher.check("192.168.1.100").blocked);
        assert!(!matcher.remove_address("192.168.1.100"));
    }

    #[test]
    fn test_invalid_add_leaves_blocklist_unchanged() {
        let matcher = IpMatcher::new();
        assert!(!matcher.add_address("not-an-ip"));
        assert!(!matcher.add_range("192.168.1.0/33"));
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_range_containment() {
        let matcher = IpMatcher::new();
        assert!(matcher.add_range("192.168.1.0/24"));

        assert!(matcher.check("192.168.1.1").blocked);
        assert!(matcher.check("192.168.1.254").blocked);
        assert!(!matcher.check("192.168.2.1").blocked);

        let check = matcher.check("192.168.1.1");
        assert_eq!(
            check.reason.as_deref(),
            Some("IP address is in blocked range 192.168.1.0/24")
        );
        assert_eq!(check.matched.as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn test_exact_match_wins_over_range() {
        let matcher = IpMatcher::new();
        matcher.add_range("10.0.0.0/8");
        matcher.add_address("10.1.2.3");

        let check = matcher.check("10.1.2.3");
        assert_eq!(check.reason.as_deref(), Some(EXACT_MATCH_REASON));
    }

    #[test]
    fn test_first_inserted_range_wins() {
        let matcher = IpMatcher::new();
        matcher.add_range("10.0.0.0/8");
        matcher.add_range("10.1.0.0/16");

        let check = matcher.check("10.1.2.3");
        assert_eq!(
            check.reason.as_deref(),
            Some("IP address is in blocked range 10.0.0.0/8")
        );
    }

    #[test]
    fn test_duplicate_range_is_noop() {
        let matcher = IpMatcher::new();
        assert!(matcher.add_range("10.0.0.0/8"));
        assert!(matcher.add_range("10.0.0.0/8"));
        assert_eq!(matcher.list().ranges, vec!["10.0.0.0/8".to_string()]);

        assert!(matcher.remove_range("10.0.0.0/8"));
        assert!(!matcher.remove_range("10.0.0.0/8"));
    }

    #[test]
    fn test_ipv6_range_masking() {
        let matcher = IpMatcher::new();
        matcher.add_range("2001:db8:0:0:0:0:0:0/32");

        assert!(matcher.check("2001:0db8:ffff:0:0:0:0:1").blocked);
        assert!(!matcher.check("2001:0db9:0:0:0:0:0:1").blocked);
        // Families never cross
        assert!(!matcher.check("32.1.13.184").blocked);
    }

    #[test]
    fn test_address_case_normalized() {
        let matcher = IpMatcher::new();
        matcher.add_address("2001:DB8:0:0:0:0:0:1");
        assert!(matcher.check("2001:db8:0:0:0:0:0:1").blocked);
        assert!(matcher.remove_address("2001:Db8:0:0:0:0:0:1"));
    }

    #[test]
    fn test_invalid_check_fails_open() {
        let matcher = IpMatcher::new();
        matcher.add_range("0.0.0.0/0");

        assert_eq!(matcher.check(""), BlockCheck::default());
        assert!(!matcher.check("unknown").blocked);
        assert!(matcher.check("8.8.8.8").blocked);
    }

    #[test]
    fn test_list_and_clear() {
        let matcher = IpMatcher::new();
        matcher.add_address("10.0.0.2");
        matcher.add_address("10.0.0.1");
        matcher.add_range("172.16.0.0/12");

        let entries = matcher.list();
        assert_eq!(entries.addresses, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(entries.ranges, vec!["172.16.0.0/12"]);

        matcher.clear();
        assert!(matcher.is_empty());
        assert!(!matcher.check("10.0.0.1").blocked);
    }
}
