//! Reverse-mapping names for PTR lookups (RFC 1035 §3.5, RFC 3596 §2.5).

use super::DomainError;
use std::fmt::Write;
use std::net::IpAddr;

const IPV4_REVERSE_ZONE: &str = "in-addr.arpa";
const IPV6_REVERSE_ZONE: &str = "ip6.arpa";

/// Parses user input into an address, rejecting anything that is not a
/// well-formed IPv4 or IPv6 literal.
pub fn parse_lookup_address(input: &str) -> Result<IpAddr, DomainError> {
    let trimmed = input.trim();
    trimmed
        .parse::<IpAddr>()
        .map_err(|_| DomainError::InvalidAddress(trimmed.to_string()))
}

/// `8.8.8.8` becomes `8.8.8.8.in-addr.arpa`; IPv6 addresses expand to 32
/// reversed nibbles under `ip6.arpa`.
pub fn reverse_name(addr: &IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{}.{}.{}.{}.{}", d, c, b, a, IPV4_REVERSE_ZONE)
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(64 + IPV6_REVERSE_ZONE.len());
            for byte in v6.octets().iter().rev() {
                let _ = write!(name, "{:x}.{:x}.", byte & 0x0f, byte >> 4);
            }
            name.push_str(IPV6_REVERSE_ZONE);
            name
        }
    }
}
