use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerHealth {
    Healthy,
    /// Failed its last attempt budget; tried after healthy servers.
    Suspected,
    /// Failed several consecutive budgets; tried last.
    Dead,
}

impl ServerHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Suspected => "suspected",
            Self::Dead => "dead",
        }
    }

    /// Position in the failover order, lower is tried first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Suspected => 1,
            Self::Dead => 2,
        }
    }
}

impl fmt::Display for ServerHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamServer {
    pub addr: SocketAddr,
    pub health: ServerHealth,
    pub consecutive_failures: u16,
}

impl UpstreamServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            health: ServerHealth::Healthy,
            consecutive_failures: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.health = ServerHealth::Healthy;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self, dead_after_failures: u16) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.health = if self.consecutive_failures >= dead_after_failures.max(1) {
            ServerHealth::Dead
        } else {
            ServerHealth::Suspected
        };
    }
}

impl fmt::Display for UpstreamServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "udp://{}", self.addr)
    }
}

impl FromStr for UpstreamServer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_upstream_addr(s).map(UpstreamServer::new)
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let rest = &s[end + 1..];
        let port_str = rest.strip_prefix(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

/// Accepts `IP`, `IP:PORT`, `[IPv6]:PORT`, each optionally prefixed with
/// `udp://`. Hostnames are rejected: a stub resolver cannot resolve its own
/// upstreams.
pub fn parse_upstream_addr(s: &str) -> Result<SocketAddr, String> {
    let addr_str = s.trim();
    let addr_str = addr_str.strip_prefix("udp://").unwrap_or(addr_str);

    if let Ok(addr) = addr_str.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = addr_str.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT));
    }
    if let Some(ip) = addr_str
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|inner| inner.parse::<IpAddr>().ok())
    {
        return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT));
    }
    if let Some((host, port)) = parse_host_port(addr_str) {
        return Err(format!(
            "Upstream '{}' must be an IP address, got hostname '{}' (port {})",
            s, host, port
        ));
    }
    Err(format!(
        "Invalid upstream format: '{}'. Expected: IP, IP:PORT, [IPv6]:PORT or udp://IP:PORT",
        s
    ))
}
