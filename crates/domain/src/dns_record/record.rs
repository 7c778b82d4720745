use super::{RecordClass, RecordType};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    /// Target of a PTR, CNAME or NS record, without the trailing dot.
    Name(Arc<str>),
    Opaque(Arc<[u8]>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: Arc<str>,

    pub record_type: RecordType,

    pub record_class: RecordClass,

    pub ttl: u32,

    pub data: RecordData,
}

impl DnsRecord {
    pub fn new(
        name: impl Into<Arc<str>>,
        record_type: RecordType,
        ttl: u32,
        data: RecordData,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            record_class: RecordClass::IN,
            ttl,
            data,
        }
    }

    pub fn address(&self) -> Option<IpAddr> {
        match self.data {
            RecordData::A(v4) => Some(IpAddr::V4(v4)),
            RecordData::AAAA(v6) => Some(IpAddr::V6(v6)),
            _ => None,
        }
    }

    pub fn target_name(&self) -> Option<&str> {
        match &self.data {
            RecordData::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn remaining_ttl(&self, elapsed_secs: u32) -> u32 {
        self.ttl.saturating_sub(elapsed_secs)
    }
}
