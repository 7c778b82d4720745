use ferrous_resolver_domain::DomainError;
use std::fmt;

pub const HEADER_LEN: usize = 12;

const QR_FLAG: u16 = 0x8000;
const OPCODE_MASK: u16 = 0x7800;
const OPCODE_SHIFT: u16 = 11;
const AA_FLAG: u16 = 0x0400;
const TC_FLAG: u16 = 0x0200;
const RD_FLAG: u16 = 0x0100;
const RA_FLAG: u16 = 0x0080;
const RCODE_MASK: u16 = 0x000F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NXDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            other => Self::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NXDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::Other(_) => "RCODE",
        }
    }

    /// Anything other than NOERROR or NXDOMAIN means the server answered but
    /// cannot help, so the next server should be tried.
    pub fn ends_server_budget(&self) -> bool {
        !matches!(self, Self::NoError | Self::NXDomain)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "RCODE{}", code),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Fixed 12-byte message header (RFC 1035 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl Header {
    pub fn query(id: u16, recursion_desired: bool) -> Self {
        Self {
            id,
            flags: if recursion_desired { RD_FLAG } else { 0 },
            qd_count: 1,
            ..Self::default()
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DomainError> {
        if bytes.len() < HEADER_LEN {
            return Err(DomainError::TruncatedMessage(format!(
                "header needs {} bytes, got {}",
                HEADER_LEN,
                bytes.len()
            )));
        }
        let word = |i: usize| u16::from_be_bytes([bytes[i], bytes[i + 1]]);
        Ok(Self {
            id: word(0),
            flags: word(2),
            qd_count: word(4),
            an_count: word(6),
            ns_count: word(8),
            ar_count: word(10),
        })
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        for word in [
            self.id,
            self.flags,
            self.qd_count,
            self.an_count,
            self.ns_count,
            self.ar_count,
        ] {
            buf.extend_from_slice(&word.to_be_bytes());
        }
    }

    pub fn is_response(&self) -> bool {
        self.flags & QR_FLAG != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags & OPCODE_MASK) >> OPCODE_SHIFT) as u8
    }

    pub fn authoritative(&self) -> bool {
        self.flags & AA_FLAG != 0
    }

    pub fn truncated(&self) -> bool {
        self.flags & TC_FLAG != 0
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & RD_FLAG != 0
    }

    pub fn recursion_available(&self) -> bool {
        self.flags & RA_FLAG != 0
    }

    pub fn response_code(&self) -> ResponseCode {
        ResponseCode::from_u8((self.flags & RCODE_MASK) as u8)
    }
}
