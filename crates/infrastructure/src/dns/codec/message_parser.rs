use super::header::{Header, HEADER_LEN};
use super::message::Message;
use super::name::decode_name;
use ferrous_resolver_domain::{
    DnsRecord, DomainError, Question, RecordClass, RecordData, RecordType,
};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Parses a complete message.
///
/// A message with TC=1 may legitimately stop short of its declared counts;
/// whatever sections were fully present are returned. Otherwise a count that
/// the buffer cannot satisfy is an error.
pub fn decode_message(bytes: &[u8]) -> Result<Message, DomainError> {
    let header = Header::parse(bytes)?;
    let mut reader = Reader::new(bytes, HEADER_LEN);

    let mut message = Message {
        header,
        questions: Vec::with_capacity(usize::from(header.qd_count)),
        answers: Vec::with_capacity(usize::from(header.an_count)),
        authorities: Vec::new(),
        additionals: Vec::new(),
    };

    for parsed in 0..header.qd_count {
        if reader.at_end() {
            return short_section(message, "question", header.qd_count, parsed);
        }
        let question = match reader.read_question() {
            Ok(question) => question,
            Err(DomainError::TruncatedMessage(_)) if header.truncated() => {
                return Ok(message);
            }
            Err(e) => return Err(e),
        };
        message.questions.push(question);
    }

    let sections = [
        ("answer", header.an_count),
        ("authority", header.ns_count),
        ("additional", header.ar_count),
    ];
    for (index, (section, count)) in sections.into_iter().enumerate() {
        for parsed in 0..count {
            if reader.at_end() {
                return short_section(message, section, count, parsed);
            }
            let record = match reader.read_record() {
                Ok(record) => record,
                Err(DomainError::TruncatedMessage(_)) if header.truncated() => {
                    return Ok(message);
                }
                Err(e) => return Err(e),
            };
            match index {
                0 => message.answers.push(record),
                1 => message.authorities.push(record),
                _ => message.additionals.push(record),
            }
        }
    }

    Ok(message)
}

fn short_section(
    message: Message,
    section: &str,
    declared: u16,
    parsed: u16,
) -> Result<Message, DomainError> {
    if message.header.truncated() {
        return Ok(message);
    }
    Err(DomainError::MalformedMessage(format!(
        "header declares {} {} records, message holds {}",
        declared, section, parsed
    )))
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DomainError> {
        let slice = self.buf.get(self.pos..self.pos + n).ok_or_else(|| {
            DomainError::TruncatedMessage(format!(
                "need {} bytes at offset {}, message is {} bytes",
                n,
                self.pos,
                self.buf.len()
            ))
        })?;
        self.pos += n;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16, DomainError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DomainError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_name(&mut self) -> Result<String, DomainError> {
        let (name, next) = decode_name(self.buf, self.pos)?;
        self.pos = next;
        Ok(name)
    }

    fn read_question(&mut self) -> Result<Question, DomainError> {
        let name = self.read_name()?;
        let record_type = RecordType::from_u16(self.read_u16()?);
        let record_class = RecordClass::from_u16(self.read_u16()?);
        Ok(Question {
            name: name.into(),
            record_type,
            record_class,
        })
    }

    fn read_record(&mut self) -> Result<DnsRecord, DomainError> {
        let name = self.read_name()?;
        let record_type = RecordType::from_u16(self.read_u16()?);
        let record_class = RecordClass::from_u16(self.read_u16()?);
        let ttl = self.read_u32()?;
        let rdlength = usize::from(self.read_u16()?);
        let rdata_start = self.pos;
        let rdata = self.take(rdlength)?;

        let data = match record_type {
            RecordType::A => {
                let octets: [u8; 4] = rdata.try_into().map_err(|_| {
                    DomainError::MalformedMessage(format!(
                        "A record for {} has {} bytes of data",
                        name, rdlength
                    ))
                })?;
                RecordData::A(Ipv4Addr::from(octets))
            }
            RecordType::AAAA => {
                let octets: [u8; 16] = rdata.try_into().map_err(|_| {
                    DomainError::MalformedMessage(format!(
                        "AAAA record for {} has {} bytes of data",
                        name, rdlength
                    ))
                })?;
                RecordData::AAAA(Ipv6Addr::from(octets))
            }
            t if t.carries_name() => {
                let (target, end) = decode_name(self.buf, rdata_start)?;
                if end > rdata_start + rdlength {
                    return Err(DomainError::MalformedMessage(format!(
                        "{} record for {} overruns its data length",
                        t, name
                    )));
                }
                RecordData::Name(target.into())
            }
            _ => RecordData::Opaque(Arc::from(rdata)),
        };

        Ok(DnsRecord {
            name: name.into(),
            record_type,
            record_class,
            ttl,
            data,
        })
    }
}
