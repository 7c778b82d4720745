use super::header::Header;
use super::name::encode_name;
use ferrous_resolver_domain::{DnsQuery, DomainError};

/// Serializes a single-question query (RFC 1035 §4.1).
pub fn encode_query(query: &DnsQuery) -> Result<Vec<u8>, DomainError> {
    let question = &query.question;
    if !question.record_type.is_queryable() {
        return Err(DomainError::Encoding(format!(
            "record type {} cannot be queried",
            question.record_type
        )));
    }

    let mut buf = Vec::with_capacity(question.name.len() + 18);
    Header::query(query.id, query.recursion_desired).write_to(&mut buf);
    encode_name(&question.name, &mut buf)?;
    buf.extend_from_slice(&question.record_type.to_u16().to_be_bytes());
    buf.extend_from_slice(&question.record_class.to_u16().to_be_bytes());
    Ok(buf)
}
