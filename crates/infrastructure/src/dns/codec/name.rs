//! Domain name encoding and decompression (RFC 1035 §3.1, §4.1.4).

use ferrous_resolver_domain::DomainError;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

const POINTER_TAG: u8 = 0xC0;

/// Appends `name` in wire form. One trailing dot is accepted and ignored.
pub fn encode_name(name: &str, buf: &mut Vec<u8>) -> Result<(), DomainError> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        return Err(DomainError::Encoding("empty domain name".to_string()));
    }

    let start = buf.len();
    for label in trimmed.split('.') {
        if label.is_empty() {
            buf.truncate(start);
            return Err(DomainError::Encoding(format!("empty label in '{}'", name)));
        }
        if label.len() > MAX_LABEL_LEN {
            buf.truncate(start);
            return Err(DomainError::Encoding(format!(
                "label '{}' exceeds {} octets",
                label, MAX_LABEL_LEN
            )));
        }
        if let Some(bad) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            buf.truncate(start);
            return Err(DomainError::Encoding(format!(
                "invalid character {:?} in '{}'",
                bad, name
            )));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);

    let wire_len = buf.len() - start;
    if wire_len > MAX_NAME_LEN {
        buf.truncate(start);
        return Err(DomainError::Encoding(format!(
            "name '{}' is {} octets in wire form, limit is {}",
            name, wire_len, MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Reads the name at `offset`, following compression pointers.
///
/// Returns the dotted name without a trailing dot and the offset just past
/// the name in the original position. Every pointer must jump strictly
/// backwards, which rules out both self-references and cycles.
pub fn decode_name(msg: &[u8], offset: usize) -> Result<(String, usize), DomainError> {
    let mut name = String::new();
    let mut pos = offset;
    let mut end_of_name: Option<usize> = None;
    let mut wire_len = 0usize;

    loop {
        let len = *msg.get(pos).ok_or_else(|| {
            DomainError::TruncatedMessage(format!("name at offset {} runs past the end", offset))
        })?;

        match len & POINTER_TAG {
            POINTER_TAG => {
                let low = *msg.get(pos + 1).ok_or_else(|| {
                    DomainError::TruncatedMessage(format!(
                        "compression pointer at offset {} is cut short",
                        pos
                    ))
                })?;
                let target = (usize::from(len & !POINTER_TAG) << 8) | usize::from(low);
                if target >= pos {
                    return Err(DomainError::MalformedMessage(format!(
                        "compression pointer at offset {} does not point backwards (target {})",
                        pos, target
                    )));
                }
                if end_of_name.is_none() {
                    end_of_name = Some(pos + 2);
                }
                pos = target;
            }
            0x00 => {
                if len == 0 {
                    return Ok((name, end_of_name.unwrap_or(pos + 1)));
                }
                let len = usize::from(len);
                let label = msg.get(pos + 1..pos + 1 + len).ok_or_else(|| {
                    DomainError::TruncatedMessage(format!(
                        "label at offset {} runs past the end",
                        pos
                    ))
                })?;
                wire_len += len + 1;
                if wire_len + 1 > MAX_NAME_LEN {
                    return Err(DomainError::MalformedMessage(format!(
                        "name at offset {} exceeds {} octets",
                        offset, MAX_NAME_LEN
                    )));
                }
                if !name.is_empty() {
                    name.push('.');
                }
                push_label(&mut name, label);
                pos += 1 + len;
            }
            _ => {
                return Err(DomainError::MalformedMessage(format!(
                    "unsupported label type 0x{:02x} at offset {}",
                    len, pos
                )));
            }
        }
    }
}

fn push_label(name: &mut String, label: &[u8]) {
    for &byte in label {
        if byte.is_ascii_graphic() && byte != b'.' && byte != b'\\' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("\\{:03}", byte));
        }
    }
}
