use super::{RecordClass, RecordType};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub record_class: RecordClass,
}

impl Question {
    pub fn new(name: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            record_class: RecordClass::IN,
        }
    }

    /// Case-insensitive comparison ignoring a trailing root dot.
    pub fn matches(&self, other: &Question) -> bool {
        self.record_type == other.record_type
            && self.record_class == other.record_class
            && names_equal(&self.name, &other.name)
    }
}

#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub id: u16,
    pub question: Question,
    pub recursion_desired: bool,
}

impl DnsQuery {
    pub fn new(id: u16, question: Question) -> Self {
        Self {
            id,
            question,
            recursion_desired: true,
        }
    }
}

pub fn names_equal(a: &str, b: &str) -> bool {
    let a = a.strip_suffix('.').unwrap_or(a);
    let b = b.strip_suffix('.').unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}
