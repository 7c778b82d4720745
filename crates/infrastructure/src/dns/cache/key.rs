use compact_str::CompactString;
use ferrous_resolver_domain::{RecordClass, RecordType};
use std::fmt;

/// `(name, type, class)` with the name lower-cased and stripped of its
/// trailing dot, so differently spelled queries share one entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub record_class: RecordClass,
}

impl CacheKey {
    pub fn new(name: &str, record_type: RecordType, record_class: RecordClass) -> Self {
        let trimmed = name.strip_suffix('.').unwrap_or(name);
        let mut name = CompactString::from(trimmed);
        name.make_ascii_lowercase();
        Self {
            name,
            record_type,
            record_class,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.record_class, self.record_type)
    }
}
