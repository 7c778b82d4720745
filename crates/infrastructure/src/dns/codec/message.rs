use super::header::{Header, ResponseCode};
use ferrous_resolver_domain::{names_equal, DnsRecord, Question, RecordType};

/// Maximum CNAME hops followed before giving up on a chain.
const MAX_CNAME_HOPS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<DnsRecord>,
    pub authorities: Vec<DnsRecord>,
    pub additionals: Vec<DnsRecord>,
}

impl Message {
    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn truncated(&self) -> bool {
        self.header.truncated()
    }

    pub fn response_code(&self) -> ResponseCode {
        self.header.response_code()
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Answer records of `record_type` owned by `name`, after following any
    /// CNAME chain that starts at `name`.
    pub fn answers_for(&self, name: &str, record_type: RecordType) -> Vec<&DnsRecord> {
        self.answer_chain(name, record_type).records
    }

    /// Like [`Message::answers_for`], also reporting the lowest TTL among the
    /// CNAME records the chain passed through.
    pub fn answer_chain(&self, name: &str, record_type: RecordType) -> AnswerChain<'_> {
        let mut owner = name;
        let mut alias_ttl: Option<u32> = None;
        for _ in 0..MAX_CNAME_HOPS {
            let matching: Vec<&DnsRecord> = self
                .answers
                .iter()
                .filter(|r| r.record_type == record_type && names_equal(&r.name, owner))
                .collect();
            if !matching.is_empty() {
                return AnswerChain {
                    records: matching,
                    alias_ttl,
                };
            }

            let alias = self
                .answers
                .iter()
                .find(|r| r.record_type == RecordType::CNAME && names_equal(&r.name, owner));
            match alias.and_then(|r| r.target_name().map(|target| (r.ttl, target))) {
                Some((ttl, target)) => {
                    alias_ttl = Some(alias_ttl.map_or(ttl, |lowest| lowest.min(ttl)));
                    owner = target;
                }
                None => break,
            }
        }
        AnswerChain::default()
    }
}

/// Records answering a question plus the freshness limit of the aliases
/// leading to them.
#[derive(Debug, Default)]
pub struct AnswerChain<'a> {
    pub records: Vec<&'a DnsRecord>,
    /// `None` when the records are owned by the queried name itself.
    pub alias_ttl: Option<u32>,
}

impl AnswerChain<'_> {
    /// Owned copies of the records, with TTLs capped by the alias chain.
    pub fn to_records(&self) -> Vec<DnsRecord> {
        self.records
            .iter()
            .map(|record| {
                let mut record = (*record).clone();
                if let Some(limit) = self.alias_ttl {
                    record.ttl = record.ttl.min(limit);
                }
                record
            })
            .collect()
    }
}
