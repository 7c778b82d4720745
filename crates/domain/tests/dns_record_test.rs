use ferrous_resolver_domain::{
    names_equal, AddressFamily, DnsRecord, Question, RecordClass, RecordData,
    RecordType,
};
use std::net::{IpAddr, Ipv4Addr};

#[test]
fn test_record_type_codes() {
    assert_eq!(RecordType::A.to_u16(), 1);
    assert_eq!(RecordType::PTR.to_u16(), 12);
    assert_eq!(RecordType::AAAA.to_u16(), 28);
    assert_eq!(RecordType::from_u16(5), RecordType::CNAME);
    assert_eq!(RecordType::from_u16(99), RecordType::Unknown(99));
    assert_eq!(RecordType::Unknown(99).to_u16(), 99);
}

#[test]
fn test_record_type_parse_and_display() {
    assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::AAAA);
    assert_eq!("TYPE65".parse::<RecordType>().unwrap(), RecordType::Unknown(65));
    assert!("BOGUS".parse::<RecordType>().is_err());
    assert_eq!(RecordType::Unknown(65).to_string(), "TYPE65");
    assert_eq!(RecordType::PTR.to_string(), "PTR");
}

#[test]
fn test_queryable_types() {
    assert!(RecordType::A.is_queryable());
    assert!(RecordType::AAAA.is_queryable());
    assert!(RecordType::PTR.is_queryable());
    assert!(!RecordType::CNAME.is_queryable());
    assert!(!RecordType::Unknown(255).is_queryable());
}

#[test]
fn test_record_class() {
    assert_eq!(RecordClass::from_u16(1), RecordClass::IN);
    assert_eq!(RecordClass::from_u16(3), RecordClass::Unknown(3));
    assert_eq!(RecordClass::default().to_u16(), 1);
}

#[test]
fn test_record_accessors() {
    let a = DnsRecord::new("example.com", RecordType::A, 300, RecordData::A(Ipv4Addr::new(93, 184, 216, 34)));
    assert_eq!(a.address(), Some(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
    assert_eq!(a.target_name(), None);
    assert_eq!(a.remaining_ttl(100), 200);
    assert_eq!(a.remaining_ttl(400), 0);

    let ptr = DnsRecord::new("8.8.8.8.in-addr.arpa", RecordType::PTR, 60, RecordData::Name("dns.google".into()));
    assert_eq!(ptr.target_name(), Some("dns.google"));
    assert_eq!(ptr.address(), None);
}

#[test]
fn test_name_normalization() {
    assert!(names_equal("EXAMPLE.com", "example.com."));
    assert!(!names_equal("example.com", "example.org"));
}

#[test]
fn test_question_matching_is_case_insensitive() {
    let sent = Question::new("Example.com", RecordType::A);
    assert!(sent.matches(&Question::new("example.COM.", RecordType::A)));
    assert!(!sent.matches(&Question::new("example.com", RecordType::AAAA)));
}

#[test]
fn test_address_family_record_types() {
    assert_eq!(AddressFamily::Ipv4.record_types(), &[RecordType::A]);
    assert_eq!(AddressFamily::Ipv6.record_types(), &[RecordType::AAAA]);
    assert_eq!(AddressFamily::Both.record_types(), &[RecordType::A, RecordType::AAAA]);
    assert_eq!("6".parse::<AddressFamily>().unwrap(), AddressFamily::Ipv6);
    assert!("ipx".parse::<AddressFamily>().is_err());
}
