//! RFC 1035 wire codec.
mod header;
mod message;
mod message_builder;
mod message_parser;
mod name;

pub use header::{Header, ResponseCode, HEADER_LEN};
pub use message::{AnswerChain, Message};
pub use message_builder::encode_query;
pub use message_parser::decode_message;
pub use name::{decode_name, encode_name, MAX_LABEL_LEN, MAX_NAME_LEN};
