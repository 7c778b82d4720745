pub mod tcp;
pub mod udp;

pub use udp::{UdpTransport, MAX_UDP_MESSAGE_SIZE};
