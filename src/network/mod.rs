pub mod packet;
pub mod resolver;
pub mod socket;

pub use resolver::resolve_ipv4;
pub use socket::RawIcmpSocket;
