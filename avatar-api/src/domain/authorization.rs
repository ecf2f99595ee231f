use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::AuthorizationError;

/// Addresses allowed to replace stored originals.
const LOOPBACK_ADDRESSES: [IpAddr; 3] = [
    IpAddr::V4(Ipv4Addr::LOCALHOST),
    IpAddr::V6(Ipv6Addr::LOCALHOST),
    // ::ffff:127.0.0.1, as reported by dual-stack listeners
    IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0x7f00, 0x0001)),
];

pub fn authorize_write(remote_addr: IpAddr) -> Result<(), AuthorizationError> {
    if LOOPBACK_ADDRESSES.contains(&remote_addr) {
        Ok(())
    } else {
        Err(AuthorizationError::Forbidden(remote_addr))
    }
}
