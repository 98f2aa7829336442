use crate::core::error::{PingError, PingResult};
use std::net::{IpAddr, Ipv4Addr};

/// ホスト名を最初に見つかったIPv4アドレスに解決する
pub async fn resolve_ipv4(hostname: &str) -> PingResult<Ipv4Addr> {
    if let Ok(address) = hostname.parse::<Ipv4Addr>() {
        return Ok(address);
    }

    let addresses = tokio::net::lookup_host((hostname, 0))
        .await
        .map_err(|e| PingError::Resolve(format!("{}: {}", hostname, e)))?;

    addresses
        .filter_map(|address| match address.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| PingError::Resolve(format!("{}: IPv4アドレスが見つかりません", hostname)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_literal_address_is_not_looked_up() {
        assert_eq!(resolve_ipv4("192.0.2.7").await.unwrap(), Ipv4Addr::new(192, 0, 2, 7));
    }

    #[tokio::test]
    async fn test_ipv6_literal_is_rejected() {
        assert!(matches!(resolve_ipv4("::1").await, Err(PingError::Resolve(_))));
    }
}
